use std::sync::Arc;

use kurbo::Shape as _;

use crate::foundation::core::OutputDimensions;
use crate::foundation::error::{ExportError, ExportResult};
use crate::foundation::math::premultiply_rgba8_in_place;
use crate::media::source::SourceFrame;
use crate::render::frame::FrameRGBA;

/// Draws the visual composition for one landed source frame.
///
/// This is the only capability the export pipeline needs from a compositor: how the scene is
/// represented and drawn stays behind it.
pub trait Compositor {
    /// Draw `frame` into an off-screen surface of `out` size and read the pixels back.
    fn compose(&mut self, frame: &SourceFrame, out: OutputDimensions) -> ExportResult<FrameRGBA>;

    /// Drop any retained surfaces.
    fn release(&mut self) {}
}

impl<C: Compositor + ?Sized> Compositor for &mut C {
    fn compose(&mut self, frame: &SourceFrame, out: OutputDimensions) -> ExportResult<FrameRGBA> {
        (**self).compose(frame, out)
    }

    fn release(&mut self) {
        (**self).release();
    }
}

/// Visual mask applied to the video layer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VideoMask {
    /// Rounded corners with radius `radius_fraction * min(drawn width, drawn height)`.
    RoundedRect {
        /// Corner radius relative to the drawn video's shorter side.
        radius_fraction: f64,
    },
}

impl VideoMask {
    /// Corner rounding used by the editor preview.
    pub const PREVIEW_ROUNDED: VideoMask = VideoMask::RoundedRect {
        radius_fraction: 0.02,
    };
}

/// Static scene settings around the video layer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Composition {
    /// Straight-alpha RGBA8 fill behind the video.
    pub background_rgba: [u8; 4],
    /// Inset on every side as a fraction of the shorter output side, `[0, 0.5)`.
    #[serde(default)]
    pub padding_fraction: f64,
    /// Optional clip applied to the video layer.
    #[serde(default)]
    pub mask: Option<VideoMask>,
}

impl Default for Composition {
    fn default() -> Self {
        Self {
            background_rgba: [0, 0, 0, 255],
            padding_fraction: 0.0,
            mask: None,
        }
    }
}

impl Composition {
    /// Reject padding outside `[0, 0.5)` and mask radii outside `[0, 0.5]`.
    pub fn validate(&self) -> ExportResult<()> {
        if !(0.0..0.5).contains(&self.padding_fraction) {
            return Err(ExportError::invalid_config(
                "composition padding_fraction must be within [0, 0.5)",
            ));
        }
        if let Some(VideoMask::RoundedRect { radius_fraction }) = self.mask
            && !(0.0..=0.5).contains(&radius_fraction)
        {
            return Err(ExportError::invalid_config(
                "rounded mask radius_fraction must be within [0, 0.5]",
            ));
        }
        Ok(())
    }

    /// Where a `frame_w x frame_h` picture lands on the `out` canvas: aspect-preserving fit into
    /// the padded area, centered.
    pub fn placement(&self, frame_w: u32, frame_h: u32, out: OutputDimensions) -> Placement {
        let (ow, oh) = (f64::from(out.width), f64::from(out.height));
        let pad = self.padding_fraction * ow.min(oh);
        let (aw, ah) = ((ow - 2.0 * pad).max(1.0), (oh - 2.0 * pad).max(1.0));
        let (fw, fh) = (f64::from(frame_w), f64::from(frame_h));

        let scale = (aw / fw).min(ah / fh);
        let (dw, dh) = (fw * scale, fh * scale);
        Placement {
            rect: kurbo::Rect::new(
                (ow - dw) / 2.0,
                (oh - dh) / 2.0,
                (ow + dw) / 2.0,
                (oh + dh) / 2.0,
            ),
            scale,
        }
    }
}

/// Destination of the video layer in output pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Drawn video bounds.
    pub rect: kurbo::Rect,
    /// Source pixel to output pixel scale.
    pub scale: f64,
}

impl Placement {
    fn to_affine(self) -> kurbo::Affine {
        kurbo::Affine::translate((self.rect.x0, self.rect.y0)) * kurbo::Affine::scale(self.scale)
    }
}

/// CPU compositor powered by `vello_cpu`.
///
/// Owns its render context and output surface; both are created lazily for the first frame and
/// reused while the output size stays the same.
pub struct CpuCompositor {
    composition: Composition,
    ctx: Option<vello_cpu::RenderContext>,
    surface: Option<vello_cpu::Pixmap>,
}

impl CpuCompositor {
    /// Compositor drawing `composition`; no surface is allocated until the first frame.
    pub fn new(composition: Composition) -> Self {
        Self {
            composition,
            ctx: None,
            surface: None,
        }
    }

    /// Scene settings in use.
    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Return `true` while an off-screen surface is retained.
    pub fn holds_surface(&self) -> bool {
        self.surface.is_some()
    }
}

impl Compositor for CpuCompositor {
    fn compose(&mut self, frame: &SourceFrame, out: OutputDimensions) -> ExportResult<FrameRGBA> {
        let width: u16 = out
            .width
            .try_into()
            .map_err(|_| ExportError::invalid_config("output width exceeds 65535"))?;
        let height: u16 = out
            .height
            .try_into()
            .map_err(|_| ExportError::invalid_config("output height exceeds 65535"))?;
        if width == 0 || height == 0 {
            return Err(ExportError::InvalidSourceDimensions {
                width: out.width,
                height: out.height,
            });
        }

        let video = rgba_straight_to_image_premul(&frame.rgba8, frame.width, frame.height)?;
        let placement = self.composition.placement(frame.width, frame.height, out);
        let clip = video_clip_path(&self.composition, frame, placement);
        let [br, bg, bb, ba] = self.composition.background_rgba;

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        let mut surface = match self.surface.take() {
            Some(p) if p.width() == width && p.height() == height => p,
            _ => vello_cpu::Pixmap::new(width, height),
        };
        surface.data_as_u8_slice_mut().fill(0);

        ctx.reset();
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(br, bg, bb, ba));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(out.width),
            f64::from(out.height),
        ));

        ctx.set_transform(affine_to_cpu(placement.to_affine()));
        ctx.set_paint(video);
        ctx.fill_path(&bezpath_to_cpu(&clip));

        ctx.flush();
        ctx.render_to_pixmap(&mut surface);

        let data = surface.data_as_u8_slice().to_vec();
        self.ctx = Some(ctx);
        self.surface = Some(surface);

        Ok(FrameRGBA {
            width: out.width,
            height: out.height,
            data,
            premultiplied: true,
        })
    }

    fn release(&mut self) {
        self.ctx = None;
        self.surface = None;
    }
}

// The video is drawn by filling this path with the frame as paint, in frame pixel space.
fn video_clip_path(
    composition: &Composition,
    frame: &SourceFrame,
    placement: Placement,
) -> kurbo::BezPath {
    let (fw, fh) = (f64::from(frame.width), f64::from(frame.height));
    match composition.mask {
        None => kurbo::Rect::new(0.0, 0.0, fw, fh).to_path(0.1),
        Some(VideoMask::RoundedRect { radius_fraction }) => {
            let drawn = placement.rect.width().min(placement.rect.height());
            let radius = radius_fraction * drawn / placement.scale.max(f64::EPSILON);
            kurbo::RoundedRect::new(0.0, 0.0, fw, fh, radius).to_path(0.1)
        }
    }
}

fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn rgba_straight_to_image_premul(
    bytes_rgba: &[u8],
    width: u32,
    height: u32,
) -> ExportResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ExportError::media("source frame width exceeds 65535"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ExportError::media("source frame height exceeds 65535"))?;
    if bytes_rgba.len() != (width as usize) * (height as usize) * 4 {
        return Err(ExportError::media("source frame byte len mismatch"));
    }

    let mut tmp = bytes_rgba.to_vec();
    premultiply_rgba8_in_place(&mut tmp);
    let pixels: Vec<vello_cpu::peniko::color::PremulRgba8> = tmp
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);

    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
