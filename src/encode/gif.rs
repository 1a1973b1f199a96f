//! Animated GIF encoding through the `image` crate.
//!
//! Frames are flattened over an opaque background, quantized per frame, and streamed into a
//! shared in-memory buffer. The GIF trailer is written when the underlying encoder is dropped,
//! which is why `finish` drops it before reading the buffer back.

use std::io::Write;
use std::sync::{Arc, Mutex};

use image::codecs::gif::{GifEncoder, Repeat};

use crate::encode::encoder::{
    EncoderConfig, ExportArtifact, FrameEncoder, check_frame, check_order,
};
use crate::export::config::{ExportFormat, GifOptions};
use crate::foundation::error::{ExportError, ExportResult};
use crate::foundation::math::flatten_premul_over_bg;
use crate::render::frame::FrameRGBA;

/// Quantizer speed used when none is given: `1` is slowest/best, `30` fastest.
pub const DEFAULT_GIF_SPEED: i32 = 10;

const GIF_MAX_SIDE: u32 = u16::MAX as u32;

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn take(&self) -> Vec<u8> {
        match self.0.lock() {
            Ok(mut g) => std::mem::take(&mut *g),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut g = self
            .0
            .lock()
            .map_err(|_| std::io::Error::other("gif buffer lock poisoned"))?;
        g.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// GIF stores delays in centiseconds and `image` truncates; round first.
fn delay_centis(delay_ms: u32) -> u32 {
    (delay_ms + 5) / 10
}

/// GIF encoder with a fixed per-frame delay and loop count.
pub struct GifFrameEncoder {
    delay_ms: u32,
    repeat: u16,
    speed: i32,
    bg_rgba: [u8; 4],
    cfg: Option<EncoderConfig>,
    encoder: Option<GifEncoder<SharedBuffer>>,
    buffer: SharedBuffer,
    scratch: Vec<u8>,
    last_idx: Option<u64>,
    frames_written: u64,
}

impl GifFrameEncoder {
    /// `repeat` is the NETSCAPE loop count: `0` loops forever.
    pub fn new(delay_ms: u32, repeat: u16) -> Self {
        Self {
            delay_ms,
            repeat,
            speed: DEFAULT_GIF_SPEED,
            bg_rgba: [0, 0, 0, 255],
            cfg: None,
            encoder: None,
            buffer: SharedBuffer::default(),
            scratch: Vec::new(),
            last_idx: None,
            frames_written: 0,
        }
    }

    /// Encoder for the delay and loop count `opts` ask for.
    pub fn from_options(opts: &GifOptions) -> Self {
        Self::new(opts.frame_rate.frame_delay_ms(), opts.repeat())
    }

    /// Set the quantizer speed, clamped to `1..=30`.
    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed.clamp(1, 30);
        self
    }

    /// Background used to flatten translucent pixels.
    pub fn with_background(mut self, bg_rgba: [u8; 4]) -> Self {
        self.bg_rgba = bg_rgba;
        self
    }

    /// Per-frame delay in milliseconds before centisecond rounding.
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }

    /// NETSCAPE loop count.
    pub fn repeat(&self) -> u16 {
        self.repeat
    }

    /// Frames appended since `begin`.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

#[async_trait::async_trait]
impl FrameEncoder for GifFrameEncoder {
    fn format(&self) -> ExportFormat {
        ExportFormat::Gif
    }

    #[tracing::instrument(level = "debug", skip(self), fields(dims = %cfg.dimensions))]
    async fn begin(&mut self, cfg: EncoderConfig) -> ExportResult<()> {
        let dims = cfg.dimensions;
        if dims.width == 0 || dims.height == 0 {
            return Err(ExportError::encoder_init(format!(
                "gif dimensions must be non-zero, got {dims}"
            )));
        }
        if dims.width > GIF_MAX_SIDE || dims.height > GIF_MAX_SIDE {
            return Err(ExportError::encoder_init(format!(
                "gif dimensions exceed {GIF_MAX_SIDE}: {dims}"
            )));
        }
        if self.delay_ms == 0 {
            return Err(ExportError::encoder_init("gif frame delay must be non-zero"));
        }

        self.buffer.take();
        let mut encoder = GifEncoder::new_with_speed(self.buffer.clone(), self.speed);
        let repeat = match self.repeat {
            0 => Repeat::Infinite,
            n => Repeat::Finite(n),
        };
        encoder
            .set_repeat(repeat)
            .map_err(|e| ExportError::encoder_init(format!("failed to set gif repeat: {e}")))?;

        self.scratch = vec![0u8; dims.rgba8_len()];
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.frames_written = 0;
        Ok(())
    }

    async fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> ExportResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ExportError::encoder_write("gif encoder not started"))?;
        check_frame(cfg, frame)?;
        check_order(self.last_idx, idx)?;
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| ExportError::encoder_write("gif encoder is already finalized"))?;

        if frame.premultiplied {
            flatten_premul_over_bg(&mut self.scratch, &frame.data, self.bg_rgba)?;
        } else {
            self.scratch.copy_from_slice(&frame.data);
            for px in self.scratch.chunks_exact_mut(4) {
                px[3] = 255;
            }
        }

        let img = image::RgbaImage::from_raw(frame.width, frame.height, self.scratch.clone())
            .ok_or_else(|| ExportError::encoder_write("gif frame buffer size mismatch"))?;
        let delay = image::Delay::from_numer_denom_ms(delay_centis(self.delay_ms) * 10, 1);
        encoder
            .encode_frame(image::Frame::from_parts(img, 0, 0, delay))
            .map_err(|e| ExportError::encoder_write(format!("gif frame {idx}: {e}")))?;

        self.last_idx = Some(idx);
        self.frames_written += 1;
        Ok(())
    }

    async fn finish(&mut self) -> ExportResult<ExportArtifact> {
        if self.frames_written == 0 {
            self.encoder = None;
            return Err(ExportError::encoder_write("no frames were written"));
        }
        // Dropping the encoder writes the trailer.
        drop(self.encoder.take());
        self.cfg = None;

        let data = self.buffer.take();
        if data.is_empty() {
            return Err(ExportError::encoder_write("gif encoder produced no bytes"));
        }
        tracing::debug!(bytes = data.len(), frames = self.frames_written, "gif finalized");
        Ok(ExportArtifact {
            format: ExportFormat::Gif,
            data,
        })
    }

    async fn abort(&mut self) {
        self.encoder = None;
        self.cfg = None;
        self.buffer.take();
        self.scratch = Vec::new();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
