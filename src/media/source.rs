use crate::foundation::core::Fps;
use crate::foundation::error::{ExportError, ExportResult};

/// Fallback stepping rate for MP4 exports when the source does not report one.
pub const DEFAULT_NATIVE_FPS: Fps = Fps { num: 30, den: 1 };

/// Basic metadata about the source video, read once before an export.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SourceMedia {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Playable duration in seconds.
    pub duration_secs: f64,
    /// Native frame rate, when known.
    #[serde(default)]
    pub frame_rate: Option<Fps>,
}

impl SourceMedia {
    /// Metadata without a known frame rate.
    pub fn new(width: u32, height: u32, duration_secs: f64) -> Self {
        Self {
            width,
            height,
            duration_secs,
            frame_rate: None,
        }
    }

    /// Attach the native frame rate.
    pub fn with_frame_rate(mut self, fps: Fps) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    /// Reject zero sizes and non-positive durations.
    pub fn validate(&self) -> ExportResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ExportError::InvalidSourceDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(ExportError::media(format!(
                "source duration {} is not a positive number of seconds",
                self.duration_secs
            )));
        }
        Ok(())
    }

    /// Rate used to step through the source when the output format has no rate of its own.
    pub fn native_fps(&self) -> Fps {
        self.frame_rate.unwrap_or(DEFAULT_NATIVE_FPS)
    }
}

/// One decoded source picture, straight-alpha RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major pixels, `width * height * 4` bytes.
    pub rgba8: Vec<u8>,
}

impl SourceFrame {
    /// Wrap a pixel buffer, checking its length against the size.
    pub fn new(width: u32, height: u32, rgba8: Vec<u8>) -> ExportResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if width == 0 || height == 0 || rgba8.len() != expected {
            return Err(ExportError::media(format!(
                "source frame buffer is {} bytes, expected {expected} for {width}x{height}",
                rgba8.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8,
        })
    }

    /// A frame filled with one straight-alpha color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> ExportResult<Self> {
        let len = (width as usize) * (height as usize);
        Self::new(width, height, rgba.repeat(len))
    }
}

/// A single-shot seek request.
///
/// `generation` increases with every request issued by a renderer; completions carrying an older
/// generation belong to a superseded request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeekRequest {
    /// Request tag, unique within one renderer.
    pub generation: u64,
    /// Source time to present.
    pub timestamp_secs: f64,
}

/// The decoder's confirmation that a seek landed.
#[derive(Clone, Debug)]
pub struct SeekCompletion {
    /// Generation of the request this completion answers.
    pub generation: u64,
    /// Presentation time of the frame that is now current.
    pub presented_secs: f64,
    /// The current frame's pixels.
    pub frame: SourceFrame,
}

/// A seekable video decode session owned by one export run.
///
/// Seeks are awaited one at a time. Implementations may answer a request with a completion left
/// over from an earlier request (for example when backed by a host event queue); callers discard
/// those by generation and await again.
#[async_trait::async_trait]
pub trait VideoSource: Send {
    /// Metadata of the open source.
    fn media(&self) -> SourceMedia;

    /// Move the decoder to `req.timestamp_secs` and resolve once the frame there is available.
    async fn seek(&mut self, req: SeekRequest) -> ExportResult<SeekCompletion>;

    /// Release decode resources. Called exactly once when a run ends, whatever the outcome.
    async fn release(&mut self) {}
}

#[cfg(test)]
#[path = "../../tests/unit/media/source.rs"]
mod tests;
