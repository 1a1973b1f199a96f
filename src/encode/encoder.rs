use crate::export::config::ExportFormat;
use crate::foundation::core::{Fps, OutputDimensions};
use crate::foundation::error::{ExportError, ExportResult};
use crate::render::frame::FrameRGBA;

/// Configuration provided to a [`FrameEncoder`] before any frames are pushed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderConfig {
    /// Frame size every pushed frame must match.
    pub dimensions: OutputDimensions,
    /// Playback rate of the encoded frames.
    pub fps: Fps,
    /// Number of frames the run intends to push.
    pub expected_frames: u64,
}

/// Encoded output of a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Container of `data`.
    pub format: ExportFormat,
    /// Encoded file bytes.
    pub data: Vec<u8>,
}

impl ExportArtifact {
    /// MIME type for saving or sharing.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// File extension without the dot.
    pub fn file_extension(&self) -> &'static str {
        self.format.file_extension()
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// `true` when the payload has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take the payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Encoder contract for consuming rendered frames in timeline order.
///
/// Ordering contract: `push_frame` is called with strictly increasing indices, `0..n`.
/// An encoder does not support resuming: after `abort` or a failed call the instance is spent.
#[async_trait::async_trait]
pub trait FrameEncoder: Send {
    /// Output format of the artifact this encoder produces.
    fn format(&self) -> ExportFormat;
    /// Called once before any frames are pushed.
    async fn begin(&mut self, cfg: EncoderConfig) -> ExportResult<()>;
    /// Append one frame.
    async fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> ExportResult<()>;
    /// Called once after the last frame; returns the encoded payload.
    async fn finish(&mut self) -> ExportResult<ExportArtifact>;
    /// Discard partial state. Safe to call in any state, including after `finish`.
    async fn abort(&mut self);
}

pub(crate) fn check_frame(cfg: &EncoderConfig, frame: &FrameRGBA) -> ExportResult<()> {
    if frame.width != cfg.dimensions.width || frame.height != cfg.dimensions.height {
        return Err(ExportError::encoder_write(format!(
            "frame size mismatch: got {}x{}, expected {}",
            frame.width, frame.height, cfg.dimensions
        )));
    }
    if frame.data.len() != cfg.dimensions.rgba8_len() {
        return Err(ExportError::encoder_write(
            "frame.data size mismatch with width*height*4",
        ));
    }
    Ok(())
}

pub(crate) fn check_order(last: Option<u64>, idx: u64) -> ExportResult<()> {
    if let Some(last) = last
        && idx <= last
    {
        return Err(ExportError::encoder_write(format!(
            "encoder received out-of-order frame index {idx} after {last}"
        )));
    }
    Ok(())
}

/// In-memory encoder for tests and debugging.
///
/// The artifact payload is the concatenation of the raw frames.
#[derive(Debug)]
pub struct InMemoryEncoder {
    format: ExportFormat,
    cfg: Option<EncoderConfig>,
    frames: Vec<(u64, FrameRGBA)>,
    finished: bool,
    aborted: bool,
}

impl InMemoryEncoder {
    /// Encoder that reports `format` as its output container.
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            cfg: None,
            frames: Vec::new(),
            finished: false,
            aborted: false,
        }
    }

    /// Return the configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<EncoderConfig> {
        self.cfg
    }

    /// Borrow the captured frames in push order.
    pub fn frames(&self) -> &[(u64, FrameRGBA)] {
        &self.frames
    }

    /// `true` once `finish` succeeded.
    pub fn was_finished(&self) -> bool {
        self.finished
    }

    /// `true` once `abort` was called.
    pub fn was_aborted(&self) -> bool {
        self.aborted
    }
}

#[async_trait::async_trait]
impl FrameEncoder for InMemoryEncoder {
    fn format(&self) -> ExportFormat {
        self.format
    }

    async fn begin(&mut self, cfg: EncoderConfig) -> ExportResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    async fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> ExportResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ExportError::encoder_write("in-memory encoder not started"))?;
        check_frame(cfg, frame)?;
        check_order(self.frames.last().map(|(i, _)| *i), idx)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    async fn finish(&mut self) -> ExportResult<ExportArtifact> {
        self.finished = true;
        let data = self
            .frames
            .iter()
            .flat_map(|(_, f)| f.data.iter().copied())
            .collect();
        Ok(ExportArtifact {
            format: self.format,
            data,
        })
    }

    async fn abort(&mut self) {
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/encoder.rs"]
mod tests;
