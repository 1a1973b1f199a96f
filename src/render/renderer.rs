use std::time::Duration;

use crate::foundation::core::OutputDimensions;
use crate::foundation::error::{ExportError, ExportResult};
use crate::media::source::{SeekCompletion, SeekRequest, VideoSource};
use crate::render::compositor::Compositor;
use crate::render::frame::FrameRGBA;

/// Default upper bound on one seek, decode included.
pub const DEFAULT_SEEK_TIMEOUT: Duration = Duration::from_secs(10);

/// Seeks a source and renders the composition at requested timestamps.
///
/// One renderer belongs to one export run. It borrows the run's decode session and compositor;
/// releasing both is left to the run's cleanup.
pub struct FrameRenderer<'a, C: Compositor> {
    source: &'a mut dyn VideoSource,
    compositor: C,
    out: OutputDimensions,
    seek_timeout: Duration,
    generation: u64,
    last_timestamp: Option<f64>,
}

impl<'a, C: Compositor> FrameRenderer<'a, C> {
    /// Renderer drawing `source` into `out`-sized frames, giving each seek `seek_timeout`.
    pub fn new(
        source: &'a mut dyn VideoSource,
        compositor: C,
        out: OutputDimensions,
        seek_timeout: Duration,
    ) -> Self {
        Self {
            source,
            compositor,
            out,
            seek_timeout,
            generation: 0,
            last_timestamp: None,
        }
    }

    /// Size of every rendered frame.
    pub fn output_dimensions(&self) -> OutputDimensions {
        self.out
    }

    /// Compositor used for drawing.
    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    /// Seek to `timestamp_secs`, wait for the seek to land, then compose and read back.
    ///
    /// Fails with `FrameRenderTimeout` when the seek does not land within the configured
    /// timeout or the decoder reports an error.
    pub async fn render_at(&mut self, timestamp_secs: f64) -> ExportResult<FrameRGBA> {
        if let Some(prev) = self.last_timestamp
            && timestamp_secs < prev
        {
            tracing::debug!(prev, timestamp_secs, "backward seek requested");
        }
        self.last_timestamp = Some(timestamp_secs);

        self.generation += 1;
        let req = SeekRequest {
            generation: self.generation,
            timestamp_secs,
        };

        let landed = match tokio::time::timeout(self.seek_timeout, self.await_seek(req)).await {
            Ok(Ok(landed)) => landed,
            Ok(Err(e)) => {
                return Err(match e {
                    ExportError::FrameRenderTimeout { .. } => e,
                    other => ExportError::render_timeout(timestamp_secs, other.to_string()),
                });
            }
            Err(_) => {
                return Err(ExportError::render_timeout(
                    timestamp_secs,
                    format!("seek did not complete within {:?}", self.seek_timeout),
                ));
            }
        };

        tracing::trace!(
            requested = timestamp_secs,
            presented = landed.presented_secs,
            "seek landed"
        );
        self.compositor.compose(&landed.frame, self.out)
    }

    async fn await_seek(&mut self, req: SeekRequest) -> ExportResult<SeekCompletion> {
        loop {
            let completion = self.source.seek(req).await?;
            if completion.generation == req.generation {
                return Ok(completion);
            }
            if completion.generation > req.generation {
                return Err(ExportError::render_timeout(
                    req.timestamp_secs,
                    format!(
                        "decoder answered unknown seek generation {} (latest {})",
                        completion.generation, req.generation
                    ),
                ));
            }
            tracing::debug!(
                stale = completion.generation,
                current = req.generation,
                "discarding stale seek completion"
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
