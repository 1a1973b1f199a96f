//! Export orchestration: one run from config to artifact.
//!
//! A run walks `Idle -> Resolving -> Sampling -> (Rendering -> Encoding)* -> Finalizing` and ends
//! in exactly one of `Succeeded`, `Failed(kind)` or `Cancelled`. Frames are rendered and appended
//! strictly in timestamp order; each render is awaited before the next seek is issued.

use std::sync::Mutex;
use std::time::Duration;

use crate::encode::encoder::{EncoderConfig, ExportArtifact, FrameEncoder};
use crate::encode::gif::{DEFAULT_GIF_SPEED, GifFrameEncoder};
use crate::encode::mp4::Mp4FrameEncoder;
use crate::export::config::{ExportConfig, OutputOptions};
use crate::export::sampler::sample_timestamps;
use crate::foundation::error::{ExportError, ExportErrorKind, ExportResult};
use crate::media::source::VideoSource;
use crate::render::compositor::{Composition, Compositor, CpuCompositor};
use crate::render::renderer::{DEFAULT_SEEK_TIMEOUT, FrameRenderer};
use crate::session::cancel::CancelHandle;

/// Where a session currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExportState {
    /// No run has started.
    Idle,
    /// Validating the config and resolving output dimensions.
    Resolving,
    /// Computing frame timestamps.
    Sampling,
    /// Rendering frame `index` (0-based) of `total`.
    Rendering {
        /// Frame being rendered.
        index: u64,
        /// Frames in the run.
        total: u64,
    },
    /// Appending frame `index` (0-based) of `total` to the encoder.
    Encoding {
        /// Frame being appended.
        index: u64,
        /// Frames in the run.
        total: u64,
    },
    /// Waiting for the encoder's payload.
    Finalizing,
    /// The artifact was returned.
    Succeeded,
    /// The run stopped on an error.
    Failed {
        /// What went wrong.
        kind: ExportErrorKind,
    },
    /// The run stopped on a cancel request.
    Cancelled,
}

impl ExportState {
    /// `true` once the run has ended, whatever the outcome.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed { .. } | Self::Cancelled
        )
    }

    /// `true` while a run is in progress.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle) && !self.is_terminal()
    }

    fn is_per_frame(self) -> bool {
        matches!(self, Self::Rendering { .. } | Self::Encoding { .. })
    }
}

/// Knobs for an [`ExportSession`].
#[derive(Clone, Debug)]
pub struct ExportSessionOpts {
    /// Upper bound on one seek, decode included.
    pub seek_timeout: Duration,
    /// Yield to the runtime after every frame so a UI sharing the thread stays responsive.
    pub yield_between_frames: bool,
    /// Scene drawn around the video.
    pub composition: Composition,
    /// GIF quantizer speed, `1..=30`.
    pub gif_speed: i32,
}

impl Default for ExportSessionOpts {
    fn default() -> Self {
        Self {
            seek_timeout: DEFAULT_SEEK_TIMEOUT,
            yield_between_frames: true,
            composition: Composition::default(),
            gif_speed: DEFAULT_GIF_SPEED,
        }
    }
}

/// Drives export runs and exposes their state and cancellation.
///
/// A session runs one export at a time; starting a second run while one is active fails with
/// `InvalidConfig`. Concurrent exports use separate sessions.
#[derive(Debug)]
pub struct ExportSession {
    opts: ExportSessionOpts,
    state: Mutex<ExportState>,
    cancel: CancelHandle,
}

impl Default for ExportSession {
    fn default() -> Self {
        Self::new(ExportSessionOpts::default())
    }
}

impl ExportSession {
    /// Idle session with `opts`.
    pub fn new(opts: ExportSessionOpts) -> Self {
        Self {
            opts,
            state: Mutex::new(ExportState::Idle),
            cancel: CancelHandle::new(),
        }
    }

    /// Options every run of this session uses.
    pub fn opts(&self) -> &ExportSessionOpts {
        &self.opts
    }

    /// Current state; terminal states persist until the next run starts.
    pub fn state(&self) -> ExportState {
        match self.state.lock() {
            Ok(g) => *g,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Handle that cancels the current run. The flag is cleared when a run starts.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Export `config` from `source` with the encoder and compositor the config calls for.
    ///
    /// `progress` receives `i / N` after each appended frame and `1.0` after the last one.
    #[tracing::instrument(skip_all, fields(format = ?config.format()))]
    pub async fn start_export(
        &self,
        config: &ExportConfig,
        source: &mut dyn VideoSource,
        progress: impl FnMut(f64),
    ) -> ExportResult<ExportArtifact> {
        let bg = self.opts.composition.background_rgba;
        let mut encoder: Box<dyn FrameEncoder> = match &config.output {
            OutputOptions::Gif(o) => Box::new(
                GifFrameEncoder::from_options(o)
                    .with_speed(self.opts.gif_speed)
                    .with_background(bg),
            ),
            OutputOptions::Mp4(o) => {
                Box::new(Mp4FrameEncoder::new(o.quality).with_background(bg))
            }
        };
        let compositor = CpuCompositor::new(self.opts.composition);
        self.run_with_encoder(config, source, compositor, encoder.as_mut(), progress)
            .await
    }

    /// Lower-level entry point with caller-provided compositor and encoder.
    pub async fn run_with_encoder<C: Compositor>(
        &self,
        config: &ExportConfig,
        source: &mut dyn VideoSource,
        mut compositor: C,
        encoder: &mut dyn FrameEncoder,
        mut progress: impl FnMut(f64),
    ) -> ExportResult<ExportArtifact> {
        self.claim()?;
        self.cancel.reset();

        let result = self
            .drive(config, source, &mut compositor, encoder, &mut progress)
            .await;
        self.cleanup(&result, source, &mut compositor, encoder).await;

        match &result {
            Ok(artifact) => {
                tracing::info!(bytes = artifact.len(), "export succeeded");
                self.transition(ExportState::Succeeded);
            }
            Err(e) if e.is_cancelled() => {
                tracing::info!("export cancelled");
                self.transition(ExportState::Cancelled);
            }
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                self.transition(ExportState::Failed { kind: e.kind() });
            }
        }
        result
    }

    async fn drive<C: Compositor>(
        &self,
        config: &ExportConfig,
        source: &mut dyn VideoSource,
        compositor: &mut C,
        encoder: &mut dyn FrameEncoder,
        progress: &mut dyn FnMut(f64),
    ) -> ExportResult<ExportArtifact> {
        self.opts.composition.validate()?;
        if encoder.format() != config.format() {
            return Err(ExportError::invalid_config(format!(
                "encoder produces {:?} but the config asks for {:?}",
                encoder.format(),
                config.format()
            )));
        }

        let media = source.media();
        config.validate(&media)?;
        let dims = config.output_dimensions(&media)?;

        self.transition(ExportState::Sampling);
        let fps = config.sample_rate(&media);
        let timestamps = sample_timestamps(config.trim, fps)?;
        let total = timestamps.len() as u64;
        tracing::info!(%dims, %fps, frames = total, "export planned");

        encoder
            .begin(EncoderConfig {
                dimensions: dims,
                fps,
                expected_frames: total,
            })
            .await?;

        let mut renderer = FrameRenderer::new(source, compositor, dims, self.opts.seek_timeout);
        for (i, &t) in timestamps.iter().enumerate() {
            let index = i as u64;
            if self.cancel.is_cancelled() {
                return Err(ExportError::Cancelled);
            }

            self.transition(ExportState::Rendering { index, total });
            let frame = renderer.render_at(t).await?;

            self.transition(ExportState::Encoding { index, total });
            encoder.push_frame(index, &frame).await?;
            progress((index + 1) as f64 / total as f64);
            tracing::debug!(index, timestamp_secs = t, "frame appended");

            if self.opts.yield_between_frames {
                tokio::task::yield_now().await;
            }
        }
        if self.cancel.is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        self.transition(ExportState::Finalizing);
        let artifact = encoder.finish().await?;
        if artifact.is_empty() {
            return Err(ExportError::encoder_write("encoder returned an empty payload"));
        }
        if artifact.format != config.format() {
            return Err(ExportError::encoder_write(format!(
                "encoder returned {:?} for a {:?} export",
                artifact.format,
                config.format()
            )));
        }
        Ok(artifact)
    }

    // Runs once per run on every exit path.
    async fn cleanup<C: Compositor>(
        &self,
        result: &ExportResult<ExportArtifact>,
        source: &mut dyn VideoSource,
        compositor: &mut C,
        encoder: &mut dyn FrameEncoder,
    ) {
        if result.is_err() {
            encoder.abort().await;
        }
        compositor.release();
        source.release().await;
        tracing::debug!("export resources released");
    }

    // Checks and moves to `Resolving` under one lock so racing runs cannot both pass.
    fn claim(&self) -> ExportResult<()> {
        let mut g = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if g.is_active() {
            return Err(ExportError::invalid_config(
                "an export is already running in this session",
            ));
        }
        let prev = *g;
        *g = ExportState::Resolving;
        drop(g);
        tracing::info!(?prev, next = ?ExportState::Resolving, "export state");
        Ok(())
    }

    fn transition(&self, next: ExportState) {
        let mut g = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let prev = *g;
        *g = next;
        drop(g);

        if next.is_per_frame() {
            tracing::trace!(?prev, ?next, "export state");
        } else {
            tracing::info!(?prev, ?next, "export state");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/export_session.rs"]
mod tests;
