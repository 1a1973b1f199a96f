//! reelcut exports a trimmed range of a video as an MP4 or an animated GIF.
//!
//! An export run is driven by an [`ExportSession`]:
//!
//! - Describe the run with an [`ExportConfig`] (trim bounds plus format options)
//! - Open a [`VideoSource`] (for example [`FfmpegVideoSource`])
//! - Call [`ExportSession::start_export`] and receive an [`ExportArtifact`]
//!
//! Output dimensions and frame timestamps are planned up front by pure functions
//! ([`resolve_dimensions`], [`sample_timestamps`]); each timestamp is then seeked, composed with
//! `vello_cpu` and appended to the format's encoder.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Rendered frames into encoded bytes.
pub mod encode;
/// Export configuration and pure planning stages.
pub mod export;
/// Source video access.
pub mod media;
/// Seek-then-draw frame rendering.
pub mod render;
/// Export orchestration.
pub mod session;

pub use crate::foundation::core::{Fps, OutputDimensions, TrimRange};
pub use crate::foundation::error::{ExportError, ExportErrorKind, ExportResult};

pub use crate::encode::encoder::{EncoderConfig, ExportArtifact, FrameEncoder, InMemoryEncoder};
pub use crate::encode::gif::GifFrameEncoder;
pub use crate::encode::mp4::Mp4FrameEncoder;
pub use crate::export::config::{
    ExportConfig, ExportFormat, GifFrameRate, GifOptions, GifSizePreset, Mp4Options, Mp4Quality,
    OutputOptions,
};
pub use crate::export::dimensions::{SizePolicy, resolve_dimensions};
pub use crate::export::sampler::{frame_count, sample_timestamps};
pub use crate::media::ffmpeg::{FfmpegSourceOpts, FfmpegVideoSource, probe_media};
pub use crate::media::source::{
    SeekCompletion, SeekRequest, SourceFrame, SourceMedia, VideoSource,
};
pub use crate::render::compositor::{Composition, Compositor, CpuCompositor, VideoMask};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::renderer::FrameRenderer;
pub use crate::session::cancel::CancelHandle;
pub use crate::session::export_session::{ExportSession, ExportSessionOpts, ExportState};
