//! Source video access.

/// `ffprobe`/`ffmpeg` backed decoding.
pub mod ffmpeg;
/// Source metadata and the seekable source trait.
pub mod source;
