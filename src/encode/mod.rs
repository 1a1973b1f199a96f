//! Frame encoders: the encoder seam plus GIF and MP4 implementations.

/// Encoder trait, artifact type and the in-memory encoder.
pub mod encoder;
/// Animated GIF encoder.
pub mod gif;
/// H.264/MP4 encoder backed by `ffmpeg`.
pub mod mp4;
