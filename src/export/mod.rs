//! Pure planning stages of an export: configuration, output dimensions, frame timestamps.

/// Export configuration types.
pub mod config;
/// Output dimension resolution.
pub mod dimensions;
/// Frame timestamp sampling.
pub mod sampler;
