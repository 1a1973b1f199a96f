//! Frame rendering: compositing and seek-then-draw.

/// Compositor seam and the `vello_cpu` implementation.
pub mod compositor;
/// Rendered frame buffer.
pub mod frame;
/// Seek-driven frame renderer.
pub mod renderer;
