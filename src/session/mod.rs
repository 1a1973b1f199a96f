//! Export orchestration and cancellation.

/// Cooperative cancellation.
pub mod cancel;
/// The export state machine.
pub mod export_session;
