//! Capture session management.
//!
//! A single [`CaptureSession`](session::CaptureSession) exists for the whole
//! life of the analyzer. It moves between [`SessionState::Idle`] and
//! [`SessionState::Capturing`] on start/stop commands and owns the capture
//! handle, the delivery worker and the running metrics of the active capture.

use serde::{Deserialize, Serialize};

/// Submodule for the running capture worker.
pub mod active_session;
/// Submodule for the session state machine.
pub mod session;

#[cfg(test)]
mod tests;

pub use session::{CaptureSession, SessionSummary, Transition};

/// Represents the current state of the capture session.
///
/// Variants:
/// - `Idle`: no capture handle is open.
/// - `Capturing`: a handle is open and frames are being analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Capturing,
}
