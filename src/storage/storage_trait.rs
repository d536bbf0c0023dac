//! Report sink trait
//!
//! Implementors receive one [`PacketReport`] per analyzed TCP segment. Writes
//! are fire-and-forget from the capture pipeline's point of view: an error is
//! logged by the caller and capture carries on.

use crate::data_capture::types::PacketReport;
use crate::error_handling::types::SinkWriteError;

pub trait ReportSink: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    fn append(&self, report: &PacketReport) -> Result<(), SinkWriteError>;
}
