//! Output sinks
//!
//! Every analyzed TCP segment produces one [`PacketReport`](crate::data_capture::PacketReport)
//! that is handed to each configured sink.
//!
//! Components:
//! - `storage_trait`: the `ReportSink` trait.
//! - `file_storage`: append-only text file, one line per segment.
//! - `console`: status line per segment on stdout.

pub mod console;
pub mod file_storage;
pub mod storage_trait;

pub use console::ConsoleSink;
pub use file_storage::FileStorage;
pub use storage_trait::ReportSink;
