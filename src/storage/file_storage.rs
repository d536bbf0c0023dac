use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::data_capture::types::PacketReport;
use crate::error_handling::types::SinkWriteError;
use crate::storage::storage_trait::ReportSink;

/// Append-only text file with one `Packet <index> - Length: <n> bytes` line
/// per analyzed segment.
///
/// The file is opened in append mode for every record and closed right after,
/// so several analyzer runs (or restarts) can share it and nothing already in
/// it is ever truncated.
pub struct FileStorage {
    path: PathBuf,
    name: String,
}

impl FileStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        info!("FileStorage appending to {}", path.display());
        Self {
            name: path.display().to_string(),
            path,
        }
    }

    pub fn format_record(report: &PacketReport) -> String {
        format!(
            "Packet {} - Length: {} bytes",
            report.packet_index, report.frame_length
        )
    }
}

impl ReportSink for FileStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn append(&self, report: &PacketReport) -> Result<(), SinkWriteError> {
        let write_failed = |source| SinkWriteError {
            sink: self.name.clone(),
            source,
        };
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_failed)?;
        writeln!(f, "{}", Self::format_record(report)).map_err(write_failed)?;
        debug!(
            "[{}] appended packet {} to {}",
            report.session_id,
            report.packet_index,
            self.path.display()
        );
        Ok(())
    }
}
