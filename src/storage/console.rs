use std::io::{self, Write};

use crate::data_capture::types::PacketReport;
use crate::error_handling::types::SinkWriteError;
use crate::storage::storage_trait::ReportSink;

/// Human-readable status line per analyzed segment on stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn format_line(report: &PacketReport) -> String {
        let throughput = match report.throughput_mbps {
            Some(mbps) => format!("{:.4} Mbps", mbps),
            None => String::from("n/a"),
        };
        format!(
            "Packet {} - Throughput: {}, Retransmitted Packets: {}",
            report.packet_index, throughput, report.retransmitted_packets
        )
    }
}

impl ReportSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn append(&self, report: &PacketReport) -> Result<(), SinkWriteError> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", Self::format_line(report)).map_err(|source| SinkWriteError {
            sink: String::from("console"),
            source,
        })
    }
}
