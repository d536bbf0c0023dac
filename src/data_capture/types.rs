//! Common data types used across the data_capture subsystem.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One link-layer frame as delivered by the capture facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Captured bytes, starting at the Ethernet header.
    pub data: Vec<u8>,
    /// Number of bytes the facility reports as captured.
    pub captured_len: usize,
    /// Capture timestamp reported by the facility.
    pub timestamp: DateTime<Utc>,
}

impl Frame {
    pub fn new(data: Vec<u8>, timestamp: DateTime<Utc>) -> Self {
        let captured_len = data.len();
        Self {
            data,
            captured_len,
            timestamp,
        }
    }
}

/// A frame confirmed to be Ethernet -> IPv4 -> TCP, reduced to what the
/// metrics need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedSegment {
    pub sequence_number: u32,
    pub frame_length: usize,
}

/// Outcome of one call to the capture facility.
#[derive(Debug)]
pub enum Delivery {
    Frame(Frame),
    /// The read timeout expired without a frame.
    Idle,
    /// The facility will not deliver any more frames.
    Ended,
}

/// Per-segment result of the metrics engine, consumed by the report sinks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketReport {
    pub session_id: Uuid,
    /// 1-based index of the segment within its session.
    pub packet_index: u64,
    pub frame_length: usize,
    pub sequence_number: u32,
    /// `None` when no time has elapsed since the session started.
    pub throughput_mbps: Option<f64>,
    pub retransmitted_packets: u64,
    pub is_retransmission: bool,
    pub timestamp: DateTime<Utc>,
}
