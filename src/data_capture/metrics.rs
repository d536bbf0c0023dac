//! Running traffic metrics of one capture session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::types::{ClassifiedSegment, PacketReport};

/// Session-scoped counters. A fresh value is created for every session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunningMetrics {
    pub packet_count: u64,
    pub bytes_seen: u64,
    pub transmitted_packets: u64,
    pub retransmitted_packets: u64,
    /// `None` until the first segment of the session has been seen.
    pub last_seen_sequence_number: Option<u32>,
}

impl RunningMetrics {
    /// Share of transmitted packets detected as retransmissions, in percent.
    pub fn retransmission_rate(&self) -> Option<f64> {
        if self.transmitted_packets == 0 {
            return None;
        }
        Some(self.retransmitted_packets as f64 * 100.0 / self.transmitted_packets as f64)
    }
}

/// Updates [`RunningMetrics`] for each classified segment and computes the
/// instantaneous throughput against the session clock.
#[derive(Debug)]
pub struct MetricsEngine {
    session_id: Uuid,
    start_time: DateTime<Utc>,
    metrics: RunningMetrics,
}

impl MetricsEngine {
    pub fn new(session_id: Uuid, start_time: DateTime<Utc>) -> Self {
        Self {
            session_id,
            start_time,
            metrics: RunningMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &RunningMetrics {
        &self.metrics
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn into_metrics(self) -> RunningMetrics {
        self.metrics
    }

    pub fn on_segment(&mut self, segment: &ClassifiedSegment, now: DateTime<Utc>) -> PacketReport {
        let m = &mut self.metrics;
        m.packet_count += 1;
        m.transmitted_packets += 1;
        m.bytes_seen += segment.frame_length as u64;

        // Same sequence number as the segment right before it.
        let is_retransmission = m.last_seen_sequence_number == Some(segment.sequence_number);
        if is_retransmission {
            m.retransmitted_packets += 1;
        } else {
            m.last_seen_sequence_number = Some(segment.sequence_number);
        }

        PacketReport {
            session_id: self.session_id,
            packet_index: m.packet_count,
            frame_length: segment.frame_length,
            sequence_number: segment.sequence_number,
            throughput_mbps: throughput_mbps(
                m.packet_count,
                segment.frame_length,
                elapsed_seconds(self.start_time, now),
            ),
            retransmitted_packets: m.retransmitted_packets,
            is_retransmission,
            timestamp: now,
        }
    }
}

pub fn elapsed_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    match (now - start).num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => 0.0,
    }
}

/// `packet_count * frame_length * 8 / (1e6 * elapsed)`, `None` when no time
/// has elapsed (or the clock went backwards).
pub fn throughput_mbps(packet_count: u64, frame_length: usize, elapsed_secs: f64) -> Option<f64> {
    if elapsed_secs <= 0.0 || !elapsed_secs.is_finite() {
        return None;
    }
    let bits = packet_count as f64 * frame_length as f64 * 8.0;
    Some(bits / (1_000_000.0 * elapsed_secs))
}
