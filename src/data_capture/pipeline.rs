//! Per-frame pipeline: classifier -> metrics engine -> report sinks, and the
//! blocking delivery loop that feeds it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, trace, warn};
use serde::Serialize;
use uuid::Uuid;

use super::capture_source::FrameSource;
use super::frame_classifier::classify;
use super::metrics::{MetricsEngine, RunningMetrics};
use super::types::{Delivery, Frame, PacketReport};
use crate::storage::storage_trait::ReportSink;

/// Why a delivery loop returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeliveryEnd {
    StopRequested,
    SourceEnded,
    SourceFailed(String),
}

pub struct CapturePipeline {
    session_id: Uuid,
    engine: MetricsEngine,
    sinks: Vec<Arc<dyn ReportSink>>,
}

impl CapturePipeline {
    pub fn new(session_id: Uuid, start_time: DateTime<Utc>, sinks: Vec<Arc<dyn ReportSink>>) -> Self {
        Self {
            session_id,
            engine: MetricsEngine::new(session_id, start_time),
            sinks,
        }
    }

    pub fn metrics(&self) -> &RunningMetrics {
        self.engine.metrics()
    }

    /// Runs one frame through the pipeline. Returns the report when the frame
    /// was a TCP segment; other frames leave the metrics untouched.
    pub fn process(&mut self, frame: &Frame) -> Option<PacketReport> {
        let segment = match classify(&frame.data, frame.captured_len) {
            Some(segment) => segment,
            None => {
                trace!("[{}] frame of {} bytes skipped", self.session_id, frame.captured_len);
                return None;
            }
        };

        let report = self.engine.on_segment(&segment, frame.timestamp);
        for sink in &self.sinks {
            if let Err(e) = sink.append(&report) {
                warn!(
                    "[{}] packet {} not written to {}: {}",
                    self.session_id,
                    report.packet_index,
                    sink.name(),
                    e.source
                );
            }
        }
        Some(report)
    }

    /// Pulls frames from `source` until `stop` is raised or the source stops
    /// delivering. The flag is checked between deliveries, and once more after
    /// a frame arrives so that nothing is emitted after a stop request has
    /// been observed.
    pub fn run(&mut self, source: &mut dyn FrameSource, stop: &AtomicBool) -> DeliveryEnd {
        info!("[{}] delivery loop started", self.session_id);
        let end = loop {
            if stop.load(Ordering::Acquire) {
                break DeliveryEnd::StopRequested;
            }
            match source.next_frame() {
                Ok(Delivery::Frame(frame)) => {
                    if stop.load(Ordering::Acquire) {
                        break DeliveryEnd::StopRequested;
                    }
                    self.process(&frame);
                }
                Ok(Delivery::Idle) => {}
                Ok(Delivery::Ended) => break DeliveryEnd::SourceEnded,
                Err(e) => {
                    error!("[{}] {}", self.session_id, e);
                    break DeliveryEnd::SourceFailed(e.to_string());
                }
            }
        };
        info!("[{}] delivery loop finished: {:?}", self.session_id, end);
        end
    }

    pub fn into_metrics(self) -> RunningMetrics {
        self.engine.into_metrics()
    }
}
