use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use uuid::Uuid;

use super::active_session::{ActiveSession, SummarySlot};
use super::SessionState;
use crate::configuration::types::CaptureConfig;
use crate::data_capture::capture_source::DeviceOpener;
use crate::data_capture::metrics::{elapsed_seconds, RunningMetrics};
use crate::data_capture::pipeline::{CapturePipeline, DeliveryEnd};
use crate::error_handling::types::SessionError;
use crate::storage::storage_trait::ReportSink;

/// Result of a start/stop request.
#[derive(Debug)]
pub enum Transition {
    Started(Uuid),
    /// START while already capturing: nothing changed.
    AlreadyCapturing(Uuid),
    Stopped(SessionSummary),
    /// STOP while idle: nothing changed.
    AlreadyIdle,
}

/// Final figures of a finished capture session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub end: DeliveryEnd,
    pub metrics: RunningMetrics,
}

impl SessionSummary {
    pub fn duration_secs(&self) -> f64 {
        elapsed_seconds(self.started_at, self.stopped_at)
    }

    /// Bytes seen over the whole session, in Mbps.
    pub fn average_throughput_mbps(&self) -> Option<f64> {
        let secs = self.duration_secs();
        if secs <= 0.0 {
            return None;
        }
        Some(self.metrics.bytes_seen as f64 * 8.0 / (1_000_000.0 * secs))
    }

    pub(crate) fn log(&self) {
        let m = &self.metrics;
        let rate = m
            .retransmission_rate()
            .map(|r| format!("{:.2}%", r))
            .unwrap_or_else(|| String::from("n/a"));
        let average = self
            .average_throughput_mbps()
            .map(|t| format!("{:.4} Mbps", t))
            .unwrap_or_else(|| String::from("n/a"));
        info!(
            "[{}] capture stopped after {:.3}s: packets={}, bytes={}, retransmitted={} ({}), average throughput={}",
            self.id,
            self.duration_secs(),
            m.packet_count,
            m.bytes_seen,
            m.retransmitted_packets,
            rate,
            average
        );
    }
}

/// The capture session state machine.
///
/// The session owns at most one [`ActiveSession`]. A worker that has returned
/// is idle even before it is reaped; its summary is already published by
/// then. Every start builds a new
/// metrics pipeline, so counters never carry over from a previous session.
pub struct CaptureSession {
    capture_config: CaptureConfig,
    opener: Arc<dyn DeviceOpener>,
    sinks: Vec<Arc<dyn ReportSink>>,
    active: Option<ActiveSession>,
    last_summary: SummarySlot,
}

impl CaptureSession {
    pub fn new(
        capture_config: CaptureConfig,
        opener: Arc<dyn DeviceOpener>,
        sinks: Vec<Arc<dyn ReportSink>>,
    ) -> Self {
        Self {
            capture_config,
            opener,
            sinks,
            active: None,
            last_summary: Arc::new(Mutex::new(None)),
        }
    }

    /// A worker that returned on its own (the facility stopped delivering)
    /// counts as idle even before it has been reaped.
    pub fn state(&self) -> SessionState {
        match &self.active {
            Some(active) if !active.is_finished() => SessionState::Capturing,
            _ => SessionState::Idle,
        }
    }

    pub fn active_session_id(&self) -> Option<Uuid> {
        self.active
            .as_ref()
            .filter(|a| !a.is_finished())
            .map(|a| a.id)
    }

    /// Summary of the most recently ended session.
    pub fn last_summary(&self) -> Option<SessionSummary> {
        self.last_summary.lock().ok().and_then(|slot| slot.clone())
    }

    /// Opens the capture device and starts the delivery worker.
    ///
    /// A device that cannot be opened leaves the session idle and is returned
    /// as [`SessionError::Device`].
    pub async fn start(&mut self) -> Result<Transition, SessionError> {
        self.reap_finished().await?;
        if let Some(active) = &self.active {
            warn!("[{}] start requested while already capturing", active.id);
            return Ok(Transition::AlreadyCapturing(active.id));
        }

        let source = self.opener.open(&self.capture_config).map_err(|e| {
            error!("{}", e);
            SessionError::Device(e)
        })?;

        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let pipeline = CapturePipeline::new(id, started_at, self.sinks.clone());
        self.active = Some(ActiveSession::spawn(
            id,
            started_at,
            source,
            pipeline,
            Arc::clone(&self.last_summary),
        ));

        info!(
            "[{}] capture started on {}",
            id, self.capture_config.interface
        );
        Ok(Transition::Started(id))
    }

    /// Signals the worker, waits until it has quiesced and released the
    /// handle, then returns to idle. No report is emitted for the session
    /// once this returns.
    pub async fn stop(&mut self) -> Result<Transition, SessionError> {
        self.reap_finished().await?;
        match &self.active {
            Some(active) => active.request_stop(),
            None => {
                warn!("stop requested while no capture is running");
                return Ok(Transition::AlreadyIdle);
            }
        }
        match self.finish().await? {
            Some(summary) => Ok(Transition::Stopped(summary)),
            None => Ok(Transition::AlreadyIdle),
        }
    }

    async fn reap_finished(&mut self) -> Result<(), SessionError> {
        let finished = self
            .active
            .as_ref()
            .filter(|a| a.is_finished())
            .map(|a| a.id);
        if let Some(id) = finished {
            debug!("[{}] reaping finished capture worker", id);
            self.finish().await?;
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<Option<SessionSummary>, SessionError> {
        let joined = match self.active.as_mut() {
            Some(active) => active.join().await,
            None => return Ok(None),
        };
        let active = match self.active.take() {
            Some(active) => active,
            None => return Ok(None),
        };

        let summary = joined.map_err(|e| {
            error!("[{}] capture worker failed: {}", active.id, e);
            SessionError::WorkerFailed(e.to_string())
        })?;
        Ok(Some(summary))
    }
}
