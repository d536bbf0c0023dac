use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use log::{debug, info};
use tokio::task::{JoinError, JoinHandle};
use uuid::Uuid;

use super::session::SessionSummary;
use crate::data_capture::capture_source::FrameSource;
use crate::data_capture::pipeline::{CapturePipeline, DeliveryEnd};

/// Slot the worker publishes its summary into when it returns.
pub type SummarySlot = Arc<Mutex<Option<SessionSummary>>>;

/// Represents a running capture: the session identity, the stop flag shared
/// with the delivery worker, and the worker itself.
///
/// The capture handle is moved into the worker and dropped there, after the
/// last frame has been processed and before the worker completes. The worker
/// then logs the session summary and publishes it to the summary slot, so the
/// summary exists as soon as the session is idle, whatever ended it.
pub struct ActiveSession {
    /// Identifier used to correlate logs of this capture.
    pub id: Uuid,
    /// Wall-clock time at which the session started.
    pub started_at: DateTime<Utc>,
    stop_flag: Arc<AtomicBool>,
    worker: JoinHandle<SessionSummary>,
}

impl ActiveSession {
    /// Starts the blocking delivery loop on tokio's blocking pool.
    pub fn spawn(
        id: Uuid,
        started_at: DateTime<Utc>,
        mut source: Box<dyn FrameSource>,
        mut pipeline: CapturePipeline,
        summary_slot: SummarySlot,
    ) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop_flag);

        let worker = tokio::task::spawn_blocking(move || {
            let end = pipeline.run(source.as_mut(), &flag);
            drop(source);
            debug!("[{}] capture handle released", id);
            if end != DeliveryEnd::StopRequested {
                info!("[{}] capture ended without a stop request", id);
            }

            let summary = SessionSummary {
                id,
                started_at,
                stopped_at: Utc::now(),
                end,
                metrics: pipeline.into_metrics(),
            };
            summary.log();
            if let Ok(mut slot) = summary_slot.lock() {
                *slot = Some(summary.clone());
            }
            summary
        });

        Self {
            id,
            started_at,
            stop_flag,
            worker,
        }
    }

    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// True once the worker has returned, whether it was asked to or not.
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the worker to return. Only call once per session.
    pub async fn join(&mut self) -> Result<SessionSummary, JoinError> {
        (&mut self.worker).await
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        // the worker may still be running if the session is dropped without a stop
        self.request_stop();
    }
}
