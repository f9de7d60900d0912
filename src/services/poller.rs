//! Job status polling.
//!
//! Completion is only observable by asking, so the loop retries transient
//! failures indefinitely and stops on exactly three conditions: an observed
//! terminal stage, explicit cancellation, or a dropped receiver. The
//! cancellation flag is checked after every suspension point, so a cancelled
//! loop never emits stale state into a view that has navigated away.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::JobStatus;

/// Capability the poller needs from the API layer.
#[async_trait]
pub trait StatusFetcher: Send + Sync + 'static {
    async fn fetch_status(&self, job_id: Uuid) -> ApiResult<JobStatus>;
}

/// One observation emitted by the poll loop.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A status fetch succeeded.
    Status(JobStatus),
    /// A status fetch failed; the loop retries after the poll interval.
    TransientError(String),
}

/// Handle to a running poll loop.
pub struct PollHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the loop. An in-flight fetch is allowed to complete and is then
    /// discarded; nothing further is emitted or scheduled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until the loop task has wound down.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Repeatedly fetches job status until a terminal stage or cancellation.
pub struct JobPoller<F> {
    fetcher: Arc<F>,
    interval: Duration,
}

impl<F: StatusFetcher> JobPoller<F> {
    pub fn new(fetcher: Arc<F>, interval: Duration) -> Self {
        Self { fetcher, interval }
    }

    /// Start polling `job_id`.
    ///
    /// Events arrive on the returned receiver; the handle cancels the loop.
    /// Dropping the receiver also stops the loop at its next emission.
    pub fn track(&self, job_id: Uuid) -> (PollHandle, mpsc::UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.fetcher),
            job_id,
            self.interval,
            tx,
            Arc::clone(&cancelled),
        ));
        (PollHandle { cancelled, task }, rx)
    }
}

/// The loop is strictly sequential: fetch N+1 is never issued before fetch
/// N's outcome has been processed.
async fn poll_loop<F: StatusFetcher>(
    fetcher: Arc<F>,
    job_id: Uuid,
    interval: Duration,
    tx: mpsc::UnboundedSender<PollEvent>,
    cancelled: Arc<AtomicBool>,
) {
    loop {
        let outcome = fetcher.fetch_status(job_id).await;

        if cancelled.load(Ordering::SeqCst) {
            debug!("Poll loop for job {} cancelled, discarding fetch outcome", job_id);
            return;
        }

        match outcome {
            Ok(status) => {
                let stage = status.status;
                if tx.send(PollEvent::Status(status)).is_err() {
                    return;
                }
                if stage.is_terminal() {
                    debug!("Job {} reached terminal stage '{}', stopping poll", job_id, stage);
                    return;
                }
            }
            Err(err) => {
                warn!("Status fetch for job {} failed: {}", job_id, err);
                if tx.send(PollEvent::TransientError(err.user_message())).is_err() {
                    return;
                }
            }
        }

        tokio::time::sleep(interval).await;

        if cancelled.load(Ordering::SeqCst) {
            debug!("Poll loop for job {} cancelled during backoff", job_id);
            return;
        }
    }
}

/// Display state of the tracking view, folded from poll events.
///
/// A transient error is shown alongside the last known good status and
/// cleared as soon as a fetch succeeds again.
#[derive(Debug, Clone, Default)]
pub struct TrackingView {
    last_status: Option<JobStatus>,
    transient_error: Option<String>,
}

impl TrackingView {
    pub fn apply(&mut self, event: &PollEvent) {
        match event {
            PollEvent::Status(status) => {
                self.last_status = Some(status.clone());
                self.transient_error = None;
            }
            PollEvent::TransientError(message) => {
                self.transient_error = Some(message.clone());
            }
        }
    }

    pub fn last_status(&self) -> Option<&JobStatus> {
        self.last_status.as_ref()
    }

    pub fn transient_error(&self) -> Option<&str> {
        self.transient_error.as_deref()
    }

    /// Progress position of the last observed stage; `None` before the first
    /// observation and for `failed` (all steps rendered pending).
    pub fn progress_index(&self) -> Option<usize> {
        self.last_status
            .as_ref()
            .and_then(|s| s.status.progress_index())
    }
}
