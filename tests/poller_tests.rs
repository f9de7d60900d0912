//! Integration tests for the job poll loop.
//!
//! Drives `JobPoller` against scripted status fetchers under tokio's paused
//! clock, covering terminal stop conditions, transient retries, and the
//! cancellation discard rule.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::sync::mpsc::error::TryRecvError;
use uuid::Uuid;

use loadcast_client::error::{ApiError, ApiResult};
use loadcast_client::models::{JobStage, JobStatus};
use loadcast_client::services::{JobPoller, PollEvent, StatusFetcher, TrackingView};

const POLL_INTERVAL: Duration = Duration::from_millis(3000);

fn status(job_id: Uuid, stage: JobStage) -> JobStatus {
    JobStatus {
        job_id,
        status: stage,
        file_name: "profile.csv".to_string(),
        forecast_year: 2026,
        created_at: None,
        completed_at: None,
        error_message: None,
    }
}

fn api_error(detail: &str) -> ApiError {
    ApiError::Api {
        status: 503,
        detail: detail.to_string(),
    }
}

/// Returns one scripted outcome per fetch; hangs forever once exhausted, so
/// an over-eager loop shows up as a hung join rather than invented data.
struct ScriptedFetcher {
    script: Mutex<VecDeque<ApiResult<JobStatus>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(script: Vec<ApiResult<JobStatus>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusFetcher for ScriptedFetcher {
    async fn fetch_status(&self, _job_id: Uuid) -> ApiResult<JobStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(outcome) => outcome,
            None => std::future::pending().await,
        }
    }
}

/// Blocks each fetch until released, so a test can cancel mid-flight.
struct GatedFetcher {
    entered: Notify,
    release: Notify,
    outcome: Mutex<Option<ApiResult<JobStatus>>>,
    calls: AtomicUsize,
}

impl GatedFetcher {
    fn new(outcome: ApiResult<JobStatus>) -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
            outcome: Mutex::new(Some(outcome)),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl StatusFetcher for GatedFetcher {
    async fn fetch_status(&self, _job_id: Uuid) -> ApiResult<JobStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        let outcome = self.outcome.lock().unwrap().take();
        match outcome {
            Some(outcome) => outcome,
            None => std::future::pending().await,
        }
    }
}

#[tokio::test(start_paused = true)]
async fn complete_stops_loop_after_final_emission() {
    let job_id = Uuid::new_v4();
    let fetcher = ScriptedFetcher::new(vec![
        Ok(status(job_id, JobStage::Queued)),
        Ok(status(job_id, JobStage::Complete)),
    ]);
    let poller = JobPoller::new(Arc::clone(&fetcher), POLL_INTERVAL);

    let (handle, mut rx) = poller.track(job_id);

    let first = rx.recv().await.unwrap();
    assert!(matches!(first, PollEvent::Status(ref s) if s.status == JobStage::Queued));

    // Second fetch only happens after the poll interval elapses
    let second = rx.recv().await.unwrap();
    assert!(matches!(second, PollEvent::Status(ref s) if s.status == JobStage::Complete));

    // Terminal stage: no further scheduling, channel closes
    assert!(rx.recv().await.is_none());
    handle.join().await;
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_stops_loop_and_exposes_error_message_unchanged() {
    let job_id = Uuid::new_v4();
    let mut failed = status(job_id, JobStage::Failed);
    failed.error_message = Some("parse error: no timestamp column found".to_string());

    let fetcher = ScriptedFetcher::new(vec![Ok(failed)]);
    let poller = JobPoller::new(Arc::clone(&fetcher), POLL_INTERVAL);
    let (handle, mut rx) = poller.track(job_id);

    let event = rx.recv().await.unwrap();
    match event {
        PollEvent::Status(s) => {
            assert_eq!(s.status, JobStage::Failed);
            assert_eq!(
                s.error_message.as_deref(),
                Some("parse error: no timestamp column found")
            );
        }
        other => panic!("expected status event, got {other:?}"),
    }

    assert!(rx.recv().await.is_none());
    handle.join().await;
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_errors_retry_and_clear_on_success() {
    let job_id = Uuid::new_v4();
    let fetcher = ScriptedFetcher::new(vec![
        Err(api_error("upstream unavailable")),
        Err(api_error("upstream unavailable")),
        Ok(status(job_id, JobStage::Parsing)),
        Ok(status(job_id, JobStage::Complete)),
    ]);
    let poller = JobPoller::new(Arc::clone(&fetcher), POLL_INTERVAL);
    let (handle, mut rx) = poller.track(job_id);

    let mut view = TrackingView::default();
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        view.apply(&event);
        events.push(event);
    }
    handle.join().await;

    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], PollEvent::TransientError(ref m) if m == "upstream unavailable"));
    assert!(matches!(events[1], PollEvent::TransientError(_)));
    assert!(matches!(events[2], PollEvent::Status(ref s) if s.status == JobStage::Parsing));
    assert!(matches!(events[3], PollEvent::Status(ref s) if s.status == JobStage::Complete));

    // The success cleared the error flag; the loop never gave up on its own
    assert!(view.transient_error().is_none());
    assert_eq!(view.last_status().map(|s| s.status), Some(JobStage::Complete));
    assert_eq!(fetcher.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn cancel_then_resolve_emits_nothing() {
    let job_id = Uuid::new_v4();
    let fetcher = GatedFetcher::new(Ok(status(job_id, JobStage::Complete)));
    let poller = JobPoller::new(Arc::clone(&fetcher), POLL_INTERVAL);
    let (handle, mut rx) = poller.track(job_id);

    // Wait until the first fetch is in flight, cancel, then let it resolve
    fetcher.entered.notified().await;
    handle.cancel();
    fetcher.release.notify_one();
    handle.join().await;

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_then_reject_emits_nothing() {
    let job_id = Uuid::new_v4();
    let fetcher = GatedFetcher::new(Err(api_error("boom")));
    let poller = JobPoller::new(Arc::clone(&fetcher), POLL_INTERVAL);
    let (handle, mut rx) = poller.track(job_id);

    fetcher.entered.notified().await;
    handle.cancel();
    fetcher.release.notify_one();
    handle.join().await;

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_backoff_schedules_no_further_fetch() {
    let job_id = Uuid::new_v4();
    let fetcher = ScriptedFetcher::new(vec![Ok(status(job_id, JobStage::Queued))]);
    let poller = JobPoller::new(Arc::clone(&fetcher), POLL_INTERVAL);
    let (handle, mut rx) = poller.track(job_id);

    // First emission arrives, then the loop sleeps for the poll interval
    let first = rx.recv().await.unwrap();
    assert!(matches!(first, PollEvent::Status(_)));

    // Cancel while the next fetch is scheduled but not yet issued
    handle.cancel();
    handle.join().await;

    assert!(matches!(rx.try_recv(), Err(TryRecvError::Disconnected)));
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_receiver_stops_the_loop() {
    let job_id = Uuid::new_v4();
    let fetcher = ScriptedFetcher::new(vec![
        Ok(status(job_id, JobStage::Queued)),
        Ok(status(job_id, JobStage::Parsing)),
    ]);
    let poller = JobPoller::new(Arc::clone(&fetcher), POLL_INTERVAL);
    let (handle, rx) = poller.track(job_id);

    // Navigating away drops the receiver; the loop stops at its next send
    drop(rx);
    handle.join().await;
    assert!(fetcher.calls() <= 2);
}
