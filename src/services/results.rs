//! Result aggregation for completed jobs.
//!
//! Unlike the poll loop, nothing here retries: a failed load attempt is
//! surfaced and left to the user to repeat.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{ForecastResult, QualityReport};

/// Capabilities the aggregator needs from the API layer.
#[async_trait]
pub trait ResultsFetcher: Send + Sync + 'static {
    async fn fetch_quality_report(&self, job_id: Uuid) -> ApiResult<QualityReport>;
    async fn fetch_forecast(&self, job_id: Uuid) -> ApiResult<ForecastResult>;
    async fn start_download(&self, job_id: Uuid, dest: &Path) -> ApiResult<()>;
}

/// Outcome of one load attempt.
///
/// Load failure is not atomic across the pair: an artifact that arrived is
/// kept and displayable even when the other fetch failed.
#[derive(Debug, Clone, Default)]
pub struct JobResults {
    pub quality: Option<QualityReport>,
    pub forecast: Option<ForecastResult>,
    /// Message of the first failure observed, if either fetch failed.
    pub load_error: Option<String>,
}

impl JobResults {
    pub fn fully_loaded(&self) -> bool {
        self.quality.is_some() && self.forecast.is_some()
    }
}

/// Fetches the two result artifacts of a completed job.
pub struct ResultAggregator<F> {
    fetcher: Arc<F>,
    /// Count of downloads currently in flight; overlapping downloads are
    /// permitted, so a bool would be cleared by whichever finishes first.
    downloads_in_flight: AtomicUsize,
}

impl<F: ResultsFetcher> ResultAggregator<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self {
            fetcher,
            downloads_in_flight: AtomicUsize::new(0),
        }
    }

    /// Load the quality report and the forecast vector.
    ///
    /// The two fetches are independent requests issued concurrently; both
    /// outcomes are awaited before returning.
    pub async fn load(&self, job_id: Uuid) -> JobResults {
        let (quality, forecast) = tokio::join!(
            self.fetcher.fetch_quality_report(job_id),
            self.fetcher.fetch_forecast(job_id),
        );

        let mut results = JobResults::default();

        match quality {
            Ok(report) => results.quality = Some(report),
            Err(err) => {
                warn!("Quality report load for job {} failed: {}", job_id, err);
                results.load_error = Some(err.user_message());
            }
        }

        match forecast {
            Ok(vector) => results.forecast = Some(vector),
            Err(err) => {
                warn!("Forecast load for job {} failed: {}", job_id, err);
                if results.load_error.is_none() {
                    results.load_error = Some(err.user_message());
                }
            }
        }

        debug!(
            "Results loaded for job {} (quality={}, forecast={}, error={})",
            job_id,
            results.quality.is_some(),
            results.forecast.is_some(),
            results.load_error.is_some()
        );
        results
    }

    /// Trigger a one-shot download of the forecast CSV into `dest`.
    ///
    /// Independent of `load`: its failure does not touch already-loaded
    /// artifacts. Overlapping invocations are permitted; the in-flight count
    /// only exists so a UI can disable re-entrant triggers.
    pub async fn download(&self, job_id: Uuid, dest: &Path) -> Result<(), String> {
        self.downloads_in_flight.fetch_add(1, Ordering::SeqCst);
        let outcome = self.fetcher.start_download(job_id, dest).await;
        self.downloads_in_flight.fetch_sub(1, Ordering::SeqCst);

        outcome.map_err(|err| {
            warn!("Forecast download for job {} failed: {}", job_id, err);
            err.user_message()
        })
    }

    pub fn is_downloading(&self) -> bool {
        self.downloads_in_flight.load(Ordering::SeqCst) > 0
    }
}
