//! HTTP client for the forecast pipeline API.
//!
//! Wraps the five boundary operations behind a single reqwest client with
//! connect/request timeouts. Every request carries the `X-API-Key` header;
//! non-2xx responses are mapped to [`ApiError::Api`] with the server's
//! `detail` message.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::multipart;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::API_KEY_HEADER;
use crate::error::{ApiError, ApiResult};
use crate::models::{ForecastResult, JobAccepted, JobStatus, QualityReport};
use crate::services::poller::StatusFetcher;
use crate::services::results::ResultsFetcher;

/// HTTP connect timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP total timeout per request. Forecast vectors are ~8760 rows, so this
/// is deliberately generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Upload extensions accepted by the parsing stage, checked client-side so
/// misuse fails before any bytes are sent. The server stays authoritative.
const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Forecast year bounds accepted by the server.
const MIN_FORECAST_YEAR: i32 = 2000;
const MAX_FORECAST_YEAR: i32 = 2100;

/// Structured error body returned by the API on rejection.
#[derive(serde::Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Client for the pipeline API.
#[derive(Clone)]
pub struct PipelineClient {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl PipelineClient {
    /// Create a new client against `base_url` (scheme + host, no trailing path).
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!("Pipeline client initialized (base_url={})", base_url);

        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Map a non-2xx response to a structured API error.
    ///
    /// Falls back to the HTTP status when the body carries no `detail`.
    async fn rejection(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let detail = match response.json::<ErrorBody>().await {
            Ok(body) => body.detail,
            Err(_) => format!("request failed with HTTP {status}"),
        };
        ApiError::Api { status, detail }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self
            .http
            .get(self.url(path))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    /// Upload a load-profile file and start a pipeline job.
    pub async fn create_job(&self, file: &Path, forecast_year: i32) -> ApiResult<JobAccepted> {
        if !(MIN_FORECAST_YEAR..=MAX_FORECAST_YEAR).contains(&forecast_year) {
            return Err(ApiError::InvalidInput(format!(
                "forecast year must be between {MIN_FORECAST_YEAR} and {MAX_FORECAST_YEAR}, got {forecast_year}"
            )));
        }

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ApiError::InvalidInput(format!("not a file: {}", file.display())))?;

        let extension = file
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ApiError::InvalidInput(format!(
                "unsupported file type '.{extension}'; allowed: .csv, .xlsx, .xls"
            )));
        }

        let bytes = tokio::fs::read(file).await?;
        if bytes.is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "file is empty: {}",
                file.display()
            )));
        }

        let form = multipart::Form::new()
            .part(
                "file",
                multipart::Part::bytes(bytes).file_name(file_name.clone()),
            )
            .text("forecast_year", forecast_year.to_string());

        let response = self
            .http
            .post(self.url("/upload"))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let accepted: JobAccepted = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        info!(
            "Job {} accepted for '{}' (forecast_year={})",
            accepted.job_id, file_name, forecast_year
        );
        Ok(accepted)
    }

    /// Fetch the current status of a job. Idempotent, safe to poll.
    pub async fn job_status(&self, job_id: Uuid) -> ApiResult<JobStatus> {
        self.get_json(&format!("/upload/{job_id}/status")).await
    }

    /// Fetch the quality report. Valid once the job reached `quality_check`.
    pub async fn quality_report(&self, job_id: Uuid) -> ApiResult<QualityReport> {
        self.get_json(&format!("/jobs/{job_id}/quality-report")).await
    }

    /// Fetch the full forecast vector. Valid once the job is `complete`.
    pub async fn forecast(&self, job_id: Uuid) -> ApiResult<ForecastResult> {
        self.get_json(&format!("/jobs/{job_id}/forecast")).await
    }

    /// Stream the forecast CSV artifact into `dest`.
    pub async fn download_forecast(&self, job_id: Uuid, dest: &Path) -> ApiResult<()> {
        let response = self
            .http
            .get(self.url(&format!("/jobs/{job_id}/forecast/download")))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let mut out = tokio::fs::File::create(dest).await?;
        let written = match Self::stream_to_file(response, &mut out).await {
            Ok(written) => written,
            Err(err) => {
                // A failed transfer must not leave a half-written CSV behind.
                drop(out);
                let _ = tokio::fs::remove_file(dest).await;
                return Err(err);
            }
        };

        info!(
            "Downloaded forecast for job {} to {} ({} bytes)",
            job_id,
            dest.display(),
            written
        );
        Ok(())
    }

    async fn stream_to_file(
        response: reqwest::Response,
        out: &mut tokio::fs::File,
    ) -> ApiResult<u64> {
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        out.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl StatusFetcher for PipelineClient {
    async fn fetch_status(&self, job_id: Uuid) -> ApiResult<JobStatus> {
        self.job_status(job_id).await
    }
}

#[async_trait]
impl ResultsFetcher for PipelineClient {
    async fn fetch_quality_report(&self, job_id: Uuid) -> ApiResult<QualityReport> {
        self.quality_report(job_id).await
    }

    async fn fetch_forecast(&self, job_id: Uuid) -> ApiResult<ForecastResult> {
        self.forecast(job_id).await
    }

    async fn start_download(&self, job_id: Uuid, dest: &Path) -> ApiResult<()> {
        self.download_forecast(job_id, dest).await
    }
}
