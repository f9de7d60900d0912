//! Job domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline stage of a processing job.
///
/// The first seven variants form the ordered happy path; `Failed` is the
/// terminal error variant and can be reached from any non-terminal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    /// Job created, waiting for a worker.
    Queued,
    /// Reading the uploaded load profile.
    Parsing,
    /// Resampling to hourly resolution and localizing timestamps.
    Normalizing,
    /// Joining weather and holiday covariates.
    Enriching,
    /// Computing the data quality report.
    QualityCheck,
    /// Running the forecasting model.
    Forecasting,
    /// Pipeline finished, all artifacts available.
    Complete,
    /// Pipeline aborted; see `JobStatus::error_message`.
    Failed,
}

/// Canonical pipeline order, used for progress rendering.
pub const STAGE_ORDER: [JobStage; 7] = [
    JobStage::Queued,
    JobStage::Parsing,
    JobStage::Normalizing,
    JobStage::Enriching,
    JobStage::QualityCheck,
    JobStage::Forecasting,
    JobStage::Complete,
];

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Parsing => "parsing",
            Self::Normalizing => "normalizing",
            Self::Enriching => "enriching",
            Self::QualityCheck => "quality_check",
            Self::Forecasting => "forecasting",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "parsing" => Some(Self::Parsing),
            "normalizing" => Some(Self::Normalizing),
            "enriching" => Some(Self::Enriching),
            "quality_check" => Some(Self::QualityCheck),
            "forecasting" => Some(Self::Forecasting),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Human-readable label for progress display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Parsing => "Parsing",
            Self::Normalizing => "Normalizing",
            Self::Enriching => "Enriching",
            Self::QualityCheck => "Quality check",
            Self::Forecasting => "Forecasting",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// True for `Complete` and `Failed`; no further transitions occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Position in the canonical pipeline order.
    ///
    /// `Failed` has no position: failure can occur at any point, so it must
    /// not imply completion of prior steps.
    pub fn progress_index(&self) -> Option<usize> {
        STAGE_ORDER.iter().position(|s| s == self)
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job status response from `GET /upload/{job_id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    /// Job UUID.
    pub job_id: Uuid,
    /// Current pipeline stage.
    pub status: JobStage,
    /// Original upload file name.
    pub file_name: String,
    /// Target forecast year.
    pub forecast_year: i32,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Completion timestamp, set only at a terminal stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Pipeline-side failure cause, present only when `status` is `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Response from `POST /upload` after a job is accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct JobAccepted {
    /// Newly assigned job UUID.
    pub job_id: Uuid,
    /// Initial stage (always `queued`).
    pub status: JobStage,
    /// Hint from the server, e.g. which endpoint to poll.
    #[serde(default)]
    pub message: Option<String>,
}
