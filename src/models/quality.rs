//! Data quality report models.
//!
//! Produced once by the server after the quality-check stage and immutable
//! afterwards. Degenerate inputs (empty data) yield a report with only the
//! verdict and an `error` string, so the rich sections all default.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quality report for a job's normalized hourly series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Job UUID, stored in the report for traceability.
    pub job_id: Uuid,
    /// Overall verdict (coverage above the server's threshold).
    pub passed: bool,
    /// Number of records in the normalized series.
    #[serde(default)]
    pub total_records: u64,
    /// Share of expected hours that carry a value, 0-100.
    #[serde(default)]
    pub coverage_percent: f64,
    /// Expected hours without a value.
    #[serde(default)]
    pub missing_hours: u64,
    /// First/last timestamp of the series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Descriptive statistics; each value may be null for degenerate input.
    #[serde(default)]
    pub statistics: QualityStatistics,
    /// Outlier detection summary.
    #[serde(default)]
    pub outliers: OutlierSummary,
    /// Flat-period (stuck meter) summary.
    #[serde(default)]
    pub flat_periods: FlatPeriodSummary,
    /// Set instead of the rich sections when the input was unusable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// First/last timestamp of the analyzed series, ISO 8601.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Descriptive statistics over the non-null hourly values (kW).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityStatistics {
    pub mean_kw: Option<f64>,
    pub min_kw: Option<f64>,
    pub max_kw: Option<f64>,
    pub std_kw: Option<f64>,
    pub p5_kw: Option<f64>,
    pub p95_kw: Option<f64>,
}

/// Outlier detection summary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlierSummary {
    /// Values outside the detection fences.
    pub count: u64,
    /// Detection method name (e.g. "IQR").
    #[serde(default)]
    pub method: String,
    /// Fence width as a multiple of the method's spread measure.
    #[serde(default)]
    pub threshold_factor: f64,
}

/// Runs of consecutive hours with an identical value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatPeriodSummary {
    pub count: u64,
    pub total_hours: u64,
    /// Minimum run length counted as flat.
    #[serde(default)]
    pub min_consecutive_hours: u64,
}
