//! Annual load forecast models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One forecast hour with confidence bounds.
///
/// Server contract: `yhat_lower <= yhat <= yhat_upper`. The client displays
/// the bounds as-is and does not revalidate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// Hour timestamp, strictly increasing across the vector.
    pub hour_ts: DateTime<Utc>,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Full annual forecast vector from `GET /jobs/{job_id}/forecast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Job UUID.
    pub job_id: Uuid,
    /// Target year of the forecast.
    pub forecast_year: i32,
    /// When the pipeline completed, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// Length of `data`.
    pub hours: usize,
    /// Confidence level of the bounds, e.g. 0.95.
    pub confidence_interval: f64,
    /// One entry per hour of the target year, ordered by `hour_ts`, no gaps.
    pub data: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Whether `data` actually holds the advertised number of hours.
    pub fn is_complete_vector(&self) -> bool {
        self.data.len() == self.hours
    }
}

/// Hours in a year: 8784 for leap years, 8760 otherwise.
pub fn expected_hours(year: i32) -> usize {
    if is_leap_year(year) { 8784 } else { 8760 }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
