//! Domain models for the forecast pipeline client.

pub mod forecast;
pub mod job;
pub mod quality;
pub mod view;

// Re-export commonly used types
pub use forecast::{ForecastPoint, ForecastResult, expected_hours};
pub use job::{JobAccepted, JobStage, JobStatus, STAGE_ORDER};
pub use quality::{
    DateRange, FlatPeriodSummary, OutlierSummary, QualityReport, QualityStatistics,
};
pub use view::{ApplicationView, ViewEvent};
