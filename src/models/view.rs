//! Client view state.
//!
//! One tagged value models what the application currently shows; transitions
//! are a pure function of (current view, event), so they unit-test without
//! any UI attached.

use uuid::Uuid;

/// The mutually exclusive views of the client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationView {
    /// Waiting for a load profile to be submitted.
    Upload,
    /// A job is running; its status is being polled.
    Tracking {
        job_id: Uuid,
        file_name: String,
        forecast_year: i32,
    },
    /// The tracked job completed; artifacts are shown.
    Results {
        job_id: Uuid,
        file_name: String,
        forecast_year: i32,
    },
}

/// Events that drive view transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// An upload was accepted and a job assigned.
    JobAccepted {
        job_id: Uuid,
        file_name: String,
        forecast_year: i32,
    },
    /// The poller observed stage `complete` for this job.
    JobCompleted { job_id: Uuid },
    /// User navigation: results back to the tracking view.
    BackToTracking,
    /// User navigation: start over with a new upload.
    NewUpload,
}

/// Apply one event to the current view.
///
/// Navigation events never fail; an event that does not apply to the current
/// view leaves it unchanged. `JobCompleted` only fires the transition when it
/// names the tracked job, so a stale poll loop cannot move the view.
pub fn apply(view: ApplicationView, event: ViewEvent) -> ApplicationView {
    match (view, event) {
        (
            ApplicationView::Upload,
            ViewEvent::JobAccepted {
                job_id,
                file_name,
                forecast_year,
            },
        ) => ApplicationView::Tracking {
            job_id,
            file_name,
            forecast_year,
        },
        (
            ApplicationView::Tracking {
                job_id,
                file_name,
                forecast_year,
            },
            ViewEvent::JobCompleted { job_id: completed },
        ) if completed == job_id => ApplicationView::Results {
            job_id,
            file_name,
            forecast_year,
        },
        (
            ApplicationView::Results {
                job_id,
                file_name,
                forecast_year,
            },
            ViewEvent::BackToTracking,
        ) => ApplicationView::Tracking {
            job_id,
            file_name,
            forecast_year,
        },
        (_, ViewEvent::NewUpload) => ApplicationView::Upload,
        (view, _) => view,
    }
}
