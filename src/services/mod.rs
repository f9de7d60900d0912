//! Client services: polling, result aggregation, session and credential state.

pub mod credentials;
pub mod poller;
pub mod results;
pub mod session;

pub use credentials::CredentialStore;
pub use poller::{JobPoller, PollEvent, PollHandle, StatusFetcher, TrackingView};
pub use results::{JobResults, ResultAggregator, ResultsFetcher};
pub use session::SessionController;
