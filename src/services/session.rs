//! Session controller: owns the current view and the stored credential.
//!
//! Single writer for both, so navigation and poll-driven transitions cannot
//! race. The transition logic itself lives in `models::view` as a pure
//! function; this wrapper adds ownership and the credential side effect.

use secrecy::SecretString;
use tracing::debug;
use uuid::Uuid;

use crate::models::view::{self, ApplicationView, ViewEvent};
use crate::services::credentials::CredentialStore;

/// Long-lived controller for one client session.
pub struct SessionController {
    view: ApplicationView,
    credentials: CredentialStore,
    api_key: Option<SecretString>,
}

impl SessionController {
    /// Start at the upload view, reloading any stored credential.
    pub fn new(credentials: CredentialStore) -> Self {
        let api_key = credentials.load();
        Self {
            view: ApplicationView::Upload,
            credentials,
            api_key,
        }
    }

    pub fn view(&self) -> &ApplicationView {
        &self.view
    }

    /// Route one event through the transition function.
    pub fn handle(&mut self, event: ViewEvent) -> &ApplicationView {
        let next = view::apply(self.view.clone(), event);
        if next != self.view {
            debug!("View transition: {:?} -> {:?}", self.view, next);
            self.view = next;
        }
        &self.view
    }

    /// An upload was accepted; move to the tracking view.
    pub fn job_accepted(&mut self, job_id: Uuid, file_name: String, forecast_year: i32) {
        self.handle(ViewEvent::JobAccepted {
            job_id,
            file_name,
            forecast_year,
        });
    }

    /// The poller observed `complete` for this job.
    pub fn job_completed(&mut self, job_id: Uuid) {
        self.handle(ViewEvent::JobCompleted { job_id });
    }

    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }

    /// Set and persist the credential. Persistence failures are swallowed;
    /// the key stays usable for this session either way.
    pub fn set_api_key(&mut self, api_key: SecretString) {
        self.credentials.save(&api_key);
        self.api_key = Some(api_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn controller() -> (SessionController, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at_path(dir.path().join("credentials.json"));
        (SessionController::new(store), dir)
    }

    #[test]
    fn starts_at_upload_view() {
        let (controller, _dir) = controller();
        assert_eq!(*controller.view(), ApplicationView::Upload);
        assert!(controller.api_key().is_none());
    }

    #[test]
    fn completion_transition_fires_exactly_once() {
        let (mut controller, _dir) = controller();
        let job_id = Uuid::new_v4();
        controller.job_accepted(job_id, "profile.csv".to_string(), 2026);

        controller.job_completed(job_id);
        let results = controller.view().clone();
        assert!(matches!(results, ApplicationView::Results { .. }));

        // A duplicate terminal observation changes nothing
        controller.job_completed(job_id);
        assert_eq!(*controller.view(), results);
    }

    #[test]
    fn set_api_key_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let store = CredentialStore::at_path(path.clone());
        let mut controller = SessionController::new(store);
        controller.set_api_key(SecretString::from("sk-persist".to_string()));
        assert_eq!(controller.api_key().unwrap().expose_secret(), "sk-persist");

        // A new session picks the key back up
        let controller = SessionController::new(CredentialStore::at_path(path));
        assert_eq!(controller.api_key().unwrap().expose_secret(), "sk-persist");
    }

    #[test]
    fn set_api_key_survives_storage_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let store = CredentialStore::at_path(blocker.join("credentials.json"));
        let mut controller = SessionController::new(store);
        controller.set_api_key(SecretString::from("sk-volatile".to_string()));

        // Write failed silently, but the key is live for this session
        assert_eq!(controller.api_key().unwrap().expose_secret(), "sk-volatile");
    }
}
