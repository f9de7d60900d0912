//! Durable client-local storage for the API credential.
//!
//! Persistence is best-effort: a failed write means the key is simply not
//! remembered across sessions, never a hard error.

use std::fs;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// On-disk shape of `credentials.json`.
#[derive(Serialize, Deserialize)]
struct StoredCredentials {
    api_key: String,
}

/// Stores the API key under the user's config directory.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at the platform config dir, e.g. `~/.config/loadcast/credentials.json`.
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("loadcast").join("credentials.json"),
        }
    }

    /// Store at an explicit path (tests, custom setups).
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the stored key, if any. Unreadable or malformed files count as
    /// "no stored key".
    pub fn load(&self) -> Option<SecretString> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let stored: StoredCredentials = serde_json::from_str(&raw).ok()?;
        if stored.api_key.is_empty() {
            return None;
        }
        Some(SecretString::from(stored.api_key))
    }

    /// Persist the key. Failures are logged and swallowed.
    pub fn save(&self, api_key: &SecretString) {
        let stored = StoredCredentials {
            api_key: api_key.expose_secret().to_string(),
        };
        let json = match serde_json::to_string_pretty(&stored) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize credentials: {}", e);
                return;
            }
        };

        if let Some(parent) = self.path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("Failed to create credential directory: {}", e);
            return;
        }

        match fs::write(&self.path, json) {
            Ok(()) => debug!("Credential saved to {}", self.path.display()),
            Err(e) => warn!("Failed to save credential: {}", e),
        }
    }

    /// Remove the stored key. Failures are logged and swallowed.
    pub fn clear(&self) {
        if self.path.exists()
            && let Err(e) = fs::remove_file(&self.path)
        {
            warn!("Failed to remove stored credential: {}", e);
        }
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::at_path(dir.path().join("nested").join("credentials.json"));

        assert!(store.load().is_none());

        store.save(&SecretString::from("sk-test-123".to_string()));
        let loaded = store.load().unwrap();
        assert_eq!(loaded.expose_secret(), "sk-test-123");

        store.clear();
        assert!(store.load().is_none());
    }

    #[test]
    fn malformed_file_counts_as_no_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "not json").unwrap();

        let store = CredentialStore::at_path(path);
        assert!(store.load().is_none());
    }

    #[test]
    fn save_failure_is_swallowed() {
        // Parent is a file, so creating the directory must fail
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let store = CredentialStore::at_path(blocker.join("credentials.json"));
        store.save(&SecretString::from("sk-test".to_string()));
        assert!(store.load().is_none());
    }

    #[test]
    fn empty_key_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, r#"{"api_key": ""}"#).unwrap();

        let store = CredentialStore::at_path(path);
        assert!(store.load().is_none());
    }
}
