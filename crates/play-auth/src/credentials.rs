//! Credential storage for the renewable Play credential
//!
//! A single JSON record at a fixed per-operator path. All writes use atomic
//! temp-file + rename so a concurrent reader never observes a partial write.
//! Absence or corruption reads as "not yet authorized", so callers get a
//! plain two-state branch instead of a parse error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Directory under the operator's home holding workspace state.
pub const CONFIG_DIR_NAME: &str = ".app-publish";

/// Credential file name inside [`CONFIG_DIR_NAME`].
pub const CREDENTIAL_FILE_NAME: &str = "google.json";

/// The renewable credential produced by the interactive flow.
///
/// The triple is immutable once saved; only a subsequent successful flow run
/// replaces it. `saved_at` records when consent was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub saved_at: DateTime<Utc>,
}

/// File-backed store for the single renewable credential.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store at an explicit path (tests, alternate roots).
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the fixed per-operator location, `~/.app-publish/google.json`.
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Io("home directory not resolvable".into()))?;
        Ok(Self::new(home.join(CONFIG_DIR_NAME).join(CREDENTIAL_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored credential, or `None` if the operator has not
    /// authorized yet.
    ///
    /// Fails soft: a missing file and a malformed file both read as `None`,
    /// so the only caller-visible states are configured / not configured.
    pub async fn load(&self) -> Option<Credential> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no stored credential");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "stored credential is malformed, treating as unauthorized"
                );
                None
            }
        }
    }

    /// Persist a credential, replacing any prior value.
    ///
    /// Creates the configuration directory if absent, writes a temp file
    /// (0600 on unix), then renames it over the target.
    pub async fn save(&self, credential: &Credential) -> Result<()> {
        let json = serde_json::to_string_pretty(credential)
            .map_err(|e| Error::CredentialParse(format!("serializing credential: {e}")))?;

        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| Error::Io(format!("creating {}: {e}", dir.display())))?;

        let tmp_path = dir.join(format!(".google.json.tmp.{}", std::process::id()));
        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

        // 0600: the file holds a long-lived refresh token (unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, perms)
                .await
                .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
        }

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

        info!(path = %self.path.display(), "persisted renewable credential");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credential() -> Credential {
        Credential {
            client_id: "cid.apps.example".into(),
            client_secret: "GOCSPX-secret".into(),
            refresh_token: "1//rt_value".into(),
            saved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_then_load_roundtrips_deeply_equal() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("google.json"));

        let credential = test_credential();
        store.save(&credential).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, credential);
    }

    #[tokio::test]
    async fn load_on_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("google.json"));
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn load_on_corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("google.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = CredentialStore::new(path);
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn save_creates_config_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            CredentialStore::new(dir.path().join(CONFIG_DIR_NAME).join(CREDENTIAL_FILE_NAME));

        store.save(&test_credential()).await.unwrap();
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn save_overwrites_prior_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("google.json"));

        store.save(&test_credential()).await.unwrap();

        let mut replacement = test_credential();
        replacement.refresh_token = "1//rt_newer".into();
        store.save(&replacement).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.refresh_token, "1//rt_newer");
    }

    #[tokio::test]
    async fn file_uses_camel_case_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("google.json"));
        store.save(&test_credential()).await.unwrap();

        let raw = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(raw.contains("\"clientId\""), "got: {raw}");
        assert!(raw.contains("\"clientSecret\""));
        assert!(raw.contains("\"refreshToken\""));
        assert!(raw.contains("\"savedAt\""));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("google.json"));
        store.save(&test_credential()).await.unwrap();

        let metadata = tokio::fs::metadata(store.path()).await.unwrap();
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "credential file must be 0600, got {mode:o}");
    }
}
