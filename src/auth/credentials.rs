//! On-disk credential store (spec §4.10 TokenStore). Grounded on the
//! teacher's JSON-persistence pattern (`io/cache/mod.rs`) plus its
//! file-permission conscientiousness, generalized to explicit 0600
//! mode-setting via `std::os::unix::fs::PermissionsExt`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::errors::{HandoverError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub provider: String,
    pub token: String,
    pub expires_at: Option<String>,
}

pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self { path: home.join(".handover").join("credentials.json") }
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Writes the record, then explicitly sets 0600 mode (the permission bit
    /// on the initial-open call is insufficient on some platforms for an
    /// existing file).
    pub fn write(&self, credential: &StoredCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| HandoverError::io("creating credentials directory", e))?;
        }

        let content = serde_json::to_string_pretty(credential)?;
        std::fs::write(&self.path, content).map_err(|e| HandoverError::io("writing credentials file", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, permissions).map_err(|e| HandoverError::io("setting credentials file mode", e))?;
        }

        Ok(())
    }

    /// Auto-deletes the file on unreadable/malformed content, returning
    /// `None` after logging a warning referencing the re-authentication
    /// command.
    pub fn read(&self) -> Option<StoredCredential> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return None,
        };

        match serde_json::from_str::<StoredCredential>(&content) {
            Ok(cred) => Some(cred),
            Err(_) => {
                warn!(path = %self.path.display(), "credentials file is corrupt; deleting it, re-run `handover auth login` to re-authenticate");
                let _ = std::fs::remove_file(&self.path);
                None
            }
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_and_sets_mode_0600() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("credentials.json"));
        let cred = StoredCredential { provider: "anthropic".to_string(), token: "sk-test".to_string(), expires_at: None };

        store.write(&cred).unwrap();
        let read_back = store.read().unwrap();
        assert_eq!(read_back.token, "sk-test");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.path()).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }

    #[test]
    fn corrupt_file_is_deleted_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();
        let store = TokenStore::at(path.clone());

        assert!(store.read().is_none());
        assert!(!path.exists());
    }
}
