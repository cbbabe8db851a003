//! Session-scoped identity persistence.

use std::{
    fmt,
    fs,
    path::PathBuf,
    sync::Mutex,
};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;

/// Fixed key the identity is stored under.
pub const IDENTITY_KEY: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    Google,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::GitHub => f.write_str("github"),
            Provider::Google => f.write_str("google"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub provider_subject_id: String,
    pub provider: Provider,
}

/// Where the signed-in identity lives for the duration of a session.
pub trait SessionStore: Send + Sync {
    fn get_identity(&self) -> Option<Identity>;
    fn set_identity(&self, identity: Identity) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Stores the identity as JSON in a session directory, one file per key.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    storage_path: PathBuf,
}

impl FileSessionStore {
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.session_path())
    }

    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        let storage_path = storage_path.into();
        let _ = fs::create_dir_all(&storage_path);
        Self { storage_path }
    }

    fn file_path(&self) -> PathBuf {
        self.storage_path.join(IDENTITY_KEY)
    }
}

impl SessionStore for FileSessionStore {
    fn get_identity(&self) -> Option<Identity> {
        let p = self.file_path();
        let text = fs::read_to_string(&p).ok()?;
        match serde_json::from_str(&text) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!(path = %p.display(), error = %e, "ignoring unreadable session identity");
                None
            }
        }
    }

    fn set_identity(&self, identity: Identity) -> Result<()> {
        fs::create_dir_all(&self.storage_path)?;
        fs::write(self.file_path(), serde_json::to_string(&identity)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let p = self.file_path();
        if p.exists() {
            fs::remove_file(p)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    identity: Mutex<Option<Identity>>,
}

impl SessionStore for MemorySessionStore {
    fn get_identity(&self) -> Option<Identity> {
        self.identity.lock().ok().and_then(|guard| guard.clone())
    }

    fn set_identity(&self, identity: Identity) -> Result<()> {
        let mut guard = self
            .identity
            .lock()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        *guard = Some(identity);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .identity
            .lock()
            .map_err(|_| anyhow::anyhow!("session store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_identity() -> Identity {
    Identity {
        display_name: "Ada Lovelace".into(),
        avatar_url: Some("https://avatars.example.com/u/1".into()),
        provider_subject_id: "1815".into(),
        provider: Provider::GitHub,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(store: &dyn SessionStore) {
        assert_eq!(store.get_identity(), None);
        store.set_identity(sample_identity()).unwrap();
        assert_eq!(store.get_identity(), Some(sample_identity()));
        store.clear().unwrap();
        assert_eq!(store.get_identity(), None);
    }

    #[test]
    fn test_memory_store_round_trip() {
        round_trip(&MemorySessionStore::default());
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        round_trip(&FileSessionStore::new(dir.path().join("session")));
    }

    #[test]
    fn test_file_store_survives_new_handle() {
        let dir = tempfile::tempdir().unwrap();
        FileSessionStore::new(dir.path()).set_identity(sample_identity()).unwrap();

        let reopened = FileSessionStore::new(dir.path());
        assert_eq!(reopened.get_identity(), Some(sample_identity()));
        assert!(dir.path().join(IDENTITY_KEY).exists());
    }

    #[test]
    fn test_file_store_corrupt_entry_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(IDENTITY_KEY), "{not json").unwrap();
        assert_eq!(FileSessionStore::new(dir.path()).get_identity(), None);
    }

    #[test]
    fn test_clear_without_identity_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileSessionStore::new(dir.path()).clear().is_ok());
    }
}
