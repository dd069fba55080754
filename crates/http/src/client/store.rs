//! Credential persistence
//!
//! Every read and write of the session credentials goes through a
//! [`CredentialStore`], injected into the [`ApiClient`](super::ApiClient).
//! The two keys are only ever cleared together.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tokio::sync::RwLock;

#[cfg(not(target_arch = "wasm32"))]
pub use self::file::FileCredentialStore;

/// Credential persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed credential file: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Keys held by a credential store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    /// Short-lived bearer credential
    Access,
    /// Credential used only to mint a new access credential
    Refresh,
}

impl CredentialKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value store for session credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read a credential
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError>;

    /// Write a credential, replacing any previous value
    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError>;

    /// Remove every stored credential
    async fn clear(&self) -> Result<(), StoreError>;
}

/// In-process credential store
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<CredentialKey, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a session
    pub fn with_credentials(access: Option<&str>, refresh: Option<&str>) -> Self {
        let mut entries = HashMap::new();
        if let Some(access) = access {
            entries.insert(CredentialKey::Access, access.to_string());
        }
        if let Some(refresh) = refresh {
            entries.insert(CredentialKey::Refresh, refresh.to_string());
        }
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
        self.entries.write().await.insert(key, value.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::{CredentialKey, CredentialStore, StoreError};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};
    use tokio::sync::Mutex;

    /// File name used inside a state directory
    pub const CREDENTIALS_FILE: &str = "credentials.json";

    /// Credential store persisted as a JSON object on disk.
    ///
    /// Survives process restarts. Writes go through a temporary file and a
    /// rename, and the file is readable by its owner only on Unix.
    #[derive(Debug)]
    pub struct FileCredentialStore {
        path: PathBuf,
        lock: Mutex<()>,
    }

    impl FileCredentialStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                lock: Mutex::new(()),
            }
        }

        /// Store at `<state_dir>/credentials.json`
        pub fn in_dir(state_dir: impl AsRef<Path>) -> Self {
            Self::new(state_dir.as_ref().join(CREDENTIALS_FILE))
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        async fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
            match tokio::fs::read(&self.path).await {
                Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
                Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
                Err(e) => Err(e.into()),
            }
        }

        async fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
            if let Some(parent) = self.path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let tmp_path = self.path.with_extension("json.tmp");
            tokio::fs::write(&tmp_path, serde_json::to_vec_pretty(entries)?).await?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
                    .await?;
            }

            tokio::fs::rename(&tmp_path, &self.path).await?;
            Ok(())
        }
    }

    #[async_trait]
    impl CredentialStore for FileCredentialStore {
        async fn get(&self, key: CredentialKey) -> Result<Option<String>, StoreError> {
            let _guard = self.lock.lock().await;
            Ok(self.load().await?.remove(key.as_str()))
        }

        async fn set(&self, key: CredentialKey, value: &str) -> Result<(), StoreError> {
            let _guard = self.lock.lock().await;
            let mut entries = self.load().await?;
            entries.insert(key.as_str().to_string(), value.to_string());
            self.save(&entries).await
        }

        async fn clear(&self) -> Result<(), StoreError> {
            let _guard = self.lock.lock().await;
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip_and_clear() {
        let store = MemoryCredentialStore::with_credentials(Some("A1"), Some("R1"));
        assert_eq!(
            store.get(CredentialKey::Access).await.unwrap().as_deref(),
            Some("A1")
        );

        store.set(CredentialKey::Access, "A2").await.unwrap();
        assert_eq!(
            store.get(CredentialKey::Access).await.unwrap().as_deref(),
            Some("A2")
        );
        assert_eq!(
            store.get(CredentialKey::Refresh).await.unwrap().as_deref(),
            Some("R1")
        );

        store.clear().await.unwrap();
        assert!(store.get(CredentialKey::Access).await.unwrap().is_none());
        assert!(store.get(CredentialKey::Refresh).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_dir(dir.path().join("nested"));
        assert!(store.get(CredentialKey::Access).await.unwrap().is_none());

        store.set(CredentialKey::Access, "A1").await.unwrap();
        store.set(CredentialKey::Refresh, "R1").await.unwrap();

        let reopened = FileCredentialStore::in_dir(dir.path().join("nested"));
        assert_eq!(
            reopened.get(CredentialKey::Access).await.unwrap().as_deref(),
            Some("A1")
        );
        assert_eq!(
            reopened.get(CredentialKey::Refresh).await.unwrap().as_deref(),
            Some("R1")
        );

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(reopened.path()).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({ "access": "A1", "refresh": "R1" }));
    }

    #[tokio::test]
    async fn test_file_store_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        store.set(CredentialKey::Access, "A1").await.unwrap();
        assert!(store.path().exists());

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        // Clearing an empty store is not an error
        store.clear().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        store.set(CredentialKey::Refresh, "R1").await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_file_store_reports_malformed_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::in_dir(dir.path());
        std::fs::write(store.path(), b"not json").unwrap();

        assert!(matches!(
            store.get(CredentialKey::Access).await,
            Err(StoreError::Serialization(_))
        ));
    }
}
