//! JSON file credential store.
//!
//! Every save writes its own uniquely named temp file next to the target and
//! renames it into place, so neither a crash nor two concurrent saves can
//! leave a truncated or interleaved token file behind. Temp files are created
//! with mode `0600` on Unix.

use async_trait::async_trait;
use calmcp_application::ports::credential_store::{CredentialStore, CredentialStoreError};
use calmcp_domain::Credential;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Credential store backed by a single JSON file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, e: std::io::Error) -> CredentialStoreError {
        CredentialStoreError::Write(format!("{}: {}", self.path.display(), e))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No credential file");
                return Ok(None);
            }
            Err(e) => {
                return Err(CredentialStoreError::Read(format!(
                    "{}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| CredentialStoreError::Malformed(format!("{}: {}", self.path.display(), e)))
    }

    async fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let json = serde_json::to_vec_pretty(credential)
            .map_err(|e| CredentialStoreError::Write(e.to_string()))?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, &json))
            .await
            .map_err(|e| CredentialStoreError::Write(e.to_string()))?
            .map_err(|e| self.write_error(e))?;

        debug!(path = %self.path.display(), "Credential written");
        Ok(())
    }
}

/// Write `contents` to a fresh temp file in the target's directory, then
/// rename it over `path`.
fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "token.json".to_string())
    );
    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calmcp_domain::CALENDAR_SCOPE;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn credential() -> Credential {
        Credential::new("access", Utc::now() + Duration::hours(1))
            .with_refresh_token("refresh")
            .with_scopes([CALENDAR_SCOPE])
    }

    #[tokio::test]
    async fn test_missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("token.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("token.json"));

        let saved = credential();
        store.save(&saved).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded, saved);
        assert_eq!(dir_entries(&dir.path().join("nested")), vec!["token.json"]);
    }

    #[tokio::test]
    async fn test_save_replaces_previous_credential() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("token.json"));

        store.save(&credential()).await.unwrap();
        let mut newer = credential();
        newer.access_token = "newer".to_string();
        store.save(&newer).await.unwrap();

        assert_eq!(store.load().await.unwrap().unwrap().access_token, "newer");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_leave_one_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileCredentialStore::new(dir.path().join("token.json")));

        let tokens: Vec<String> = (0..16).map(|i| format!("access-{}-{}", i, "x".repeat(i * 64))).collect();
        let saves: Vec<_> = tokens
            .iter()
            .map(|token| {
                let store = Arc::clone(&store);
                let mut cred = credential();
                cred.access_token = token.clone();
                tokio::spawn(async move { store.save(&cred).await })
            })
            .collect();
        for save in saves {
            save.await.unwrap().unwrap();
        }

        let loaded = store.load().await.unwrap().unwrap();
        assert!(tokens.contains(&loaded.access_token));
        assert_eq!(dir_entries(dir.path()), vec!["token.json"]);
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileCredentialStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, CredentialStoreError::Malformed(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("token.json"));
        store.save(&credential()).await.unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
