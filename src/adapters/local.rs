use crate::core::artifact::storage_key;
use crate::domain::ports::ArtifactStore;
use crate::utils::error::{CampaignError, Result};
use chrono::Utc;
use std::path::PathBuf;
use url::Url;

/// Filesystem-backed artifact store for development and single-host installs.
///
/// "Presigned" URLs are `file://` URLs carrying an `expires` unix timestamp;
/// whoever serves them is expected to enforce it.
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
    prefix: String,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, data: Vec<u8>, logical_name: &str) -> Result<String> {
        let key = storage_key(&self.prefix, logical_name);
        let full_path = self.path_for(&key);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CampaignError::storage_unavailable(format!(
                    "cannot create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(&full_path, &data).await.map_err(|e| {
            CampaignError::storage_unavailable(format!(
                "cannot write {}: {}",
                full_path.display(),
                e
            ))
        })?;

        tracing::debug!("Stored {} bytes at {}", data.len(), full_path.display());
        Ok(key)
    }

    async fn presign(&self, key: &str, expiry_seconds: u64) -> Result<String> {
        let full_path = std::path::absolute(self.path_for(key))?;
        let mut url = Url::from_file_path(&full_path).map_err(|_| {
            CampaignError::storage_unavailable(format!(
                "cannot build a file URL for {}",
                full_path.display()
            ))
        })?;

        let expires_at = Utc::now().timestamp().saturating_add_unsigned(expiry_seconds);
        url.query_pairs_mut()
            .append_pair("expires", &expires_at.to_string());
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "target-lists/");

        let key = store.put(b"npi\n123".to_vec(), "Doctors.CSV").await.unwrap();

        assert!(key.starts_with("target-lists/"));
        assert!(key.ends_with(".csv"));
        let stored = std::fs::read(store.path_for(&key)).unwrap();
        assert_eq!(stored, b"npi\n123");
    }

    #[tokio::test]
    async fn test_identical_uploads_get_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "");

        let first = store.put(b"same".to_vec(), "list.csv").await.unwrap();
        let second = store.put(b"same".to_vec(), "list.csv").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_presign_does_not_check_existence() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path(), "");

        let url = store.presign("missing/key.csv", 60).await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.contains("missing/key.csv"));
        assert!(url.contains("expires="));
    }
}
