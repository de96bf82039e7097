// Adapters layer: concrete artifact store backends (local, s3).

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use crate::config::toml_config::{ArtifactStoreConfig, StoreBackend};
use crate::domain::ports::ArtifactStore;
use crate::utils::error::Result;

pub use local::LocalArtifactStore;
#[cfg(feature = "s3")]
pub use s3::S3ArtifactStore;

/// Backend chosen at start-up from `[artifact_store] backend`.
#[derive(Debug, Clone)]
pub enum ConfiguredArtifactStore {
    Local(LocalArtifactStore),
    #[cfg(feature = "s3")]
    S3(S3ArtifactStore),
}

impl ConfiguredArtifactStore {
    pub async fn from_config(config: &ArtifactStoreConfig) -> Result<Self> {
        match config.backend {
            StoreBackend::Local => Ok(Self::Local(LocalArtifactStore::new(
                &config.local_root,
                config.prefix.clone(),
            ))),
            #[cfg(feature = "s3")]
            StoreBackend::S3 => Ok(Self::S3(S3ArtifactStore::from_config(config).await?)),
            #[cfg(not(feature = "s3"))]
            StoreBackend::S3 => Err(crate::utils::error::CampaignError::ConfigError {
                message: "artifact_store.backend = \"s3\" requires building with the `s3` feature"
                    .to_string(),
            }),
        }
    }
}

impl ArtifactStore for ConfiguredArtifactStore {
    async fn put(&self, data: Vec<u8>, logical_name: &str) -> Result<String> {
        match self {
            Self::Local(store) => store.put(data, logical_name).await,
            #[cfg(feature = "s3")]
            Self::S3(store) => store.put(data, logical_name).await,
        }
    }

    async fn presign(&self, key: &str, expiry_seconds: u64) -> Result<String> {
        match self {
            Self::Local(store) => store.presign(key, expiry_seconds).await,
            #[cfg(feature = "s3")]
            Self::S3(store) => store.presign(key, expiry_seconds).await,
        }
    }
}
