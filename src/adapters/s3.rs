use crate::config::toml_config::ArtifactStoreConfig;
use crate::core::artifact::storage_key;
use crate::domain::ports::ArtifactStore;
use crate::utils::error::{CampaignError, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;

/// Every call is bounded by `timeout`; an expired call is reported as
/// `StorageUnavailable` and never falls back to another backend.
#[derive(Debug, Clone)]
pub struct S3ArtifactStore {
    client: S3Client,
    bucket: String,
    prefix: String,
    timeout: Duration,
}

impl S3ArtifactStore {
    pub fn new(client: S3Client, bucket: String, prefix: String, timeout: Duration) -> Self {
        Self {
            client,
            bucket,
            prefix,
            timeout,
        }
    }

    pub async fn from_config(config: &ArtifactStoreConfig) -> Result<Self> {
        let bucket = config
            .bucket
            .clone()
            .ok_or_else(|| CampaignError::MissingConfigError {
                field: "artifact_store.bucket".to_string(),
            })?;

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            builder = builder.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "campaign-graph-config",
            ));
        }
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        tracing::debug!(
            "S3 artifact store: bucket={}, region={}, prefix={}",
            bucket,
            config.region,
            config.prefix
        );

        Ok(Self::new(
            S3Client::from_conf(builder.build()),
            bucket,
            config.prefix.clone(),
            Duration::from_secs(config.timeout_seconds),
        ))
    }
}

impl ArtifactStore for S3ArtifactStore {
    async fn put(&self, data: Vec<u8>, logical_name: &str) -> Result<String> {
        let key = storage_key(&self.prefix, logical_name);
        let size = data.len();

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .send();

        match tokio::time::timeout(self.timeout, request).await {
            Err(_) => Err(CampaignError::storage_unavailable(format!(
                "put s3://{}/{} timed out after {:?}",
                self.bucket, key, self.timeout
            ))),
            Ok(Err(err)) => Err(CampaignError::storage_unavailable(format!(
                "put s3://{}/{} failed: {}",
                self.bucket,
                key,
                DisplayErrorContext(&err)
            ))),
            Ok(Ok(_)) => {
                tracing::debug!("Uploaded {} bytes to s3://{}/{}", size, self.bucket, key);
                Ok(key)
            }
        }
    }

    async fn presign(&self, key: &str, expiry_seconds: u64) -> Result<String> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expiry_seconds))
            .map_err(|e| {
                CampaignError::storage_unavailable(format!("invalid presign expiry: {}", e))
            })?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning);

        match tokio::time::timeout(self.timeout, request).await {
            Err(_) => Err(CampaignError::storage_unavailable(format!(
                "presign s3://{}/{} timed out after {:?}",
                self.bucket, key, self.timeout
            ))),
            Ok(Err(err)) => Err(CampaignError::storage_unavailable(format!(
                "presign s3://{}/{} failed: {}",
                self.bucket,
                key,
                DisplayErrorContext(&err)
            ))),
            Ok(Ok(presigned)) => Ok(presigned.uri().to_string()),
        }
    }
}
