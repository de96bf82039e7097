use crate::domain::ports::ConfigProvider;
use crate::utils::error::{CampaignError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_required_field, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// S3 refuses presigned URLs valid for longer than seven days.
const MAX_PRESIGN_EXPIRY_SECONDS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub artifact_store: ArtifactStoreConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// JSON snapshot file. Omit for a purely in-memory graph.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Local,
    S3,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ArtifactStoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_local_root")]
    pub local_root: String,
    pub bucket: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack).
    pub endpoint_url: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_presign_expiry_seconds")]
    pub presign_expiry_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_uploaded_by")]
    pub uploaded_by: String,
}

fn default_prefix() -> String {
    "target-lists/".to_string()
}

fn default_local_root() -> String {
    "./artifacts".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_presign_expiry_seconds() -> u64 {
    3600
}

fn default_max_bytes() -> u64 {
    100 * 1024 * 1024
}

fn default_uploaded_by() -> String {
    "system".to_string()
}

/// Credentials are masked so verbose config dumps never leak them.
impl fmt::Debug for ArtifactStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStoreConfig")
            .field("backend", &self.backend)
            .field("prefix", &self.prefix)
            .field("local_root", &self.local_root)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &masked(&self.access_key_id))
            .field("secret_access_key", &masked(&self.secret_access_key))
            .field("endpoint_url", &self.endpoint_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("presign_expiry_seconds", &self.presign_expiry_seconds)
            .finish()
    }
}

fn masked(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "***")
}

impl Default for ArtifactStoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            prefix: default_prefix(),
            local_root: default_local_root(),
            bucket: None,
            region: default_region(),
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: None,
            timeout_seconds: default_timeout_seconds(),
            presign_expiry_seconds: default_presign_expiry_seconds(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            uploaded_by: default_uploaded_by(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CampaignError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CampaignError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AWS_SECRET_ACCESS_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CampaignError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(path) = &self.database.path {
            validate_path("database.path", path)?;
        }

        let store = &self.artifact_store;
        if store.prefix.starts_with('/') {
            return Err(CampaignError::InvalidConfigValueError {
                field: "artifact_store.prefix".to_string(),
                value: store.prefix.clone(),
                reason: "Key prefix must not start with '/'".to_string(),
            });
        }
        validate_range("artifact_store.timeout_seconds", store.timeout_seconds, 1, 600)?;
        validate_range(
            "artifact_store.presign_expiry_seconds",
            store.presign_expiry_seconds,
            1,
            MAX_PRESIGN_EXPIRY_SECONDS,
        )?;

        match store.backend {
            StoreBackend::Local => validate_path("artifact_store.local_root", &store.local_root)?,
            StoreBackend::S3 => {
                let bucket = validate_required_field("artifact_store.bucket", &store.bucket)?;
                validate_s3_bucket_name("artifact_store.bucket", bucket)?;
                validate_aws_region("artifact_store.region", &store.region)?;
                if store.access_key_id.is_some() != store.secret_access_key.is_some() {
                    return Err(CampaignError::ConfigValidationError {
                        field: "artifact_store.access_key_id".to_string(),
                        message: "access_key_id and secret_access_key must be set together"
                            .to_string(),
                    });
                }
                if let Some(endpoint) = &store.endpoint_url {
                    validate_url("artifact_store.endpoint_url", endpoint)?;
                }
            }
        }

        validate_positive_number("upload.max_bytes", self.upload.max_bytes, 1)?;
        validate_non_empty_string("upload.uploaded_by", &self.upload.uploaded_by)?;

        Ok(())
    }
}

fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name must be between 3 and 63 characters".to_string(),
        });
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots"
                .to_string(),
        });
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name cannot start or end with a hyphen".to_string(),
        });
    }

    Ok(())
}

fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

impl ConfigProvider for AppConfig {
    fn database_path(&self) -> Option<&str> {
        self.database.path.as_deref()
    }

    fn max_upload_bytes(&self) -> u64 {
        self.upload.max_bytes
    }

    fn default_uploaded_by(&self) -> &str {
        &self.upload.uploaded_by
    }

    fn presign_expiry_seconds(&self) -> u64 {
        self.artifact_store.presign_expiry_seconds
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();

        assert_eq!(config.database.path, None);
        assert_eq!(config.artifact_store.backend, StoreBackend::Local);
        assert_eq!(config.artifact_store.prefix, "target-lists/");
        assert_eq!(config.artifact_store.region, "us-east-1");
        assert_eq!(config.upload.max_bytes, 100 * 1024 * 1024);
        assert_eq!(config.default_uploaded_by(), "system");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_s3_config() {
        let toml_content = r#"
[database]
path = "./data/campaigns.json"

[artifact_store]
backend = "s3"
bucket = "pharma-target-lists"
region = "eu-west-1"
prefix = "uploads/"
timeout_seconds = 10

[upload]
max_bytes = 1048576
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.database_path(), Some("./data/campaigns.json"));
        assert_eq!(config.artifact_store.backend, StoreBackend::S3);
        assert_eq!(config.artifact_store.bucket.as_deref(), Some("pharma-target-lists"));
        assert_eq!(config.artifact_store.timeout_seconds, 10);
        assert_eq!(config.max_upload_bytes(), 1_048_576);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CAMPAIGN_GRAPH_TEST_BUCKET", "substituted-bucket");

        let toml_content = r#"
[artifact_store]
backend = "s3"
bucket = "${CAMPAIGN_GRAPH_TEST_BUCKET}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.artifact_store.bucket.as_deref(),
            Some("substituted-bucket")
        );

        std::env::remove_var("CAMPAIGN_GRAPH_TEST_BUCKET");
    }

    #[test]
    fn test_s3_backend_requires_bucket() {
        let config = AppConfig::from_toml_str("[artifact_store]\nbackend = \"s3\"\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(CampaignError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_bucket_and_half_credentials() {
        let bad_bucket = AppConfig::from_toml_str(
            "[artifact_store]\nbackend = \"s3\"\nbucket = \"Bad_Bucket\"\n",
        )
        .unwrap();
        assert!(bad_bucket.validate().is_err());

        let half_credentials = AppConfig::from_toml_str(
            "[artifact_store]\nbackend = \"s3\"\nbucket = \"lists\"\naccess_key_id = \"AKIA\"\n",
        )
        .unwrap();
        assert!(half_credentials.validate().is_err());
    }

    #[test]
    fn test_rejects_absolute_prefix_and_long_expiry() {
        let config =
            AppConfig::from_toml_str("[artifact_store]\nprefix = \"/lists/\"\n").unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str(
            "[artifact_store]\npresign_expiry_seconds = 999999999\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[upload]\nuploaded_by = \"ops-team\"\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.default_uploaded_by(), "ops-team");
    }

    #[test]
    fn test_debug_output_masks_credentials() {
        let config = AppConfig::from_toml_str(
            r#"
[artifact_store]
backend = "s3"
bucket = "campaign-lists"
access_key_id = "AKIAEXAMPLEKEY"
secret_access_key = "wJalrXUtnFEMI/K7MDENG"
"#,
        )
        .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("AKIAEXAMPLEKEY"));
        assert!(!rendered.contains("wJalrXUtnFEMI/K7MDENG"));
        assert!(rendered.contains("campaign-lists"));
        assert!(rendered.contains("***"));
    }
}
