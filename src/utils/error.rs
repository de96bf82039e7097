use thiserror::Error;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{entity} {id} not found")]
    NotFoundError { entity: &'static str, id: i64 },

    #[error("Integrity violation: {message}")]
    IntegrityViolation { message: String },

    #[error("Artifact store unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("Invalid use case '{value}': expected one of RFP, PROGRAM_MAPPING, INTERNAL")]
    InvalidUseCase { value: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Lookup,
    Persistence,
    ArtifactStore,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl CampaignError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFoundError { entity, id }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::IntegrityViolation {
            message: message.into(),
        }
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } | Self::InvalidUseCase { .. } => ErrorCategory::Input,
            Self::NotFoundError { .. } => ErrorCategory::Lookup,
            Self::IntegrityViolation { .. } | Self::SerializationError(_) => {
                ErrorCategory::Persistence
            }
            Self::StorageUnavailable { .. } => ErrorCategory::ArtifactStore,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Lookup => ErrorSeverity::Medium,
            ErrorCategory::Persistence | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::ArtifactStore | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// True for errors the caller can fix by re-submitting different input.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Input | ErrorCategory::Lookup
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ValidationError { .. } => "Check the required fields and submit again",
            Self::InvalidUseCase { .. } => "Choose one of RFP, PROGRAM_MAPPING or INTERNAL",
            Self::NotFoundError { .. } => "Verify the id refers to an existing record",
            Self::IntegrityViolation { .. } => {
                "The change conflicts with existing records; reload and try again"
            }
            Self::StorageUnavailable { .. } => {
                "Check artifact store connectivity and credentials, then retry the upload"
            }
            Self::IoError(_) => "Check file permissions and available disk space",
            Self::SerializationError(_) => "The database snapshot may be corrupted; restore a backup",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Review the configuration file and CLI flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::IntegrityViolation { .. } => {
                "The operation could not be saved because it conflicts with existing data"
                    .to_string()
            }
            Self::StorageUnavailable { .. } => {
                "The file could not be stored; nothing was saved".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CampaignError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_recoverable() {
        assert!(CampaignError::validation("Campaign name is required").is_recoverable());
        assert!(CampaignError::not_found("Program", 7).is_recoverable());
        assert!(!CampaignError::storage_unavailable("timeout").is_recoverable());
        assert!(!CampaignError::integrity("duplicate key").is_recoverable());
    }

    #[test]
    fn test_storage_errors_are_critical() {
        let err = CampaignError::storage_unavailable("connection refused");
        assert_eq!(err.category(), ErrorCategory::ArtifactStore);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("nothing was saved"));
    }

    #[test]
    fn test_not_found_message_names_entity() {
        let err = CampaignError::not_found("Contract", 42);
        assert_eq!(err.to_string(), "Contract 42 not found");
    }
}
