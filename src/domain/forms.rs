//! Submitted inputs for the workflow operations.
//!
//! Fields stay as the primitive strings a form or CLI hands over; parsing and
//! validation happen inside the workflows so every caller gets the same errors.

use crate::utils::error::{CampaignError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientForm {
    pub pharma: Option<String>,
    pub brand: Option<String>,
    pub agency: Option<String>,
    pub indication: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractForm {
    pub name: Option<String>,
    pub client_id: Option<String>,
    pub flight_start: Option<String>,
    pub flight_end: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignForm {
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramForm {
    pub name: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementForm {
    pub name: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Reads a file from disk, refusing anything larger than `max_bytes`
    /// before its content is loaded.
    pub async fn from_path(path: impl AsRef<Path>, max_bytes: u64) -> Result<Self> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len();
        if size > max_bytes {
            return Err(CampaignError::validation(format!(
                "File exceeds the maximum upload size of {} bytes",
                max_bytes
            )));
        }

        let content = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(filename, content))
    }

    /// Text after the last `.`, lowercased. None when the name has no dot.
    pub fn file_ext(&self) -> Option<String> {
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub title: Option<String>,
    pub use_case: Option<String>,
    pub client_ids: Vec<String>,
    pub file: Option<UploadedFile>,
    pub uploaded_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_ext_is_lowercased_last_segment() {
        assert_eq!(
            UploadedFile::new("Q1 List.CSV", Vec::new()).file_ext(),
            Some("csv".to_string())
        );
        assert_eq!(
            UploadedFile::new("export.tar.GZ", Vec::new()).file_ext(),
            Some("gz".to_string())
        );
        assert_eq!(UploadedFile::new("README", Vec::new()).file_ext(), None);
    }

    #[tokio::test]
    async fn test_from_path_checks_size_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Doctors.CSV");
        std::fs::write(&path, b"npi\n1234567890\n").unwrap();

        let file = UploadedFile::from_path(&path, 1024).await.unwrap();
        assert_eq!(file.filename, "Doctors.CSV");
        assert_eq!(file.content, b"npi\n1234567890\n");

        let too_big = UploadedFile::from_path(&path, 4).await;
        assert!(matches!(
            too_big,
            Err(CampaignError::ValidationError { .. })
        ));

        let missing = UploadedFile::from_path(dir.path().join("absent.csv"), 1024).await;
        assert!(matches!(missing, Err(CampaignError::IoError(_))));
    }
}
