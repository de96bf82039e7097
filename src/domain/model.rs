use crate::utils::error::CampaignError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PROGRAM_STATUS: &str = "DRAFT";
pub const DEFAULT_PLACEMENT_STATUS: &str = "PLANNED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub pharma: String,
    pub brand: String,
    pub agency: Option<String>,
    pub indication: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    pub contract_uid: String,
    pub name: String,
    pub client_id: i64,
    pub flight_start: Option<NaiveDate>,
    pub flight_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: i64,
    pub contract_id: i64,
    pub name: String,
    pub notes: Option<String>,
}

/// `status` is an open label; any string is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub campaign_id: i64,
    pub name: String,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: i64,
    pub name: String,
    pub channel: Option<String>,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UseCase {
    Rfp,
    ProgramMapping,
    Internal,
}

impl UseCase {
    pub const ALL: [UseCase; 3] = [UseCase::Rfp, UseCase::ProgramMapping, UseCase::Internal];

    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::Rfp => "RFP",
            UseCase::ProgramMapping => "PROGRAM_MAPPING",
            UseCase::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UseCase {
    type Err = CampaignError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        UseCase::ALL
            .into_iter()
            .find(|use_case| use_case.as_str() == value)
            .ok_or_else(|| CampaignError::InvalidUseCase {
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetList {
    pub id: i64,
    pub list_uid: String,
    pub title: String,
    pub use_case: UseCase,
    pub storage_key: String,
    pub file_ext: Option<String>,
    pub uploaded_by: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// A timestamped attachment event. Repeated attachments of the same pair are
/// kept as separate rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramTargetList {
    pub id: i64,
    pub program_id: i64,
    pub target_list_id: i64,
    pub assigned_at: DateTime<Utc>,
}

// Insert rows. Required columns are Option so that a missing value surfaces as
// a NOT NULL failure from the store rather than a panic in the caller.

#[derive(Debug, Clone, Default)]
pub struct NewClient {
    pub pharma: Option<String>,
    pub brand: Option<String>,
    pub agency: Option<String>,
    pub indication: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewContract {
    pub contract_uid: String,
    pub name: Option<String>,
    pub client_id: i64,
    pub flight_start: Option<NaiveDate>,
    pub flight_end: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct ContractChanges {
    pub name: String,
    pub client_id: i64,
    pub flight_start: Option<NaiveDate>,
    pub flight_end: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub contract_id: i64,
    pub name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProgram {
    pub campaign_id: i64,
    pub name: Option<String>,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPlacement {
    pub name: Option<String>,
    pub channel: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct NewTargetList {
    pub list_uid: String,
    pub title: String,
    pub use_case: UseCase,
    pub storage_key: String,
    pub file_ext: Option<String>,
    pub uploaded_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_case_parses_closed_set() {
        assert_eq!("RFP".parse::<UseCase>().unwrap(), UseCase::Rfp);
        assert_eq!(
            "PROGRAM_MAPPING".parse::<UseCase>().unwrap(),
            UseCase::ProgramMapping
        );
        assert_eq!("INTERNAL".parse::<UseCase>().unwrap(), UseCase::Internal);
    }

    #[test]
    fn test_use_case_rejects_unknown_and_lowercase() {
        assert!(matches!(
            "BOGUS".parse::<UseCase>(),
            Err(CampaignError::InvalidUseCase { .. })
        ));
        assert!("rfp".parse::<UseCase>().is_err());
    }

    #[test]
    fn test_use_case_serializes_as_wire_name() {
        let json = serde_json::to_string(&UseCase::ProgramMapping).unwrap();
        assert_eq!(json, "\"PROGRAM_MAPPING\"");
    }
}
