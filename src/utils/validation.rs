use crate::utils::error::{CampaignError, Result};
use chrono::NaiveDate;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CampaignError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| CampaignError::MissingConfigError {
            field: field_name.to_string(),
        })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CampaignError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

// Form field parsing. These produce ValidationError, never config errors.

/// Parses a submitted integer id. Absent, blank and non-integer values are rejected.
pub fn parse_id(field_name: &str, raw: Option<&str>) -> Result<i64> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(CampaignError::validation(format!("{} is required", field_name)));
    }
    raw.parse::<i64>().map_err(|_| {
        CampaignError::validation(format!("{} must be an integer, got '{}'", field_name, raw))
    })
}

/// Blank and absent dates both mean "no date".
pub fn parse_optional_date(field_name: &str, raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                CampaignError::validation(format!(
                    "{} must be an ISO date (YYYY-MM-DD), got '{}'",
                    field_name, value
                ))
            }),
    }
}

/// Returns the trimmed value, or None when it is absent or whitespace-only.
pub fn trimmed_non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("endpoint_url", "https://s3.example.com").is_ok());
        assert!(validate_url("endpoint_url", "http://localhost:9000").is_ok());
        assert!(validate_url("endpoint_url", "").is_err());
        assert!(validate_url("endpoint_url", "invalid-url").is_err());
        assert!(validate_url("endpoint_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("timeout_seconds", 5, 1).is_ok());
        assert!(validate_positive_number("timeout_seconds", 0, 1).is_err());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("client_id", Some(" 12 ")).unwrap(), 12);
        assert!(matches!(
            parse_id("client_id", None),
            Err(CampaignError::ValidationError { .. })
        ));
        assert!(matches!(
            parse_id("client_id", Some("")),
            Err(CampaignError::ValidationError { .. })
        ));
        assert!(matches!(
            parse_id("client_id", Some("abc")),
            Err(CampaignError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_parse_optional_date() {
        assert_eq!(parse_optional_date("flight_start", None).unwrap(), None);
        assert_eq!(parse_optional_date("flight_start", Some("")).unwrap(), None);
        assert_eq!(
            parse_optional_date("flight_start", Some("2024-01-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert!(parse_optional_date("flight_start", Some("01/02/2024")).is_err());
    }

    #[test]
    fn test_trimmed_non_empty() {
        assert_eq!(trimmed_non_empty(Some("  Spring ")), Some("Spring".to_string()));
        assert_eq!(trimmed_non_empty(Some("   ")), None);
        assert_eq!(trimmed_non_empty(None), None);
    }
}
