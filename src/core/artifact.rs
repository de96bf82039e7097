use std::path::Path;
use uuid::Uuid;

/// Builds `prefix + random token + lowercased extension` (extension keeps its dot).
///
/// The token is random, not a content hash, so identical uploads get distinct keys.
pub fn storage_key(prefix: &str, logical_name: &str) -> String {
    let ext = Path::new(logical_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .unwrap_or_default();
    format!("{}{}{}", prefix, Uuid::new_v4().simple(), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_keeps_prefix_and_lowercased_extension() {
        let key = storage_key("target-lists/", "Q1 List.XLSX");
        assert!(key.starts_with("target-lists/"));
        assert!(key.ends_with(".xlsx"));
        assert_eq!(key.len(), "target-lists/".len() + 32 + ".xlsx".len());
    }

    #[test]
    fn test_key_without_extension() {
        let key = storage_key("", "README");
        assert_eq!(key.len(), 32);
        assert!(!key.contains('.'));
    }

    #[test]
    fn test_same_name_gets_distinct_keys() {
        assert_ne!(
            storage_key("p/", "list.csv"),
            storage_key("p/", "list.csv")
        );
    }
}
