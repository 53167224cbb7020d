//! Persisted form of the history: a versioned JSON document.
//!
//! ```json
//! { "version": "0.1.0", "items": [ ... ] }
//! ```
//!
//! A bare JSON array of items is also accepted on load, provided the items
//! have the same shape `encode` writes.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CoreResult};
use crate::history::HistoryItem;

/// Current schema version for persisted history
pub const SCHEMA_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDocument {
    /// Schema version (for migration compatibility)
    pub version: String,
    /// Newest first
    pub items: Vec<HistoryItem>,
}

#[derive(Serialize)]
struct HistoryDocumentRef<'a> {
    version: &'a str,
    items: &'a [HistoryItem],
}

/// Serialize items into a document blob
pub fn encode(items: &[HistoryItem]) -> CoreResult<String> {
    serde_json::to_string(&HistoryDocumentRef {
        version: SCHEMA_VERSION,
        items,
    })
    .map_err(|e| CalcError::serialization(e.to_string()))
}

/// Parse a blob written by [`encode`] (or a bare item array)
pub fn decode(blob: &str) -> CoreResult<Vec<HistoryItem>> {
    let value: serde_json::Value =
        serde_json::from_str(blob).map_err(|e| CalcError::serialization(format!("Invalid history JSON: {}", e)))?;

    if value.is_array() {
        return serde_json::from_value(value).map_err(|e| CalcError::serialization(e.to_string()));
    }

    let document: HistoryDocument =
        serde_json::from_value(value).map_err(|e| CalcError::serialization(e.to_string()))?;
    validate_version(&document.version)?;
    Ok(document.items)
}

/// Validate that a stored version is compatible with the current schema.
fn validate_version(file_version: &str) -> CoreResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION.split('.').filter_map(|p| p.parse().ok()).collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x versions a newer minor may carry breaking changes
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::{CalcInput, ParamType, StandardType};
    use crate::dispatch::{dispatch, CalcRequest};

    fn item() -> HistoryItem {
        let request = CalcRequest::single(
            StandardType::ShenBian,
            ParamType::BDie,
            CalcInput {
                b_h_bare: Some(1.2),
                b_shrink: Some(0.3),
                b_reserve: Some(0.05),
                ..Default::default()
            },
        );
        let result = dispatch(&request);
        HistoryItem::new(request, result)
    }

    #[test]
    fn test_encode_decode() {
        let items = vec![item(), item()];
        let blob = encode(&items).unwrap();
        assert!(blob.contains("\"version\":\"0.1.0\""));
        assert_eq!(decode(&blob).unwrap(), items);
    }

    #[test]
    fn test_decode_bare_array() {
        let items = vec![item()];
        let blob = serde_json::to_string(&items).unwrap();
        assert_eq!(decode(&blob).unwrap(), items);
    }

    #[test]
    fn test_decode_rejects_foreign_item_shape() {
        let blob = r#"[{"id":"6f1c1a2e-8d3b-4a8e-9a55-0c2f4b1d7e90","timestamp":1700000000000,
            "request":{"standard":"ShenBian","mode":"Single","param":"BDie","inputs":{}},
            "result":{"ok":false,"error":{"code":"MISSING_FIELD","message":"x"}}}]"#;
        assert_eq!(decode(blob).unwrap_err().error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode("{oops").unwrap_err().error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.1").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("banana").is_err());
    }

    #[test]
    fn test_decode_rejects_newer_schema() {
        let blob = r#"{"version":"0.9.0","items":[]}"#;
        assert_eq!(decode(blob).unwrap_err().error_code(), "VERSION_MISMATCH");
    }
}
