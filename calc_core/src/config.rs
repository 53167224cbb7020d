//! # Settings
//!
//! Serde-backed settings, stored as JSON like everything else in calc_core.
//! Every field has a default, so a partial file (or no file) is fine.
//!
//! ```json
//! {
//!   "default_standard": "HengBian",
//!   "history": { "max_items": 50, "storage_key": "process_history_v2" },
//!   "export": { "file_prefix": "process_history" }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calculations::StandardType;
use crate::errors::{CalcError, CoreResult};
use crate::history::MAX_ITEMS;

/// Key the history blob is stored under
pub const DEFAULT_STORAGE_KEY: &str = "process_history_v2";

/// Prefix of exported file names
pub const DEFAULT_EXPORT_PREFIX: &str = "process_history";

/// Root settings container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Standard used when a caller does not pick one
    pub default_standard: StandardType,

    pub history: HistorySettings,

    pub export: ExportSettings,
}

impl Settings {
    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| CalcError::file_error("read settings", path.display().to_string(), e.to_string()))?;
        let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
            CalcError::serialization(format!("Invalid settings JSON in {}: {}", path.display(), e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`Settings::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> CoreResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Settings::default())
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.history.max_items == 0 {
            return Err(CalcError::invalid_value(
                "history.max_items",
                "0",
                "history must keep at least one item",
            ));
        }
        if self.history.storage_key.trim().is_empty() {
            return Err(CalcError::invalid_value("history.storage_key", "", "storage key cannot be empty"));
        }
        Ok(())
    }
}

/// History store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Cap on stored items (newest kept)
    pub max_items: usize,

    /// Key (or file stem) the history blob is stored under
    pub storage_key: String,
}

impl Default for HistorySettings {
    fn default() -> Self {
        HistorySettings {
            max_items: MAX_ITEMS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// Export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub file_prefix: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        ExportSettings {
            file_prefix: DEFAULT_EXPORT_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.default_standard, StandardType::ShenBian);
        assert_eq!(settings.history.max_items, 50);
        assert_eq!(settings.history.storage_key, DEFAULT_STORAGE_KEY);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"history":{"max_items":10}}"#).unwrap();
        assert_eq!(settings.history.max_items, 10);
        assert_eq!(settings.history.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(settings.export.file_prefix, DEFAULT_EXPORT_PREFIX);
    }

    #[test]
    fn test_zero_cap_rejected() {
        let mut settings = Settings::default();
        settings.history.max_items = 0;
        assert_eq!(settings.validate().unwrap_err().error_code(), "INVALID_VALUE");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"default_standard":"HengBian","export":{"file_prefix":"line3"}}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.default_standard, StandardType::HengBian);
        assert_eq!(settings.export.file_prefix, "line3");

        let missing = Settings::load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(missing, Settings::default());
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{").unwrap();
        assert_eq!(Settings::load(&path).unwrap_err().error_code(), "SERIALIZATION_ERROR");
    }
}
