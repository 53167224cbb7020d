//! # Error Types
//!
//! Structured error types for calc_core. Every variant carries enough context
//! for a caller (UI, CLI or another program) to point at the offending input
//! without parsing the message text.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::errors::{CalcError, CoreResult};
//!
//! fn check_paper(paper_h: Option<f64>) -> CoreResult<f64> {
//!     let value = paper_h.ok_or_else(|| CalcError::missing_field("paper_h"))?;
//!     if value < 0.0 {
//!         return Err(CalcError::invalid_value(
//!             "paper_h",
//!             value.to_string(),
//!             "must be greater than or equal to 0",
//!         ));
//!     }
//!     Ok(value)
//! }
//!
//! assert_eq!(check_paper(None).unwrap_err().error_code(), "MISSING_FIELD");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for calc_core operations
pub type CoreResult<T> = Result<T, CalcError>;

/// Structured error type for calculation and history operations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// A required input was absent for the requested formula
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A numeric constraint was violated (negative, non-integer count, count < 1)
    #[error("Invalid value for '{field}': {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// The request itself could not be understood
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The persistence backend failed to load or save
    #[error("Persistence error: {operation} - {reason}")]
    PersistenceError { operation: String, reason: String },

    /// File I/O error in a file-backed store
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// Store file is locked by another process
    #[error("File locked: '{path}' is held by {locked_by}")]
    FileLocked { path: String, locked_by: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Persisted history schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidValue {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidRequest error
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        CalcError::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Create a PersistenceError
    pub fn persistence(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::PersistenceError {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileError
    pub fn file_error(operation: impl Into<String>, path: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// The input field at fault, if this error concerns one
    pub fn field(&self) -> Option<&str> {
        match self {
            CalcError::MissingField { field } | CalcError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::InvalidValue { .. } => "INVALID_VALUE",
            CalcError::InvalidRequest { .. } => "INVALID_REQUEST",
            CalcError::PersistenceError { .. } => "PERSISTENCE_ERROR",
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Flatten into the wire report carried by a failed calculation result
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.error_code().to_string(),
            message: self.to_string(),
            fields: self.field().map(|f| vec![f.to_string()]).unwrap_or_default(),
        }
    }
}

/// Error as it appears inside a [`CalcResult`](crate::dispatch::CalcResult).
///
/// ```json
/// { "code": "MISSING_FIELD", "message": "Missing required field: paper_h", "fields": ["paper_h"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Stable code from [`CalcError::error_code`]
    pub code: String,
    /// Human-readable message naming the offending field where possible
    pub message: String,
    /// Input fields at fault
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let error = CalcError::invalid_value("n", "-2", "must be at least 1");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"type\":\"InvalidValue\""));
        let roundtrip: CalcError = serde_json::from_str(&json).unwrap();
        assert_eq!(error, roundtrip);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(CalcError::missing_field("n").error_code(), "MISSING_FIELD");
        assert_eq!(CalcError::invalid_value("n", "0", "too small").error_code(), "INVALID_VALUE");
        assert_eq!(CalcError::persistence("save", "disk full").error_code(), "PERSISTENCE_ERROR");
    }

    #[test]
    fn test_report_names_field() {
        let report = CalcError::missing_field("paper_h").report();
        assert_eq!(report.code, "MISSING_FIELD");
        assert_eq!(report.fields, vec!["paper_h".to_string()]);
        assert!(report.message.contains("paper_h"));

        let report = CalcError::serialization("bad json").report();
        assert!(report.fields.is_empty());
    }
}
