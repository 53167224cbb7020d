//! # Validation Primitives
//!
//! Numeric constraints shared by every formula. Both helpers are pure: they
//! look at one optional value and either hand it back or say which field is
//! wrong.

use crate::errors::{CalcError, CoreResult};

/// Require a present, finite, non-negative value.
///
/// # Errors
///
/// * `MissingField(field)` - value is absent
/// * `InvalidValue(field)` - value is negative, NaN or infinite
///
/// # Example
///
/// ```rust
/// use calc_core::validation::require_non_negative;
///
/// assert_eq!(require_non_negative(Some(0.45), "paper_h").unwrap(), 0.45);
/// assert!(require_non_negative(Some(-0.1), "paper_h").is_err());
/// ```
pub fn require_non_negative(value: Option<f64>, field: &str) -> CoreResult<f64> {
    let value = value.ok_or_else(|| CalcError::missing_field(field))?;
    if !value.is_finite() {
        return Err(CalcError::invalid_value(field, value.to_string(), "must be a finite number"));
    }
    if value < 0.0 {
        return Err(CalcError::invalid_value(
            field,
            value.to_string(),
            "must be greater than or equal to 0",
        ));
    }
    Ok(value)
}

/// Require a present whole-number count of at least 1.
///
/// The count arrives as a real so that `2.5` can be rejected rather than
/// silently truncated.
///
/// # Errors
///
/// * `MissingField(field)` - value is absent
/// * `InvalidValue(field)` - value is not a whole number, or is below 1
pub fn require_positive_integer_count(value: Option<f64>, field: &str) -> CoreResult<u32> {
    let value = value.ok_or_else(|| CalcError::missing_field(field))?;
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(CalcError::invalid_value(field, value.to_string(), "must be a whole number"));
    }
    if value < 1.0 {
        return Err(CalcError::invalid_value(field, value.to_string(), "must be at least 1"));
    }
    if value > u32::MAX as f64 {
        return Err(CalcError::invalid_value(field, value.to_string(), "count is too large"));
    }
    Ok(value as u32)
}
