//! # Unit Types
//!
//! Every dimension in the winding process is a length in millimeters, so this
//! module is small: a transparent `Millimeters` wrapper, the unit label used in
//! outputs, and the rounding rule shared by all formulas.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::units::{round_to, Millimeters};
//!
//! let film = Millimeters(2.204999);
//! assert_eq!(film.rounded(2).0, 2.2);
//! assert_eq!(round_to(-0.125, 2), -0.13);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Unit label attached to every calculation output
pub const MM_UNIT: &str = "mm";

/// Length in millimeters
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl Millimeters {
    /// Round to `decimals` places with [`round_to`]
    pub fn rounded(self, decimals: u32) -> Self {
        Millimeters(round_to(self.0, decimals))
    }
}

impl Add for Millimeters {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Millimeters(self.0 + rhs.0)
    }
}

impl Sub for Millimeters {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Millimeters(self.0 - rhs.0)
    }
}

impl Mul<f64> for Millimeters {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Millimeters(self.0 * rhs)
    }
}

impl Div<f64> for Millimeters {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Millimeters(self.0 / rhs)
    }
}

impl fmt::Display for Millimeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, MM_UNIT)
    }
}

/// Round `value` to `decimals` places, halves away from zero.
///
/// `round(x, k) = round_half_away_from_zero(x * 10^k) / 10^k`
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
