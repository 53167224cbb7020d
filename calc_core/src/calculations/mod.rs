//! # Winding Calculations
//!
//! Each calculation follows the pattern:
//!
//! - [`CalcInput`] - sparse measurement record (JSON-serializable)
//! - [`CalcOutput`] - rounded value, unit, precision and an echo of the inputs used
//! - `calculate(&CalcInput) -> CoreResult<CalcOutput>` - pure function
//!
//! ## Available Calculations
//!
//! - [`film`] - A-side and B-side film thickness
//! - [`die`] - A-side and B-side extrusion die size
//! - [`registry`] - metadata and generated reference for every formula
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::{CalcInput, ParamType, StandardType};
//!
//! let input = CalcInput {
//!     b_h_bare: Some(1.2),
//!     b_shrink: Some(0.3),
//!     b_reserve: Some(0.05),
//!     ..Default::default()
//! };
//!
//! let out = StandardType::ShenBian.formula(ParamType::BDie)(&input).unwrap();
//! assert_eq!(out.value, 1.55);
//! assert_eq!(out.unit, "mm");
//! ```

pub mod die;
pub mod film;
pub mod registry;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CoreResult};
use crate::units::MM_UNIT;

pub use registry::{generate_formulas_markdown, FormulaMetadata, Variable};

/// Signature shared by all four formulas
pub type Formula = fn(&CalcInput) -> CoreResult<CalcOutput>;

// ============================================================================
// Standards
// ============================================================================

/// Industry convention selecting a formula family.
///
/// Both standards currently resolve to the same arithmetic. The table in
/// [`StandardType::formula`] is where a per-standard variant would go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StandardType {
    #[default]
    ShenBian,
    HengBian,
}

impl StandardType {
    /// Resolve the formula implementing `param` under this standard
    pub fn formula(&self, param: ParamType) -> Formula {
        match (self, param) {
            (StandardType::ShenBian | StandardType::HengBian, ParamType::AFilm) => film::calc_a_film,
            (StandardType::ShenBian | StandardType::HengBian, ParamType::BFilm) => film::calc_b_film,
            (StandardType::ShenBian | StandardType::HengBian, ParamType::ADie) => die::calc_a_die,
            (StandardType::ShenBian | StandardType::HengBian, ParamType::BDie) => die::calc_b_die,
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            StandardType::ShenBian => "Shenbian standard",
            StandardType::HengBian => "Hengbian standard",
        }
    }
}

impl FromStr for StandardType {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "shenbian" => Ok(StandardType::ShenBian),
            "hengbian" => Ok(StandardType::HengBian),
            _ => Err(CalcError::invalid_request(format!("unknown standard '{}'", s))),
        }
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// Which derived dimension to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamType {
    AFilm,
    BFilm,
    ADie,
    BDie,
}

impl ParamType {
    /// Canonical evaluation and output order
    pub const ALL: [ParamType; 4] = [ParamType::AFilm, ParamType::BFilm, ParamType::ADie, ParamType::BDie];

    /// Stable identifier written into [`CalcOutput::formula_id`]
    pub fn formula_id(&self) -> &'static str {
        match self {
            ParamType::AFilm => "a_film",
            ParamType::BFilm => "b_film",
            ParamType::ADie => "a_die",
            ParamType::BDie => "b_die",
        }
    }

    /// Output precision in decimal places
    pub fn decimals(&self) -> u32 {
        match self {
            ParamType::AFilm => 2,
            ParamType::BFilm | ParamType::ADie | ParamType::BDie => 4,
        }
    }

    /// Fields the formula validates, in validation order
    pub fn required_fields(&self) -> &'static [InputField] {
        match self {
            ParamType::AFilm => &[InputField::N, InputField::AHChange, InputField::AHBare, InputField::PaperH],
            ParamType::BFilm => &[
                InputField::BHChange,
                InputField::BHBare,
                InputField::PaperH,
                InputField::CenterPaperH,
            ],
            ParamType::ADie => &[InputField::AHBare, InputField::AShrink, InputField::AReserve],
            ParamType::BDie => &[InputField::BHBare, InputField::BShrink, InputField::BReserve],
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            ParamType::AFilm => "A-side film thickness",
            ParamType::BFilm => "B-side film thickness",
            ParamType::ADie => "A-side extrusion die size",
            ParamType::BDie => "B-side extrusion die size",
        }
    }

    /// Compact name for one-line summaries
    pub fn short_label(&self) -> &'static str {
        match self {
            ParamType::AFilm => "A film",
            ParamType::BFilm => "B film",
            ParamType::ADie => "A die",
            ParamType::BDie => "B die",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.formula_id())
    }
}

/// Accepts `AFilm`, `a_film` or `a-film` (case-insensitive).
impl FromStr for ParamType {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "afilm" => Ok(ParamType::AFilm),
            "bfilm" => Ok(ParamType::BFilm),
            "adie" => Ok(ParamType::ADie),
            "bdie" => Ok(ParamType::BDie),
            _ => Err(CalcError::invalid_request(format!("unknown parameter '{}'", s))),
        }
    }
}

fn normalize_key(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// Inputs
// ============================================================================

/// Names of the measurement fields in [`CalcInput`].
///
/// Serializes to the same snake_case key used in request JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    N,
    AHChange,
    AHBare,
    BHChange,
    BHBare,
    PaperH,
    CenterPaperH,
    AShrink,
    BShrink,
    AReserve,
    BReserve,
}

impl InputField {
    pub const ALL: [InputField; 11] = [
        InputField::N,
        InputField::AHChange,
        InputField::AHBare,
        InputField::BHChange,
        InputField::BHBare,
        InputField::PaperH,
        InputField::CenterPaperH,
        InputField::AShrink,
        InputField::BShrink,
        InputField::AReserve,
        InputField::BReserve,
    ];

    /// JSON key
    pub fn key(&self) -> &'static str {
        match self {
            InputField::N => "n",
            InputField::AHChange => "a_h_change",
            InputField::AHBare => "a_h_bare",
            InputField::BHChange => "b_h_change",
            InputField::BHBare => "b_h_bare",
            InputField::PaperH => "paper_h",
            InputField::CenterPaperH => "center_paper_h",
            InputField::AShrink => "a_shrink",
            InputField::BShrink => "b_shrink",
            InputField::AReserve => "a_reserve",
            InputField::BReserve => "b_reserve",
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            InputField::N => "Conductor count",
            InputField::AHChange => "A-side transposed cable thickness",
            InputField::AHBare => "A-side bare conductor thickness",
            InputField::BHChange => "B-side transposed cable thickness",
            InputField::BHBare => "B-side bare conductor thickness",
            InputField::PaperH => "Insulation paper thickness",
            InputField::CenterPaperH => "Center paper thickness",
            InputField::AShrink => "A-side shrink allowance",
            InputField::BShrink => "B-side shrink allowance",
            InputField::AReserve => "A-side die reserve",
            InputField::BReserve => "B-side die reserve",
        }
    }
}

/// Sparse measurement record. Lengths are millimeters.
///
/// Only the fields a formula needs have to be present; see
/// [`ParamType::required_fields`].
///
/// ## JSON Example
///
/// ```json
/// { "n": 2, "a_h_change": 5.0, "a_h_bare": 1.0, "paper_h": 0.2 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalcInput {
    /// Conductor count (whole number, at least 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_h_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_h_bare: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_h_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_h_bare: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_paper_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_shrink: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_shrink: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_reserve: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_reserve: Option<f64>,
}

impl CalcInput {
    /// Read one field by name
    pub fn get(&self, field: InputField) -> Option<f64> {
        match field {
            InputField::N => self.n,
            InputField::AHChange => self.a_h_change,
            InputField::AHBare => self.a_h_bare,
            InputField::BHChange => self.b_h_change,
            InputField::BHBare => self.b_h_bare,
            InputField::PaperH => self.paper_h,
            InputField::CenterPaperH => self.center_paper_h,
            InputField::AShrink => self.a_shrink,
            InputField::BShrink => self.b_shrink,
            InputField::AReserve => self.a_reserve,
            InputField::BReserve => self.b_reserve,
        }
    }

    /// Builder-style setter
    pub fn with(mut self, field: InputField, value: f64) -> Self {
        let slot = match field {
            InputField::N => &mut self.n,
            InputField::AHChange => &mut self.a_h_change,
            InputField::AHBare => &mut self.a_h_bare,
            InputField::BHChange => &mut self.b_h_change,
            InputField::BHBare => &mut self.b_h_bare,
            InputField::PaperH => &mut self.paper_h,
            InputField::CenterPaperH => &mut self.center_paper_h,
            InputField::AShrink => &mut self.a_shrink,
            InputField::BShrink => &mut self.b_shrink,
            InputField::AReserve => &mut self.a_reserve,
            InputField::BReserve => &mut self.b_reserve,
        };
        *slot = Some(value);
        self
    }

    /// Present fields in declaration order
    pub fn entries(&self) -> Vec<(InputField, f64)> {
        InputField::ALL
            .iter()
            .filter_map(|f| self.get(*f).map(|v| (*f, v)))
            .collect()
    }

    /// Fields set in `overlay` replace ours; everything else is kept.
    pub fn merged_with(&self, overlay: &CalcInput) -> CalcInput {
        overlay
            .entries()
            .into_iter()
            .fold(self.clone(), |acc, (field, value)| acc.with(field, value))
    }
}

// ============================================================================
// Outputs
// ============================================================================

/// Literal input values a formula consumed, keyed by field
pub type InputsEcho = BTreeMap<InputField, f64>;

/// One formula's result.
///
/// ## JSON Example
///
/// ```json
/// {
///   "value": 2.2,
///   "unit": "mm",
///   "decimals": 2,
///   "formula_id": "a_film",
///   "inputs_echo": { "n": 2.0, "a_h_change": 5.0, "a_h_bare": 1.0, "paper_h": 0.2 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcOutput {
    /// Rounded value
    pub value: f64,
    /// Always "mm"
    pub unit: String,
    /// Decimal places `value` was rounded to
    pub decimals: u32,
    /// Stable formula identifier (`a_film`, `b_film`, `a_die`, `b_die`)
    pub formula_id: String,
    /// Exact inputs used, for audit
    pub inputs_echo: InputsEcho,
}

impl CalcOutput {
    pub(crate) fn new(param: ParamType, value: f64, inputs_echo: InputsEcho) -> Self {
        CalcOutput {
            value,
            unit: MM_UNIT.to_string(),
            decimals: param.decimals(),
            formula_id: param.formula_id().to_string(),
            inputs_echo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_field_keys_match_serde() {
        for field in InputField::ALL {
            let json = serde_json::to_string(&field).unwrap();
            assert_eq!(json, format!("\"{}\"", field.key()));
        }
    }

    #[test]
    fn test_calc_input_sparse_json() {
        let input: CalcInput = serde_json::from_str(r#"{"n": 3, "paper_h": 0.45}"#).unwrap();
        assert_eq!(input.n, Some(3.0));
        assert_eq!(input.paper_h, Some(0.45));
        assert_eq!(input.a_h_bare, None);

        let json = serde_json::to_string(&input).unwrap();
        assert!(!json.contains("a_h_bare"));
    }

    #[test]
    fn test_merged_with_overlays_set_fields() {
        let base = CalcInput::default().with(InputField::PaperH, 0.45).with(InputField::N, 2.0);
        let overlay = CalcInput::default().with(InputField::PaperH, 1.35);
        let merged = base.merged_with(&overlay);
        assert_eq!(merged.paper_h, Some(1.35));
        assert_eq!(merged.n, Some(2.0));
        assert_eq!(base.paper_h, Some(0.45));
    }

    #[test]
    fn test_param_type_parsing() {
        assert_eq!("AFilm".parse::<ParamType>().unwrap(), ParamType::AFilm);
        assert_eq!("b_film".parse::<ParamType>().unwrap(), ParamType::BFilm);
        assert_eq!("a-die".parse::<ParamType>().unwrap(), ParamType::ADie);
        assert!("c_die".parse::<ParamType>().is_err());
        assert_eq!("heng-bian".parse::<StandardType>().unwrap(), StandardType::HengBian);
    }

    #[test]
    fn test_param_precision() {
        assert_eq!(ParamType::AFilm.decimals(), 2);
        for param in [ParamType::BFilm, ParamType::ADie, ParamType::BDie] {
            assert_eq!(param.decimals(), 4);
        }
    }

    #[test]
    fn test_standards_share_arithmetic() {
        let input = CalcInput {
            n: Some(4.0),
            a_h_change: Some(9.1),
            a_h_bare: Some(1.7),
            paper_h: Some(0.45),
            ..Default::default()
        };
        let shen = StandardType::ShenBian.formula(ParamType::AFilm)(&input).unwrap();
        let heng = StandardType::HengBian.formula(ParamType::AFilm)(&input).unwrap();
        assert_eq!(shen, heng);
    }
}
