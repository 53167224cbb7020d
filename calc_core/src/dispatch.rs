//! # Request Dispatcher
//!
//! The single entry point an embedding UI or CLI calls: a [`CalcRequest`] goes
//! in, a [`CalcResult`] comes out.
//!
//! ## Modes
//!
//! - **Single** - exactly one parameter. Its error, if any, is the result.
//! - **Full** - every selected parameter (all four by default). Each formula
//!   runs independently; failures land in `skipped` with their reason and the
//!   rest still succeed. No successes at all is still a success.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::{CalcInput, StandardType};
//! use calc_core::dispatch::{dispatch, CalcRequest};
//!
//! let inputs = CalcInput {
//!     a_h_bare: Some(0.5),
//!     a_shrink: Some(0.1),
//!     a_reserve: Some(0.2),
//!     ..Default::default()
//! };
//! let result = dispatch(&CalcRequest::full(StandardType::ShenBian, inputs));
//!
//! assert!(result.is_ok());
//! assert_eq!(result.results().len(), 1);
//! assert_eq!(result.skipped().len(), 3);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calculations::{CalcInput, CalcOutput, ParamType, StandardType};
use crate::errors::{CalcError, ErrorReport};

// ============================================================================
// Request
// ============================================================================

/// Calculation mode with its target selection.
///
/// Serialized inline in the request as `"mode": "Single", "param": ...` or
/// `"mode": "Full", "selected": [...]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum CalcMode {
    /// Evaluate exactly one parameter
    Single { param: ParamType },
    /// Evaluate the selected parameters, or all four when `selected` is absent
    Full {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected: Option<Vec<ParamType>>,
    },
}

impl CalcMode {
    /// Parameters to evaluate, de-duplicated, in canonical order
    pub fn targets(&self) -> Vec<ParamType> {
        match self {
            CalcMode::Single { param } => vec![*param],
            CalcMode::Full { selected: None } => ParamType::ALL.to_vec(),
            CalcMode::Full {
                selected: Some(selected),
            } => ParamType::ALL
                .into_iter()
                .filter(|p| selected.contains(p))
                .collect(),
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, CalcMode::Single { .. })
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            CalcMode::Single { .. } => "Single parameter",
            CalcMode::Full { .. } => "Full parameters",
        }
    }

    /// Display name of what was requested
    pub fn target_label(&self) -> String {
        match self {
            CalcMode::Single { param } => param.label().to_string(),
            CalcMode::Full { selected: None } => "All parameters".to_string(),
            CalcMode::Full { selected: Some(_) } => self
                .targets()
                .iter()
                .map(|p| p.label())
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// A calculation request.
///
/// ## JSON Example
///
/// ```json
/// {
///   "standard": "ShenBian",
///   "mode": "Single",
///   "param": "AFilm",
///   "inputs": { "n": 2, "a_h_change": 5.0, "a_h_bare": 1.0, "paper_h": 0.2 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcRequest {
    /// Formula family
    pub standard: StandardType,
    /// Mode and target selection
    #[serde(flatten)]
    pub mode: CalcMode,
    /// Measurements
    #[serde(default)]
    pub inputs: CalcInput,
}

impl CalcRequest {
    pub fn single(standard: StandardType, param: ParamType, inputs: CalcInput) -> Self {
        CalcRequest {
            standard,
            mode: CalcMode::Single { param },
            inputs,
        }
    }

    /// Full mode over all four parameters
    pub fn full(standard: StandardType, inputs: CalcInput) -> Self {
        CalcRequest {
            standard,
            mode: CalcMode::Full { selected: None },
            inputs,
        }
    }

    /// Full mode over a caller-chosen subset
    pub fn full_selected(standard: StandardType, selected: Vec<ParamType>, inputs: CalcInput) -> Self {
        CalcRequest {
            standard,
            mode: CalcMode::Full {
                selected: Some(selected),
            },
            inputs,
        }
    }
}

// ============================================================================
// Result
// ============================================================================

/// A successful formula output tagged with its parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamResult {
    pub param: ParamType,
    /// Display name of `param`
    pub label: String,
    #[serde(flatten)]
    pub output: CalcOutput,
}

impl ParamResult {
    fn new(param: ParamType, output: CalcOutput) -> Self {
        ParamResult {
            param,
            label: param.label().to_string(),
            output,
        }
    }
}

/// A requested parameter that could not be computed in Full mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedParam {
    pub param: ParamType,
    pub label: String,
    /// Why it was skipped
    pub reason: ErrorReport,
}

/// Outcome of a request.
///
/// ## JSON Example
///
/// ```json
/// { "ok": true, "results": [ { "param": "BDie", "value": 1.55, ... } ] }
/// { "ok": false, "error": { "code": "MISSING_FIELD", "message": "...", "fields": ["n"] } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ResultWire", try_from = "ResultWire")]
pub enum CalcResult {
    Success {
        results: Vec<ParamResult>,
        skipped: Vec<SkippedParam>,
    },
    Failure { error: ErrorReport },
}

/// Flat `ok`-discriminated form of [`CalcResult`] used on the wire.
#[derive(Serialize, Deserialize)]
struct ResultWire {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    results: Option<Vec<ParamResult>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<SkippedParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
}

impl From<CalcResult> for ResultWire {
    fn from(result: CalcResult) -> Self {
        match result {
            CalcResult::Success { results, skipped } => ResultWire {
                ok: true,
                results: Some(results),
                skipped,
                error: None,
            },
            CalcResult::Failure { error } => ResultWire {
                ok: false,
                results: None,
                skipped: Vec::new(),
                error: Some(error),
            },
        }
    }
}

impl TryFrom<ResultWire> for CalcResult {
    type Error = String;

    fn try_from(wire: ResultWire) -> Result<Self, Self::Error> {
        match (wire.ok, wire.error) {
            (true, _) => Ok(CalcResult::Success {
                results: wire.results.unwrap_or_default(),
                skipped: wire.skipped,
            }),
            (false, Some(error)) => Ok(CalcResult::Failure { error }),
            (false, None) => Err("result with ok=false must carry an error".to_string()),
        }
    }
}

impl CalcResult {
    pub fn failure(error: &CalcError) -> Self {
        CalcResult::Failure { error: error.report() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CalcResult::Success { .. })
    }

    /// Successful outputs (empty on failure)
    pub fn results(&self) -> &[ParamResult] {
        match self {
            CalcResult::Success { results, .. } => results,
            CalcResult::Failure { .. } => &[],
        }
    }

    /// Parameters excluded in Full mode (empty otherwise)
    pub fn skipped(&self) -> &[SkippedParam] {
        match self {
            CalcResult::Success { skipped, .. } => skipped,
            CalcResult::Failure { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&ErrorReport> {
        match self {
            CalcResult::Failure { error } => Some(error),
            CalcResult::Success { .. } => None,
        }
    }

    /// Output for one parameter, if it succeeded
    pub fn get(&self, param: ParamType) -> Option<&CalcOutput> {
        self.results().iter().find(|r| r.param == param).map(|r| &r.output)
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Evaluate a request.
///
/// Deterministic and side-effect free apart from debug logging.
pub fn dispatch(request: &CalcRequest) -> CalcResult {
    let standard = request.standard;

    match &request.mode {
        CalcMode::Single { param } => {
            debug!(?standard, ?param, "dispatching single calculation");
            match standard.formula(*param)(&request.inputs) {
                Ok(output) => CalcResult::Success {
                    results: vec![ParamResult::new(*param, output)],
                    skipped: Vec::new(),
                },
                Err(e) => {
                    debug!(?param, error = %e, "single calculation failed");
                    CalcResult::failure(&e)
                }
            }
        }
        mode @ CalcMode::Full { .. } => {
            let targets = mode.targets();
            debug!(?standard, ?targets, "dispatching full calculation");

            let mut results = Vec::with_capacity(targets.len());
            let mut skipped = Vec::new();
            for param in targets {
                match standard.formula(param)(&request.inputs) {
                    Ok(output) => results.push(ParamResult::new(param, output)),
                    Err(e) => {
                        debug!(?param, error = %e, "skipping parameter");
                        skipped.push(SkippedParam {
                            param,
                            label: param.label().to_string(),
                            reason: e.report(),
                        });
                    }
                }
            }
            CalcResult::Success { results, skipped }
        }
    }
}

/// JSON bridge: parse a request, dispatch it, serialize the result.
///
/// Always returns a serialized [`CalcResult`]; an unparseable request becomes
/// an `ok: false` result with code `INVALID_REQUEST`.
///
/// ```rust
/// use calc_core::dispatch::calculate_json;
///
/// let out = calculate_json(r#"{"standard":"HengBian","mode":"Single","param":"BDie",
///     "inputs":{"b_h_bare":1.2,"b_shrink":0.3,"b_reserve":0.05}}"#);
/// assert!(out.contains("\"ok\":true"));
/// assert!(out.contains("1.55"));
/// ```
pub fn calculate_json(request_json: &str) -> String {
    let result = match serde_json::from_str::<CalcRequest>(request_json) {
        Ok(request) => dispatch(&request),
        Err(e) => CalcResult::failure(&CalcError::invalid_request(e.to_string())),
    };

    serde_json::to_string(&result).unwrap_or_else(|e| {
        format!(
            r#"{{"ok":false,"error":{{"code":"SERIALIZATION_ERROR","message":{:?}}}}}"#,
            e.to_string()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::InputField;

    fn all_inputs() -> CalcInput {
        CalcInput {
            n: Some(2.0),
            a_h_change: Some(5.0),
            a_h_bare: Some(1.0),
            b_h_change: Some(1.0),
            b_h_bare: Some(0.2),
            paper_h: Some(0.2),
            center_paper_h: Some(0.05),
            a_shrink: Some(0.1),
            b_shrink: Some(0.3),
            a_reserve: Some(0.2),
            b_reserve: Some(0.05),
        }
    }

    fn a_die_only() -> CalcInput {
        CalcInput {
            a_h_bare: Some(0.5),
            a_shrink: Some(0.1),
            a_reserve: Some(0.2),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_success() {
        let request = CalcRequest::single(StandardType::ShenBian, ParamType::AFilm, all_inputs());
        let result = dispatch(&request);
        assert!(result.is_ok());
        assert_eq!(result.results().len(), 1);
        assert_eq!(result.results()[0].param, ParamType::AFilm);
        assert_eq!(result.results()[0].label, "A-side film thickness");
        assert_eq!(result.get(ParamType::AFilm).unwrap().value, 2.2);
        assert!(result.skipped().is_empty());
    }

    #[test]
    fn test_single_failure_has_no_partial_results() {
        let request = CalcRequest::single(StandardType::HengBian, ParamType::BFilm, a_die_only());
        let result = dispatch(&request);
        assert!(!result.is_ok());
        assert!(result.results().is_empty());
        let error = result.error().unwrap();
        assert_eq!(error.code, "MISSING_FIELD");
        assert_eq!(error.fields, vec!["b_h_change".to_string()]);
    }

    #[test]
    fn test_full_with_only_a_die_fields() {
        let result = dispatch(&CalcRequest::full(StandardType::ShenBian, a_die_only()));
        assert!(result.is_ok());
        assert_eq!(result.results().len(), 1);
        assert_eq!(result.results()[0].param, ParamType::ADie);

        let skipped: Vec<_> = result.skipped().iter().map(|s| s.param).collect();
        assert_eq!(skipped, vec![ParamType::AFilm, ParamType::BFilm, ParamType::BDie]);
        assert_eq!(result.skipped()[0].reason.fields, vec!["n".to_string()]);
    }

    #[test]
    fn test_full_all_succeed_in_canonical_order() {
        let result = dispatch(&CalcRequest::full(StandardType::ShenBian, all_inputs()));
        let params: Vec<_> = result.results().iter().map(|r| r.param).collect();
        assert_eq!(params, ParamType::ALL.to_vec());
        assert!(result.skipped().is_empty());
        assert_eq!(result.get(ParamType::BDie).unwrap().value, 1.55);
    }

    #[test]
    fn test_full_with_nothing_satisfiable_is_empty_success() {
        let result = dispatch(&CalcRequest::full(StandardType::ShenBian, CalcInput::default()));
        assert!(result.is_ok());
        assert!(result.results().is_empty());
        assert_eq!(result.skipped().len(), 4);
    }

    #[test]
    fn test_full_selected_subset() {
        let request = CalcRequest::full_selected(
            StandardType::ShenBian,
            vec![ParamType::BDie, ParamType::AFilm, ParamType::BDie],
            all_inputs(),
        );
        let result = dispatch(&request);
        let params: Vec<_> = result.results().iter().map(|r| r.param).collect();
        assert_eq!(params, vec![ParamType::AFilm, ParamType::BDie]);

        let empty = CalcRequest::full_selected(StandardType::ShenBian, vec![], all_inputs());
        let result = dispatch(&empty);
        assert!(result.is_ok());
        assert!(result.results().is_empty());
        assert!(result.skipped().is_empty());
    }

    #[test]
    fn test_echo_matches_request_inputs() {
        let inputs = all_inputs();
        let result = dispatch(&CalcRequest::full(StandardType::HengBian, inputs.clone()));
        for r in result.results() {
            for (field, value) in &r.output.inputs_echo {
                assert_eq!(inputs.get(*field), Some(*value), "{:?}", field);
            }
        }
    }

    #[test]
    fn test_request_wire_format() {
        let json = r#"{"standard":"ShenBian","mode":"Single","param":"AFilm","inputs":{"n":2,"a_h_change":5.0,"a_h_bare":1.0,"paper_h":0.2}}"#;
        let request: CalcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.mode, CalcMode::Single { param: ParamType::AFilm });
        assert_eq!(request.inputs.get(InputField::N), Some(2.0));

        let full: CalcRequest =
            serde_json::from_str(r#"{"standard":"HengBian","mode":"Full","inputs":{}}"#).unwrap();
        assert_eq!(full.mode, CalcMode::Full { selected: None });

        let roundtrip: CalcRequest = serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert_eq!(roundtrip, request);
    }

    #[test]
    fn test_single_without_param_is_rejected() {
        let out = calculate_json(r#"{"standard":"ShenBian","mode":"Single","inputs":{}}"#);
        let result: CalcResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.error().unwrap().code, "INVALID_REQUEST");
    }

    #[test]
    fn test_calculate_json_invalid() {
        let out = calculate_json("not json");
        let result: CalcResult = serde_json::from_str(&out).unwrap();
        assert!(!result.is_ok());
        assert_eq!(result.error().unwrap().code, "INVALID_REQUEST");
    }

    #[test]
    fn test_calculate_json_ok_flag() {
        let out = calculate_json(
            r#"{"standard":"ShenBian","mode":"Single","param":"BDie","inputs":{"b_h_bare":1.2,"b_shrink":0.3,"b_reserve":0.05}}"#,
        );
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v.get("ok"), Some(&serde_json::Value::Bool(true)));
        assert_eq!(v["results"][0]["value"], 1.55);
        assert!(v.get("error").is_none());

        let out = calculate_json(r#"{"standard":"ShenBian","mode":"Single","param":"BDie","inputs":{}}"#);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v.get("ok"), Some(&serde_json::Value::Bool(false)));
        assert_eq!(v["error"]["code"], "MISSING_FIELD");
        assert!(v.get("results").is_none());
    }

    #[test]
    fn test_empty_full_result_keeps_results_array() {
        let result = dispatch(&CalcRequest::full_selected(StandardType::ShenBian, vec![], all_inputs()));
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v, serde_json::json!({ "ok": true, "results": [] }));
    }

    #[test]
    fn test_failure_without_error_is_rejected() {
        assert!(serde_json::from_str::<CalcResult>(r#"{"ok":false}"#).is_err());
    }

    #[test]
    fn test_result_roundtrip() {
        let result = dispatch(&CalcRequest::full(StandardType::ShenBian, a_die_only()));
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"formula_id\":\"a_die\""));
        let back: CalcResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
