//! # calc_core - Winding Process Calculation Engine
//!
//! `calc_core` computes the derived dimensions of a transposed-cable winding
//! process: film thickness and extrusion die size on the A and B sides. All
//! requests and results are JSON-serializable, so the engine sits equally well
//! behind a CLI, a desktop shell or a web view.
//!
//! ## Design Philosophy
//!
//! - **Stateless formulas**: pure functions from inputs to a rounded output
//! - **JSON-First**: requests, results and history are plain serde types
//! - **Rich Errors**: failures carry a code and the offending field, not just strings
//! - **Owned history**: one store owns the log and hands out immutable snapshots
//!
//! ## Quick Start
//!
//! ```rust
//! use calc_core::calculate_json;
//!
//! let result = calculate_json(r#"{
//!     "standard": "ShenBian",
//!     "mode": "Single",
//!     "param": "BDie",
//!     "inputs": { "b_h_bare": 1.2, "b_shrink": 0.3, "b_reserve": 0.05 }
//! }"#);
//! assert!(result.contains("1.55"));
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - Parameter kinds, input fields and the formulas
//! - [`dispatch`] - Request routing for single and full calculations
//! - [`history`] - Capped calculation log with pluggable persistence
//! - [`export`] - Summaries plus JSON and CSV export
//! - [`config`] - Settings file
//! - [`presets`] - Common input templates
//! - [`units`] - Millimeter wrapper and rounding
//! - [`errors`] - Structured error types

pub mod calculations;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod export;
pub mod history;
pub mod presets;
pub mod units;
pub mod validation;

// Re-export commonly used types at crate root for convenience
pub use calculations::{CalcInput, ParamType, StandardType};
pub use config::Settings;
pub use dispatch::{calculate_json, dispatch, CalcMode, CalcRequest, CalcResult};
pub use errors::{CalcError, CoreResult, ErrorReport};
pub use history::{HistoryItem, HistoryStore};
