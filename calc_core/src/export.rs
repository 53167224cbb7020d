//! # Export and Summaries
//!
//! Turns stored [`HistoryItem`]s into one-line summaries and into the two
//! exchange formats:
//!
//! - **JSON** - pretty-printed array of records: the raw item plus
//!   `readable_inputs` (input label to value) and its summary. Parse it back
//!   with [`parse_json_export`].
//! - **CSV** - UTF-8 with a leading BOM so spreadsheets detect the encoding,
//!   every field quoted per RFC 4180.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::{CalcInput, ParamType, StandardType};
//! use calc_core::dispatch::{dispatch, CalcRequest};
//! use calc_core::export::{export, summarize, ExportFormat};
//! use calc_core::history::HistoryItem;
//!
//! let request = CalcRequest::single(StandardType::ShenBian, ParamType::BDie, CalcInput {
//!     b_h_bare: Some(1.2),
//!     b_shrink: Some(0.3),
//!     b_reserve: Some(0.05),
//!     ..Default::default()
//! });
//! let item = HistoryItem::new(request.clone(), dispatch(&request));
//!
//! assert_eq!(summarize(&item).result_summary, "1.55 mm");
//! let csv = export(&[item], ExportFormat::Csv).unwrap();
//! assert!(csv.starts_with('\u{feff}'));
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ExportSettings;
use crate::dispatch::{CalcMode, CalcRequest, CalcResult};
use crate::errors::{CalcError, CoreResult};
use crate::history::HistoryItem;

const BOM: char = '\u{feff}';
const CSV_HEADERS: [&str; 6] = ["Time", "Standard", "Mode", "Parameter", "Result", "Inputs"];
const SUMMARY_PARTS: usize = 2;

/// Exchange format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv;charset=utf-8",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(CalcError::invalid_request(format!("unknown export format '{}'", other))),
        }
    }
}

// ============================================================================
// Summaries
// ============================================================================

/// Title and one-line result for a history list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub title: String,
    pub result_summary: String,
    /// Successful outputs in a Full calculation, 0 for Single
    pub count: usize,
}

/// Summarize one history item.
///
/// - Single: title is the parameter label, summary is `"{value} {unit}"`.
/// - Full: title is `Batch (N items)`, summary is the first two outputs as
///   `"{short label} {value}{unit}"` joined by `" / "`, with `" +K"` for the rest.
pub fn summarize(item: &HistoryItem) -> HistorySummary {
    let results = item.result.results();

    let (title, count) = match &item.request.mode {
        CalcMode::Single { param } => (param.label().to_string(), 0),
        CalcMode::Full { .. } => (format!("Batch ({} items)", results.len()), results.len()),
    };

    let result_summary = match &item.result {
        CalcResult::Failure { .. } => "Calculation failed".to_string(),
        CalcResult::Success { .. } if item.request.mode.is_single() => results
            .first()
            .map(|r| format!("{} {}", r.output.value, r.output.unit))
            .unwrap_or_default(),
        CalcResult::Success { .. } => {
            let mut summary = results
                .iter()
                .take(SUMMARY_PARTS)
                .map(|r| format!("{} {}{}", r.param.short_label(), r.output.value, r.output.unit))
                .collect::<Vec<_>>()
                .join(" / ");
            if results.len() > SUMMARY_PARTS {
                summary.push_str(&format!(" +{}", results.len() - SUMMARY_PARTS));
            }
            summary
        }
    };

    HistorySummary {
        title,
        result_summary,
        count,
    }
}

/// Present inputs of a request keyed by their display label
pub fn readable_inputs(request: &CalcRequest) -> BTreeMap<String, f64> {
    request
        .inputs
        .entries()
        .into_iter()
        .map(|(field, value)| (field.label().to_string(), value))
        .collect()
}

// ============================================================================
// Export
// ============================================================================

/// One element of the JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    #[serde(flatten)]
    pub item: HistoryItem,
    pub readable_inputs: BTreeMap<String, f64>,
    pub summary: HistorySummary,
}

impl From<&HistoryItem> for ExportRecord {
    fn from(item: &HistoryItem) -> Self {
        ExportRecord {
            item: item.clone(),
            readable_inputs: readable_inputs(&item.request),
            summary: summarize(item),
        }
    }
}

/// A rendered export ready to be written or offered for download
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

/// Serialize `items` in `format`. CSV times are local.
pub fn export(items: &[HistoryItem], format: ExportFormat) -> CoreResult<String> {
    match format {
        ExportFormat::Json => render_json(items),
        ExportFormat::Csv => Ok(render_csv(items, &Local)),
    }
}

/// [`export`] plus a timestamped file name.
pub fn export_file(
    items: &[HistoryItem],
    format: ExportFormat,
    settings: &ExportSettings,
    now: DateTime<Local>,
) -> CoreResult<ExportFile> {
    Ok(ExportFile {
        file_name: export_filename(&settings.file_prefix, format, &now),
        mime_type: format.mime_type(),
        contents: export(items, format)?,
    })
}

/// `<prefix>_<YYYYMMDDHHMM>.<ext>`
pub fn export_filename<Tz: TimeZone>(prefix: &str, format: ExportFormat, at: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!("{}_{}.{}", prefix, at.format("%Y%m%d%H%M"), format.extension())
}

/// Selected items when `ids` is non-empty, otherwise everything.
pub fn select_for_export(items: &[HistoryItem], ids: &HashSet<Uuid>) -> Vec<HistoryItem> {
    if ids.is_empty() {
        return items.to_vec();
    }
    items.iter().filter(|item| ids.contains(&item.id)).cloned().collect()
}

pub fn render_json(items: &[HistoryItem]) -> CoreResult<String> {
    let records: Vec<ExportRecord> = items.iter().map(ExportRecord::from).collect();
    serde_json::to_string_pretty(&records).map_err(|e| CalcError::serialization(e.to_string()))
}

/// Inverse of the JSON export.
pub fn parse_json_export(blob: &str) -> CoreResult<Vec<HistoryItem>> {
    let records: Vec<ExportRecord> =
        serde_json::from_str(blob).map_err(|e| CalcError::serialization(format!("Invalid export JSON: {}", e)))?;
    Ok(records.into_iter().map(|r| r.item).collect())
}

pub fn render_csv<Tz: TimeZone>(items: &[HistoryItem], tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(CSV_HEADERS.map(quote).join(","));

    for item in items {
        let inputs = serde_json::to_string(&readable_inputs(&item.request)).unwrap_or_default();
        let row = [
            item.timestamp.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string(),
            item.request.standard.label().to_string(),
            item.request.mode.label().to_string(),
            item.request.mode.target_label(),
            summarize(item).result_summary,
            inputs,
        ];
        lines.push(row.iter().map(|f| quote(f)).collect::<Vec<_>>().join(","));
    }

    let mut out = String::new();
    out.push(BOM);
    out.push_str(&lines.join("\r\n"));
    out.push_str("\r\n");
    out
}

/// RFC 4180: wrap in quotes, double any embedded quote
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
