//! The normalized query specification.
//!
//! Built once by validation, immutable afterward, and the sole input
//! to planning. Serializes cleanly so responses can echo back exactly
//! what was executed.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::condition::Expr;
use crate::planner::AggUnit;

/// Inclusive observation-time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeWindow {
    pub lower: NaiveDateTime,
    pub upper: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(lower: NaiveDateTime, upper: NaiveDateTime) -> Self {
        Self { lower, upper }
    }
}

/// Requested serialization of the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    GeoJson,
}

impl OutputFormat {
    pub fn parse(code: &str) -> Option<OutputFormat> {
        match code {
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            "geojson" => Some(OutputFormat::GeoJson),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::GeoJson => "geojson",
        }
    }
}

/// A fully validated, defaulted, immutable query specification.
///
/// Every field is either an explicit request value that survived
/// validation or a documented default. Raw request text never leaves
/// the validator.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedQuery {
    /// Target datasets, in request order.
    pub datasets: Vec<String>,
    pub window: TimeWindow,
    /// Extracted geometry fragment, prior to any buffering.
    pub geometry: Option<serde_json::Value>,
    /// Buffer radius applied to linear geometry fragments.
    pub buffer_meters: f64,
    /// Grid cell edge length for spatial aggregation.
    pub resolution_meters: f64,
    pub hour_lower: Option<u32>,
    pub hour_upper: Option<u32>,
    /// Compiled per-dataset condition trees, keyed by dataset name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, Expr>,
    pub agg: AggUnit,
    pub format: OutputFormat,
    pub limit: u64,
    pub offset: u64,
    /// Polygon dataset to join against, when requested.
    pub shape: Option<String>,
}

impl NormalizedQuery {
    pub fn filter_for(&self, dataset: &str) -> Option<&Expr> {
        self.filters.get(dataset)
    }

    /// JSON echo of the executed specification, embedded in response
    /// envelopes under `meta.query`.
    pub fn echo(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
