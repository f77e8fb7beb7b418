//! Request validation.
//!
//! Turns raw request parameters into an immutable `NormalizedQuery`
//! plus resolved descriptors, or a per-field error map. All-or-nothing:
//! one failing field rejects the request, and no unvalidated value
//! ever reaches predicate construction.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use serde_json::Value;

use crate::catalog::{Catalog, DatasetDescriptor};
use crate::condition::{compile, compile_text, ConditionNode, Expr, Operator};
use crate::planner::AggUnit;
use crate::store::Store;

use super::errors::{ValidationErrors, NOT_A_VALID_CHOICE};
use super::fields::{self, Coerced};
use super::query::{NormalizedQuery, OutputFormat, TimeWindow};

/// Observation window fallback when no bounds are supplied.
const DEFAULT_WINDOW_DAYS: i64 = 90;
const DEFAULT_BUFFER_METERS: f64 = 100.0;
const DEFAULT_RESOLUTION_METERS: f64 = 500.0;
const DEFAULT_LIMIT: u64 = 1000;

/// A validated request: the query specification plus the descriptors
/// resolved while validating it, so callers never resolve twice.
#[derive(Debug, Clone)]
pub struct Validated {
    pub query: NormalizedQuery,
    /// Descriptors in `query.datasets` order.
    pub descriptors: Vec<DatasetDescriptor>,
    pub shape: Option<DatasetDescriptor>,
    /// Unused-parameter notices, surfaced in `meta.message`.
    pub warnings: Vec<String>,
}

/// Validates raw parameters against the live catalog.
pub struct Validator<'a, S: Store> {
    catalog: Catalog<'a, S>,
}

impl<'a, S: Store> Validator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            catalog: Catalog::new(store),
        }
    }

    /// Full validation pass. `now` anchors the default observation
    /// window, injected so tests are reproducible.
    pub fn validate(
        &self,
        params: &[(String, String)],
        now: NaiveDateTime,
    ) -> Result<Validated, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut warnings = Vec::new();
        let mut coerced: BTreeMap<&'static str, Coerced> = BTreeMap::new();

        // (param key, target dataset, raw tree json)
        let mut tree_params: Vec<(&str, &str, &str)> = Vec::new();
        // (param key, column, operator code, raw value)
        let mut column_params: Vec<(&str, &str, &str, &str)> = Vec::new();
        // (param key, raw value): bare names checked against columns last
        let mut bare_params: Vec<(&str, &str)> = Vec::new();

        for (key, raw) in params {
            if let Some(spec) = fields::spec_for(key) {
                match spec.coerce(raw) {
                    Ok(value) => {
                        coerced.insert(spec.name, value);
                    }
                    Err(message) => errors.push(key.clone(), message),
                }
                continue;
            }
            if let Some(dataset) = key.strip_suffix("__filter") {
                tree_params.push((key, dataset, raw));
                continue;
            }
            if let Some((column, op_code)) = key.rsplit_once("__") {
                if Operator::parse(op_code).is_some() {
                    column_params.push((key, column, op_code, raw));
                    continue;
                }
            }
            bare_params.push((key, raw));
        }

        // Dataset resolution comes before any column checks; nothing
        // else can be validated against an unresolved dataset.
        let mut dataset_names: Vec<(String, &'static str)> = Vec::new();
        if let Some(Coerced::Datasets(names)) = coerced.get("dataset_name") {
            for name in names {
                dataset_names.push((name.clone(), "dataset_name"));
            }
        }
        if let Some(Coerced::Datasets(names)) = coerced.get("dataset_name__in") {
            for name in names {
                if !dataset_names.iter().any(|(n, _)| n == name) {
                    dataset_names.push((name.clone(), "dataset_name__in"));
                }
            }
        }
        if dataset_names.is_empty()
            && errors.messages("dataset_name").is_empty()
            && errors.messages("dataset_name__in").is_empty()
        {
            errors.push("dataset_name", NOT_A_VALID_CHOICE);
        }

        let mut descriptors = Vec::new();
        for (name, field) in &dataset_names {
            match self.catalog.resolve(name) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(_) => errors.push(*field, NOT_A_VALID_CHOICE),
            }
        }

        let shape = match coerced.get("shape") {
            Some(Coerced::Datasets(names)) => {
                let name = &names[0];
                match self.catalog.resolve(name) {
                    Ok(descriptor) => Some(descriptor),
                    Err(_) => {
                        errors.push("shape", NOT_A_VALID_CHOICE);
                        None
                    }
                }
            }
            _ => None,
        };

        // Query-string column filters against the resolved columns.
        let mut filter_parts: BTreeMap<String, Vec<Expr>> = BTreeMap::new();
        for (key, column, op_code, raw) in column_params {
            Self::compile_column_filter(
                &descriptors,
                key,
                column,
                op_code,
                raw,
                true,
                &mut filter_parts,
                &mut errors,
                &mut warnings,
            );
        }
        for (key, raw) in bare_params {
            Self::compile_column_filter(
                &descriptors,
                key,
                key,
                "eq",
                raw,
                false,
                &mut filter_parts,
                &mut errors,
                &mut warnings,
            );
        }

        for (key, dataset, raw) in tree_params {
            let descriptor = descriptors
                .iter()
                .chain(shape.iter())
                .find(|d| d.name == dataset);
            match descriptor {
                None => errors.push(key, NOT_A_VALID_CHOICE),
                Some(descriptor) => match compile_text(raw, descriptor) {
                    Ok(expr) => filter_parts
                        .entry(descriptor.name.clone())
                        .or_default()
                        .push(expr),
                    Err(e) => errors.push(key, e.to_string()),
                },
            }
        }

        // Window bounds, defaulted only when entirely absent.
        let lower = match coerced.get("obs_date__ge") {
            Some(Coerced::Date(at)) => *at,
            _ => now - Duration::days(DEFAULT_WINDOW_DAYS),
        };
        let upper = match coerced.get("obs_date__le") {
            Some(Coerced::Date(at)) => *at,
            _ => now,
        };
        // Inversion is only meaningful when neither bound failed to
        // coerce; it reports alongside whatever else is wrong.
        let bounds_usable = errors.messages("obs_date__ge").is_empty()
            && errors.messages("obs_date__le").is_empty();
        if lower > upper && bounds_usable {
            errors.push("obs_date__ge", "may not follow obs_date__le");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let filters = filter_parts
            .into_iter()
            .filter_map(|(dataset, parts)| Expr::all(parts).map(|expr| (dataset, expr)))
            .collect();

        let query = NormalizedQuery {
            datasets: descriptors.iter().map(|d| d.name.clone()).collect(),
            window: TimeWindow::new(lower, upper),
            geometry: match coerced.get("location_geom__within") {
                Some(Coerced::Geometry(fragment)) => Some(fragment.clone()),
                _ => None,
            },
            buffer_meters: int_field(&coerced, "buffer")
                .map(|n| n as f64)
                .unwrap_or(DEFAULT_BUFFER_METERS),
            resolution_meters: int_field(&coerced, "resolution")
                .map(|n| n as f64)
                .unwrap_or(DEFAULT_RESOLUTION_METERS),
            hour_lower: int_field(&coerced, "date__time_of_day_ge").map(|n| n as u32),
            hour_upper: int_field(&coerced, "date__time_of_day_le").map(|n| n as u32),
            filters,
            agg: code_field(&coerced, "agg")
                .and_then(AggUnit::parse)
                .unwrap_or(AggUnit::Week),
            format: code_field(&coerced, "data_type")
                .and_then(OutputFormat::parse)
                .unwrap_or(OutputFormat::Json),
            limit: int_field(&coerced, "limit")
                .map(|n| n as u64)
                .unwrap_or(DEFAULT_LIMIT),
            offset: int_field(&coerced, "offset").map(|n| n as u64).unwrap_or(0),
            shape: shape.as_ref().map(|d| d.name.clone()),
        };

        Ok(Validated {
            query,
            descriptors,
            shape,
            warnings,
        })
    }

    /// Compiles one query-string column filter against the first
    /// resolved dataset carrying the column. A `field__op` name with a
    /// recognized operator but no matching column is a hard error;
    /// a bare unrecognized name is only a warning.
    #[allow(clippy::too_many_arguments)]
    fn compile_column_filter(
        descriptors: &[DatasetDescriptor],
        key: &str,
        column: &str,
        op_code: &str,
        raw: &str,
        column_required: bool,
        filter_parts: &mut BTreeMap<String, Vec<Expr>>,
        errors: &mut ValidationErrors,
        warnings: &mut Vec<String>,
    ) {
        let Some(descriptor) = descriptors.iter().find(|d| d.has_column(column)) else {
            if column_required {
                errors.push(key, format!("{column} is not a valid column"));
            } else {
                warnings.push(format!("Unused parameter value \"{key}={raw}\""));
            }
            return;
        };
        let node = ConditionNode::Comparison {
            column: column.to_string(),
            operator: op_code.to_string(),
            value: Value::String(raw.to_string()),
        };
        match compile(&node, descriptor) {
            Ok(expr) => filter_parts
                .entry(descriptor.name.clone())
                .or_default()
                .push(expr),
            Err(e) => errors.push(key, e.to_string()),
        }
    }
}

fn int_field(coerced: &BTreeMap<&'static str, Coerced>, name: &str) -> Option<i64> {
    match coerced.get(name) {
        Some(Coerced::Int(n)) => Some(*n),
        _ => None,
    }
}

fn code_field<'v>(coerced: &'v BTreeMap<&'static str, Coerced>, name: &str) -> Option<&'v str> {
    match coerced.get(name) {
        Some(Coerced::Code(code)) => Some(code),
        _ => None,
    }
}
