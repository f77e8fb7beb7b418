//! Declarative request-field specifications.
//!
//! Every recognized top-level parameter is one entry in `FIELD_SPECS`
//! with its coercion rule. Column-filter parameters (`field__op` and
//! `<dataset>__filter`) are not listed here; they are recognized
//! structurally after this table has claimed its names.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::condition::parse_date;
use crate::geometry;

use super::errors::{NOT_A_VALID_CHOICE, NOT_A_VALID_DATE, NOT_A_VALID_INTEGER};

/// How a raw parameter value becomes a typed one.
#[derive(Debug, Clone, Copy)]
pub enum Coercion {
    /// One of a fixed set of codes.
    Choice(&'static [&'static str]),
    /// Permissively parsed date.
    Date,
    /// Integer within an inclusive range.
    Integer { min: i64, max: i64 },
    /// GeoJSON text reducing to a single geometry fragment.
    Geometry,
    /// A dataset name, resolved later against the catalog.
    Dataset,
    /// Comma-separated dataset names.
    DatasetList,
}

/// A coerced parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Code(&'static str),
    Int(i64),
    Date(NaiveDateTime),
    Geometry(Value),
    Datasets(Vec<String>),
}

/// One recognized request parameter.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub coercion: Coercion,
}

pub const AGG_CHOICES: &[&str] = &["day", "week", "month", "quarter", "year"];
pub const FORMAT_CHOICES: &[&str] = &["json", "csv", "geojson"];

pub const FIELD_SPECS: &[FieldSpec] = &[
    FieldSpec {
        name: "agg",
        coercion: Coercion::Choice(AGG_CHOICES),
    },
    FieldSpec {
        name: "buffer",
        coercion: Coercion::Integer {
            min: 0,
            max: 100_000,
        },
    },
    FieldSpec {
        name: "data_type",
        coercion: Coercion::Choice(FORMAT_CHOICES),
    },
    FieldSpec {
        name: "dataset_name",
        coercion: Coercion::Dataset,
    },
    FieldSpec {
        name: "dataset_name__in",
        coercion: Coercion::DatasetList,
    },
    FieldSpec {
        name: "date__time_of_day_ge",
        coercion: Coercion::Integer { min: 0, max: 23 },
    },
    FieldSpec {
        name: "date__time_of_day_le",
        coercion: Coercion::Integer { min: 0, max: 23 },
    },
    FieldSpec {
        name: "limit",
        coercion: Coercion::Integer {
            min: 0,
            max: i64::MAX,
        },
    },
    FieldSpec {
        name: "location_geom__within",
        coercion: Coercion::Geometry,
    },
    FieldSpec {
        name: "obs_date__ge",
        coercion: Coercion::Date,
    },
    FieldSpec {
        name: "obs_date__le",
        coercion: Coercion::Date,
    },
    FieldSpec {
        name: "offset",
        coercion: Coercion::Integer {
            min: 0,
            max: i64::MAX,
        },
    },
    FieldSpec {
        name: "resolution",
        coercion: Coercion::Integer {
            min: 1,
            max: 1_000_000,
        },
    },
    FieldSpec {
        name: "shape",
        coercion: Coercion::Dataset,
    },
];

pub fn spec_for(name: &str) -> Option<&'static FieldSpec> {
    FIELD_SPECS.iter().find(|spec| spec.name == name)
}

impl FieldSpec {
    /// Coerces a raw value, or the field-scoped rejection message.
    /// An explicit empty value always fails; defaults apply only when
    /// a field is entirely absent.
    pub fn coerce(&self, raw: &str) -> Result<Coerced, String> {
        match self.coercion {
            Coercion::Choice(choices) => choices
                .iter()
                .copied()
                .find(|c| *c == raw)
                .map(Coerced::Code)
                .ok_or_else(|| NOT_A_VALID_CHOICE.to_string()),
            Coercion::Date => parse_date(raw)
                .map(Coerced::Date)
                .ok_or_else(|| NOT_A_VALID_DATE.to_string()),
            Coercion::Integer { min, max } => match raw.trim().parse::<i64>() {
                Ok(n) if n >= min && n <= max => Ok(Coerced::Int(n)),
                _ => Err(NOT_A_VALID_INTEGER.to_string()),
            },
            Coercion::Geometry => geometry::extract_fragment(raw)
                .map(Coerced::Geometry)
                .map_err(|e| e.to_string()),
            Coercion::Dataset => {
                if raw.trim().is_empty() {
                    Err(NOT_A_VALID_CHOICE.to_string())
                } else {
                    Ok(Coerced::Datasets(vec![raw.trim().to_string()]))
                }
            }
            Coercion::DatasetList => {
                let names: Vec<String> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                if names.is_empty() {
                    Err(NOT_A_VALID_CHOICE.to_string())
                } else {
                    Ok(Coerced::Datasets(names))
                }
            }
        }
    }
}
