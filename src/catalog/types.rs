//! Dataset descriptor types.
//!
//! A `DatasetDescriptor` is resolved per request by introspecting the
//! live store. It is valid for the lifetime of that request only and is
//! threaded by value through the validator, compiler and planner.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Semantic column types the engine can filter and aggregate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point
    Float,
    /// Boolean
    Boolean,
    /// Date or date-time
    Timestamp,
    /// Geospatial geometry (point, line or polygon)
    Geometry,
}

impl SemanticType {
    /// Returns the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::Integer => "integer",
            SemanticType::Float => "float",
            SemanticType::Boolean => "boolean",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Geometry => "geometry",
        }
    }

    /// Numeric types share an operator whitelist.
    pub fn is_numeric(&self) -> bool {
        matches!(self, SemanticType::Integer | SemanticType::Float)
    }
}

/// One column of a live table, as reported by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Semantic type
    pub semantic_type: SemanticType,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }
}

/// Catalog metadata for one dataset, when the store carries it.
///
/// Mirrors the registration record an ETL pipeline would have written:
/// which columns hold the observation date, the geometry and the natural
/// unique identifier, plus the observed spatial/temporal bounds used to
/// narrow multi-dataset queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetMeta {
    /// Machine name of the dataset
    pub dataset_name: String,
    /// Human-readable name, if registered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub human_name: Option<String>,
    /// Column holding the observation date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_column: Option<String>,
    /// Column holding the geometry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry_column: Option<String>,
    /// Column declared as the natural unique identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_key: Option<String>,
    /// Earliest observation date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obs_from: Option<NaiveDate>,
    /// Latest observation date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obs_to: Option<NaiveDate>,
    /// Bounding box of all observations, as a GeoJSON polygon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<serde_json::Value>,
}

/// Resolved per-request metadata for one named table.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetDescriptor {
    /// Dataset name as requested
    pub name: String,
    /// Handle of the backing table
    pub table: String,
    /// Column name to semantic type
    pub columns: BTreeMap<String, SemanticType>,
    /// Column holding the observation date, if any
    pub date_column: Option<String>,
    /// Column holding the geometry, if any
    pub geometry_column: Option<String>,
    /// Column declared as the natural unique identifier, if any
    pub business_key: Option<String>,
}

impl DatasetDescriptor {
    /// Looks up a column's semantic type.
    pub fn column_type(&self, column: &str) -> Option<SemanticType> {
        self.columns.get(column).copied()
    }

    /// Returns true if the descriptor knows the column.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_descriptor() -> DatasetDescriptor {
        let mut columns = BTreeMap::new();
        columns.insert("event_type".to_string(), SemanticType::String);
        columns.insert("point_date".to_string(), SemanticType::Timestamp);
        columns.insert("geom".to_string(), SemanticType::Geometry);

        DatasetDescriptor {
            name: "flu_shot_clinics".to_string(),
            table: "flu_shot_clinics".to_string(),
            columns,
            date_column: Some("point_date".to_string()),
            geometry_column: Some("geom".to_string()),
            business_key: Some("hash".to_string()),
        }
    }

    #[test]
    fn test_column_lookup() {
        let desc = sample_descriptor();
        assert_eq!(desc.column_type("event_type"), Some(SemanticType::String));
        assert_eq!(desc.column_type("nope"), None);
        assert!(desc.has_column("geom"));
    }

    #[test]
    fn test_numeric_classification() {
        assert!(SemanticType::Integer.is_numeric());
        assert!(SemanticType::Float.is_numeric());
        assert!(!SemanticType::Timestamp.is_numeric());
        assert!(!SemanticType::Geometry.is_numeric());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(SemanticType::String.type_name(), "string");
        assert_eq!(SemanticType::Geometry.type_name(), "geometry");
    }
}
