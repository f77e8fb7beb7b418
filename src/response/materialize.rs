//! Response materialization.
//!
//! Rows leave the engine through one of three serializations: a JSON
//! envelope, CSV with an attachment filename hint, or a GeoJSON
//! FeatureCollection. Internal bookkeeping columns never leave.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};

use crate::store::{Row, Store};
use crate::validator::{NormalizedQuery, OutputFormat, ValidationErrors};

use super::errors::{ResponseError, ResponseResult};

/// Columns the ingest pipeline maintains for its own use.
const INTERNAL_COLUMNS: &[&str] = &["hash", "point_date", "geom"];

/// A wire-ready response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    /// Body plus the `Content-Disposition` attachment filename hint.
    Csv { filename: String, body: String },
    GeoJson(Value),
}

/// The `{meta, objects}` success envelope.
pub fn envelope(message: Value, query: Value, objects: Value) -> Value {
    json!({
        "meta": {
            "status": "ok",
            "message": message,
            "query": query,
        },
        "objects": objects,
    })
}

/// The rejection envelope: status `error`, the field→message map as
/// the message, no objects.
pub fn error_envelope(errors: &ValidationErrors) -> Value {
    json!({
        "meta": {
            "status": "error",
            "message": errors.to_value(),
            "query": Value::Null,
        },
        "objects": [],
    })
}

/// Serializes result rows for one dataset.
pub struct Materializer<'a, S: Store> {
    store: &'a S,
}

impl<'a, S: Store> Materializer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Materializes rows in the query's requested format. `today`
    /// feeds the CSV attachment filename.
    pub fn materialize(
        &self,
        rows: Vec<Row>,
        query: &NormalizedQuery,
        dataset: &str,
        geometry_column: Option<&str>,
        warnings: &[String],
        today: NaiveDate,
    ) -> ResponseResult<Payload> {
        match query.format {
            OutputFormat::Json => Ok(Payload::Json(self.json(rows, query, warnings))),
            OutputFormat::Csv => Ok(Payload::Csv {
                filename: format!("{}_{}.csv", dataset, today.format("%Y-%m-%d")),
                body: csv_body(rows)?,
            }),
            OutputFormat::GeoJson => {
                let column = geometry_column.ok_or(ResponseError::MissingGeometryColumn)?;
                Ok(Payload::GeoJson(self.feature_collection(rows, column)))
            }
        }
    }

    fn json(&self, rows: Vec<Row>, query: &NormalizedQuery, warnings: &[String]) -> Value {
        let objects: Vec<Value> = rows
            .into_iter()
            .map(|row| Value::Object(strip_internal(row)))
            .collect();
        let message = if warnings.is_empty() {
            Value::Array(vec![])
        } else {
            json!(warnings)
        };
        envelope(message, query.echo(), Value::Array(objects))
    }

    /// One Feature per row; rows whose geometry will not decode are
    /// skipped rather than failing the response.
    pub fn feature_collection(&self, rows: Vec<Row>, geometry_column: &str) -> Value {
        let features: Vec<Value> = rows
            .into_iter()
            .filter_map(|row| {
                let geometry = row
                    .get(geometry_column)
                    .and_then(Value::as_str)
                    .and_then(|encoded| self.store.decode_geometry(encoded).ok())?;
                let mut properties = Map::new();
                for (column, value) in row {
                    if column == geometry_column || INTERNAL_COLUMNS.contains(&column.as_str()) {
                        continue;
                    }
                    properties.insert(column, value);
                }
                Some(json!({
                    "type": "Feature",
                    "geometry": geometry,
                    "properties": properties,
                }))
            })
            .collect();
        json!({"type": "FeatureCollection", "features": features})
    }
}

fn strip_internal(row: Row) -> Map<String, Value> {
    row.into_iter()
        .filter(|(column, _)| !INTERNAL_COLUMNS.contains(&column.as_str()))
        .collect()
}

/// CSV text: header from the first row's stripped key set; every later
/// row must match it exactly. An empty result has no row to take the
/// header from, so it yields an empty body rather than a lone header.
fn csv_body(rows: Vec<Row>) -> ResponseResult<String> {
    let mut stripped = rows.into_iter().map(strip_internal);
    let Some(first) = stripped.next() else {
        return Ok(String::new());
    };
    let header: Vec<String> = first.keys().cloned().collect();

    let mut out = String::new();
    write_record(&mut out, header.iter().map(String::as_str));
    write_row(&mut out, &header, &first);

    for (index, row) in stripped.enumerate() {
        let keys: Vec<&String> = row.keys().collect();
        if keys.len() != header.len() || !header.iter().all(|k| row.contains_key(k)) {
            // Row index 0 is the header-defining row.
            return Err(ResponseError::HeterogeneousRows { row: index + 1 });
        }
        write_row(&mut out, &header, &row);
    }
    Ok(out)
}

fn write_row(out: &mut String, header: &[String], row: &Map<String, Value>) {
    let cells: Vec<String> = header
        .iter()
        .map(|column| match row.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        })
        .collect();
    write_record(out, cells.iter().map(String::as_str));
}

fn write_record<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for cell in cells {
        if !first {
            out.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
        first = false;
    }
    out.push_str("\r\n");
}
