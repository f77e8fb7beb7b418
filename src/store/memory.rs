//! In-memory reference store.
//!
//! Interprets read plans over rows held in plain maps. This is the
//! executable definition of plan semantics: truncation, pattern
//! matching, containment and join behavior here are what every other
//! store implementation must reproduce.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::Timelike;
use regex::RegexBuilder;
use serde_json::{json, Value};

use crate::catalog::{ColumnInfo, DatasetMeta, SemanticType};
use crate::condition::{parse_date, Expr, Operator, Scalar};
use crate::geometry;
use crate::planner::{
    DetailJoinQuery, GridQuery, OrderBy, ReadQuery, SelectQuery, ShapeJoinQuery, TimeBucketQuery,
};

use super::errors::{StoreError, StoreResult};
use super::{Row, Store};

/// One table of rows with a declared column list.
#[derive(Debug, Clone)]
pub struct MemoryTable {
    pub name: String,
    columns: Vec<ColumnInfo>,
    rows: Vec<Row>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, deriving the `hash` row identity from the row
    /// content when the table declares a hash column and the row does
    /// not carry one.
    pub fn push_row(&mut self, mut row: Row) {
        let needs_hash =
            self.columns.iter().any(|c| c.name == "hash") && !row.contains_key("hash");
        if needs_hash {
            row.insert("hash".to_string(), Value::String(content_hash(&row)));
        }
        self.rows.push(row);
    }

    pub fn column_type(&self, column: &str) -> Option<SemanticType> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.semantic_type)
    }
}

/// Ingest-time row identity: CRC-32 over the key-sorted row text.
fn content_hash(row: &Row) -> String {
    let sorted: BTreeMap<&String, &Value> = row.iter().collect();
    let text = serde_json::to_string(&sorted).unwrap_or_default();
    format!("{:08x}", crc32fast::hash(text.as_bytes()))
}

/// A set of tables plus their registration records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, MemoryTable>,
    metas: BTreeMap<String, DatasetMeta>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: MemoryTable) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn set_meta(&mut self, meta: DatasetMeta) {
        self.metas.insert(meta.dataset_name.clone(), meta);
    }

    fn table(&self, name: &str) -> StoreResult<&MemoryTable> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::NoSuchTable(name.to_string()))
    }

    fn select(&self, query: &SelectQuery) -> StoreResult<Vec<Row>> {
        let table = self.table(&query.table)?;
        let mut rows: Vec<Row> = table
            .rows
            .iter()
            .filter(|row| eval_predicate(query.predicate.as_ref(), row, table))
            .cloned()
            .collect();
        if let Some(order) = &query.order {
            sort_rows(&mut rows, order, table);
        }
        Ok(page(rows, query.offset, query.limit))
    }

    fn time_bucket(&self, query: &TimeBucketQuery) -> StoreResult<Vec<Row>> {
        let table = self.table(&query.table)?;
        let mut counts: BTreeMap<chrono::NaiveDate, u64> = BTreeMap::new();
        for row in &table.rows {
            if !eval_predicate(query.predicate.as_ref(), row, table) {
                continue;
            }
            let at = match row
                .get(&query.date_column)
                .and_then(Value::as_str)
                .and_then(parse_date)
            {
                Some(at) => at,
                None => continue,
            };
            *counts.entry(query.unit.truncate(at)).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(bucket, count)| {
                let mut row = Row::new();
                row.insert(
                    "dataset_name".to_string(),
                    Value::String(query.dataset_name.clone()),
                );
                row.insert(
                    "time_bucket".to_string(),
                    Value::String(format!("{}T00:00:00", bucket.format("%Y-%m-%d"))),
                );
                row.insert("count".to_string(), json!(count));
                row
            })
            .collect())
    }

    fn grid(&self, query: &GridQuery) -> StoreResult<Vec<Row>> {
        let table = self.table(&query.table)?;
        if query.cell_x <= 0.0 || query.cell_y <= 0.0 {
            return Err(StoreError::Execution(format!(
                "non-positive grid cell: {} x {}",
                query.cell_x, query.cell_y
            )));
        }
        // Integer cell indices keep the map keys exact; snapping back
        // to coordinates happens only on output.
        let mut counts: BTreeMap<(i64, i64), u64> = BTreeMap::new();
        for row in &table.rows {
            if !eval_predicate(query.predicate.as_ref(), row, table) {
                continue;
            }
            let (x, y) = match row_point(row, &query.geometry_column) {
                Some(point) => point,
                None => continue,
            };
            let ix = (x / query.cell_x).round() as i64;
            let iy = (y / query.cell_y).round() as i64;
            *counts.entry((ix, iy)).or_insert(0) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|((ix, iy), count)| {
                let snapped = json!({
                    "type": "Point",
                    "coordinates": [ix as f64 * query.cell_x, iy as f64 * query.cell_y],
                });
                let mut row = Row::new();
                row.insert("count".to_string(), json!(count));
                row.insert("geom".to_string(), Value::String(snapped.to_string()));
                row
            })
            .collect())
    }

    fn detail_join(&self, query: &DetailJoinQuery) -> StoreResult<Vec<Row>> {
        let master = self.table(&query.master_table)?;
        let detail = self.table(&query.detail_table)?;

        let mut detail_index: BTreeMap<String, Vec<&Row>> = BTreeMap::new();
        for row in &detail.rows {
            if !eval_predicate(query.detail_predicate.as_ref(), row, detail) {
                continue;
            }
            if let Some(key) = key_text(row, &query.detail_key) {
                detail_index.entry(key).or_default().push(row);
            }
        }

        let mut masters: Vec<&Row> = master
            .rows
            .iter()
            .filter(|row| eval_predicate(query.predicate.as_ref(), row, master))
            .collect();
        let order = OrderBy::desc(query.master_date_column.clone());
        sort_row_refs(&mut masters, &order, master);

        let mut merged = Vec::new();
        for master_row in masters {
            let key = match key_text(master_row, &query.master_key) {
                Some(key) => key,
                None => continue,
            };
            let Some(matches) = detail_index.get(&key) else {
                continue;
            };
            for detail_row in matches {
                let mut out = master_row.clone();
                for (column, value) in detail_row.iter() {
                    if column == &query.detail_key {
                        continue;
                    }
                    let name = if out.contains_key(column) {
                        format!("{}.{}", query.detail_table, column)
                    } else {
                        column.clone()
                    };
                    out.insert(name, value.clone());
                }
                merged.push(out);
            }
        }
        Ok(page(merged, query.offset, query.limit))
    }

    fn shape_join(&self, query: &ShapeJoinQuery) -> StoreResult<Vec<Row>> {
        let points = self.table(&query.point_table)?;
        let shapes = self.table(&query.shape_table)?;

        // (shape row, decoded polygon) pairs surviving the shape filter.
        let mut polygons: Vec<(&Row, Value)> = Vec::new();
        for row in &shapes.rows {
            if !eval_predicate(query.shape_predicate.as_ref(), row, shapes) {
                continue;
            }
            let encoded = match row.get(&query.shape_geometry_column).and_then(Value::as_str) {
                Some(text) => text,
                None => continue,
            };
            let polygon = self.decode_geometry(encoded)?;
            polygons.push((row, polygon));
        }

        let mut matching: Vec<&Row> = points
            .rows
            .iter()
            .filter(|row| eval_predicate(query.predicate.as_ref(), row, points))
            .collect();
        if let Some(order) = &query.order {
            sort_row_refs(&mut matching, order, points);
        }

        if query.per_shape_counts {
            let mut out = Vec::new();
            for (shape_row, polygon) in &polygons {
                let count = matching
                    .iter()
                    .filter(|row| {
                        row_point(row, &query.point_geometry_column)
                            .is_some_and(|(x, y)| geometry::contains(polygon, x, y))
                    })
                    .count() as u64;
                if count == 0 {
                    continue;
                }
                let mut row = (*shape_row).clone();
                row.insert("count".to_string(), json!(count));
                out.push(row);
            }
            return Ok(out);
        }

        let mut joined = Vec::new();
        for point_row in matching {
            let Some((x, y)) = row_point(point_row, &query.point_geometry_column) else {
                continue;
            };
            for (shape_row, polygon) in &polygons {
                if !geometry::contains(polygon, x, y) {
                    continue;
                }
                let mut out = point_row.clone();
                for (column, value) in shape_row.iter() {
                    if column == &query.shape_geometry_column {
                        continue;
                    }
                    out.insert(format!("{}.{}", query.shape_table, column), value.clone());
                }
                joined.push(out);
            }
        }
        Ok(page(joined, query.offset, query.limit))
    }
}

impl Store for MemoryStore {
    fn table_columns(&self, table: &str) -> StoreResult<Vec<ColumnInfo>> {
        Ok(self.table(table)?.columns.clone())
    }

    fn dataset_meta(&self, dataset: &str) -> Option<DatasetMeta> {
        self.metas.get(dataset).cloned()
    }

    fn execute(&self, query: &ReadQuery) -> StoreResult<Vec<Row>> {
        match query {
            ReadQuery::Select(q) => self.select(q),
            ReadQuery::TimeBucket(q) => self.time_bucket(q),
            ReadQuery::Grid(q) => self.grid(q),
            ReadQuery::DetailJoin(q) => self.detail_join(q),
            ReadQuery::ShapeJoin(q) => self.shape_join(q),
        }
    }

    fn decode_geometry(&self, encoded: &str) -> StoreResult<Value> {
        let value: Value = serde_json::from_str(encoded)
            .map_err(|e| StoreError::GeometryDecode(e.to_string()))?;
        if value.get("type").and_then(Value::as_str).is_none() {
            return Err(StoreError::GeometryDecode(
                "missing geometry type".to_string(),
            ));
        }
        Ok(value)
    }
}

fn eval_predicate(predicate: Option<&Expr>, row: &Row, table: &MemoryTable) -> bool {
    predicate.map_or(true, |expr| eval(expr, row, table))
}

fn eval(expr: &Expr, row: &Row, table: &MemoryTable) -> bool {
    match expr {
        Expr::And(children) => children.iter().all(|c| eval(c, row, table)),
        Expr::Or(children) => children.iter().any(|c| eval(c, row, table)),
        Expr::NullTest { column, negated } => {
            let is_null = matches!(row.get(column), None | Some(Value::Null));
            is_null != *negated
        }
        Expr::Compare { column, op, value } => {
            let Some(actual) = row_scalar(row, column, table) else {
                return false;
            };
            match op {
                Operator::Like => matches_pattern(&actual, value, false),
                Operator::Ilike => matches_pattern(&actual, value, true),
                _ => match actual.compare(value) {
                    Some(ordering) => ordering_holds(*op, ordering),
                    None => false,
                },
            }
        }
        Expr::InList { column, values } => {
            let Some(actual) = row_scalar(row, column, table) else {
                return false;
            };
            values
                .iter()
                .any(|v| actual.compare(v) == Some(Ordering::Equal))
        }
        Expr::HourOfDay { column, op, hour } => {
            let Some(at) = row.get(column).and_then(Value::as_str).and_then(parse_date) else {
                return false;
            };
            ordering_holds(*op, at.hour().cmp(hour))
        }
        Expr::Within { column, fragment } => row_point(row, column)
            .is_some_and(|(x, y)| geometry::contains(fragment, x, y)),
    }
}

fn ordering_holds(op: Operator, ordering: Ordering) -> bool {
    match op {
        Operator::Eq => ordering == Ordering::Equal,
        Operator::Ne => ordering != Ordering::Equal,
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Ge => ordering != Ordering::Less,
        Operator::Lt => ordering == Ordering::Less,
        Operator::Le => ordering != Ordering::Greater,
        _ => false,
    }
}

/// SQL LIKE over the row text: `%` matches any run, `_` one character.
fn matches_pattern(actual: &Scalar, pattern: &Scalar, case_insensitive: bool) -> bool {
    let (Some(text), Some(pattern)) = (actual.as_text(), pattern.as_text()) else {
        return false;
    };
    let mut expr = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    RegexBuilder::new(&expr)
        .case_insensitive(case_insensitive)
        .build()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// The row's cell coerced to its column's semantic type. Null and
/// missing cells yield None, so comparisons against them never hold.
fn row_scalar(row: &Row, column: &str, table: &MemoryTable) -> Option<Scalar> {
    let ty = table.column_type(column)?;
    let cell = row.get(column)?;
    if cell.is_null() {
        return None;
    }
    Scalar::coerce(cell, ty).ok()
}

/// Decodes the row's geometry cell as a GeoJSON point.
fn row_point(row: &Row, column: &str) -> Option<(f64, f64)> {
    let text = row.get(column)?.as_str()?;
    let value: Value = serde_json::from_str(text).ok()?;
    if value.get("type")?.as_str()? != "Point" {
        return None;
    }
    let coords = value.get("coordinates")?.as_array()?;
    Some((coords.first()?.as_f64()?, coords.get(1)?.as_f64()?))
}

fn key_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn compare_rows(a: &Row, b: &Row, order: &OrderBy, table: &MemoryTable) -> Ordering {
    let left = row_scalar(a, &order.column, table);
    let right = row_scalar(b, &order.column, table);
    let ordering = match (left, right) {
        (Some(l), Some(r)) => l.compare(&r).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    if order.descending {
        ordering.reverse()
    } else {
        ordering
    }
}

fn sort_rows(rows: &mut [Row], order: &OrderBy, table: &MemoryTable) {
    rows.sort_by(|a, b| compare_rows(a, b, order, table));
}

fn sort_row_refs(rows: &mut [&Row], order: &OrderBy, table: &MemoryTable) {
    rows.sort_by(|a, b| compare_rows(a, b, order, table));
}

fn page(rows: Vec<Row>, offset: u64, limit: Option<u64>) -> Vec<Row> {
    let iter = rows.into_iter().skip(offset as usize);
    match limit {
        Some(limit) => iter.take(limit as usize).collect(),
        None => iter.collect(),
    }
}
