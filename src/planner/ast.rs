//! Planned read-query structures.
//!
//! A `ReadQuery` is the immutable, parametrized plan handed to the
//! store for execution. It carries compiled predicates only; nothing in
//! it is raw request input.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::condition::Expr;

/// Units of temporal aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggUnit {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl AggUnit {
    pub fn parse(code: &str) -> Option<AggUnit> {
        match code {
            "day" => Some(AggUnit::Day),
            "week" => Some(AggUnit::Week),
            "month" => Some(AggUnit::Month),
            "quarter" => Some(AggUnit::Quarter),
            "year" => Some(AggUnit::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggUnit::Day => "day",
            AggUnit::Week => "week",
            AggUnit::Month => "month",
            AggUnit::Quarter => "quarter",
            AggUnit::Year => "year",
        }
    }

    /// Truncates a timestamp to the start of its bucket. Weeks start
    /// Monday; quarters on January, April, July, October.
    pub fn truncate(&self, at: NaiveDateTime) -> NaiveDate {
        let date = at.date();
        match self {
            AggUnit::Day => date,
            AggUnit::Week => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            AggUnit::Month => date.with_day(1).unwrap_or(date),
            AggUnit::Quarter => {
                let quarter_month = ((date.month() - 1) / 3) * 3 + 1;
                NaiveDate::from_ymd_opt(date.year(), quarter_month, 1).unwrap_or(date)
            }
            AggUnit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }
}

/// Sort specification for row queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// Plain row select with paging.
#[derive(Debug, Clone, Serialize)]
pub struct SelectQuery {
    pub table: String,
    pub predicate: Option<Expr>,
    pub order: Option<OrderBy>,
    pub limit: Option<u64>,
    pub offset: u64,
}

/// Time-bucketed count aggregation over one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct TimeBucketQuery {
    /// Dataset identity carried through to the merged panel.
    pub dataset_name: String,
    pub table: String,
    pub date_column: String,
    pub unit: AggUnit,
    pub predicate: Option<Expr>,
}

/// Snap-to-grid count aggregation over a point dataset.
#[derive(Debug, Clone, Serialize)]
pub struct GridQuery {
    pub table: String,
    pub geometry_column: String,
    pub predicate: Option<Expr>,
    /// Cell width in degrees of longitude.
    pub cell_x: f64,
    /// Cell height in degrees of latitude.
    pub cell_y: f64,
}

/// Master/detail join through the declared business key.
#[derive(Debug, Clone, Serialize)]
pub struct DetailJoinQuery {
    pub master_table: String,
    pub master_key: String,
    pub master_date_column: String,
    pub detail_table: String,
    pub detail_key: String,
    pub predicate: Option<Expr>,
    pub detail_predicate: Option<Expr>,
    pub limit: Option<u64>,
    pub offset: u64,
}

/// Containment join between point rows and a polygon dataset.
#[derive(Debug, Clone, Serialize)]
pub struct ShapeJoinQuery {
    pub point_table: String,
    pub point_geometry_column: String,
    pub shape_table: String,
    pub shape_geometry_column: String,
    pub predicate: Option<Expr>,
    pub shape_predicate: Option<Expr>,
    /// Aggregate point counts per polygon instead of emitting joined rows.
    pub per_shape_counts: bool,
    pub order: Option<OrderBy>,
    pub limit: Option<u64>,
    pub offset: u64,
}

/// One planned, executable read statement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadQuery {
    Select(SelectQuery),
    TimeBucket(TimeBucketQuery),
    Grid(GridQuery),
    DetailJoin(DetailJoinQuery),
    ShapeJoin(ShapeJoinQuery),
}
