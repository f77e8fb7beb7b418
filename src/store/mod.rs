//! Backing-store abstraction.
//!
//! The engine never speaks a storage dialect. It plans `ReadQuery`
//! values and hands them to a `Store` for execution; the store reports
//! its live tables back for per-request schema resolution. The
//! in-memory implementation in [`memory`] is both the test double and
//! the reference interpreter for plan semantics.

mod errors;
pub mod memory;

pub use crate::catalog::{ColumnInfo, DatasetMeta};
pub use errors::{StoreError, StoreResult};

use crate::planner::ReadQuery;

/// One result row. Values use the store's native JSON encodings:
/// timestamps as ISO-8601 text, geometry as GeoJSON text.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A queryable dataset store.
///
/// Implementations are shared read-only across request threads.
pub trait Store: Send + Sync {
    /// Lists the live columns of a table, or `NoSuchTable`.
    fn table_columns(&self, table: &str) -> StoreResult<Vec<ColumnInfo>>;

    /// The registration record for a dataset, when one exists.
    fn dataset_meta(&self, dataset: &str) -> Option<DatasetMeta>;

    /// Executes a planned read query.
    fn execute(&self, query: &ReadQuery) -> StoreResult<Vec<Row>>;

    /// Decodes a stored geometry value to GeoJSON.
    fn decode_geometry(&self, encoded: &str) -> StoreResult<serde_json::Value>;
}
