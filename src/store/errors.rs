//! Store error types.

use thiserror::Error;

/// Failures raised by a backing store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The named table does not exist.
    #[error("no such table: {0}")]
    NoSuchTable(String),

    /// A stored geometry value could not be decoded.
    #[error("could not decode stored geometry: {0}")]
    GeometryDecode(String),

    /// The store failed while executing a plan.
    #[error("query execution failed: {0}")]
    Execution(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
