//! Schema Catalog errors.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for catalog resolution.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while resolving a dataset descriptor.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// No table matches the requested dataset name.
    #[error("no dataset named {0}")]
    DatasetNotFound(String),

    /// The table exists but reported no columns.
    #[error("dataset {0} has an empty column map")]
    EmptyColumnMap(String),

    /// Introspection itself failed.
    #[error("store introspection failed: {0}")]
    Store(#[from] StoreError),
}
