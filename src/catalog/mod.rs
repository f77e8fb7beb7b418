//! Schema Catalog
//!
//! Resolves dataset names to live table descriptors by introspecting
//! the store, once per request.

pub mod errors;
pub mod resolver;
pub mod types;

pub use errors::{CatalogError, CatalogResult};
pub use resolver::Catalog;
pub use types::{ColumnInfo, DatasetDescriptor, DatasetMeta, SemanticType};
