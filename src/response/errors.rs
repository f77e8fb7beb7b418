//! Materializer error types.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResponseError {
    /// CSV output requires every row to share the header's column set.
    #[error("row {row} does not match the csv header columns")]
    HeterogeneousRows { row: usize },

    /// GeoJSON output requires a geometry column on the dataset.
    #[error("geojson output requires a geometry column")]
    MissingGeometryColumn,
}

pub type ResponseResult<T> = Result<T, ResponseError>;
