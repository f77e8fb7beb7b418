//! Geometry extraction errors.

use thiserror::Error;

/// Result type for geometry fragment extraction.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Errors raised while normalizing GeoJSON filter input.
#[derive(Debug, Clone, Error)]
pub enum GeometryError {
    /// The input was not JSON, or held no usable geometry.
    #[error("could not parse as geojson: {0}")]
    InvalidGeometry(String),

    /// A geometry object lacked usable coordinates.
    #[error("geometry has no coordinates: {0}")]
    EmptyCoordinates(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_names_offending_value() {
        let err = GeometryError::InvalidGeometry("{not json".to_string());
        assert!(err.to_string().contains("{not json"));
    }
}
