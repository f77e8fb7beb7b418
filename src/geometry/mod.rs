//! Geometry Fragment Extractor
//!
//! Normalizes GeoJSON filter inputs into one polygon fragment with an
//! explicit coordinate reference, buffering lines into areas.

pub mod errors;
pub mod fragment;

pub use errors::{GeometryError, GeometryResult};
pub use fragment::{
    contains, extract_fragment, make_fragment, size_in_degrees, value_bbox, PolygonFragment,
    DEFAULT_BUFFER_METERS,
};
