//! Response materialization: JSON envelopes, CSV, GeoJSON.

mod errors;
mod materialize;

pub use errors::{ResponseError, ResponseResult};
pub use materialize::{envelope, error_envelope, Materializer, Payload};
