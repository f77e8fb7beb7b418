//! Request validation.
//!
//! A declarative field table coerces every recognized parameter, the
//! catalog resolves dataset names before any column is checked, and
//! column filters compile during validation so the planner only ever
//! sees typed predicates. Rejection is whole-request with a per-field
//! message map.

pub mod errors;
mod fields;
mod query;
mod validate;

pub use errors::ValidationErrors;
pub use fields::{Coerced, Coercion, FieldSpec, FIELD_SPECS};
pub use query::{NormalizedQuery, OutputFormat, TimeWindow};
pub use validate::{Validated, Validator};
