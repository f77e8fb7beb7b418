//! Observability.
//!
//! Structured JSON-lines logging only; observability is read-only and
//! never changes execution. One log line is one event with a fixed
//! `event`/`severity` prefix and alphabetized string fields.

mod logger;

pub use logger::{Logger, Severity};
