//! Command-line interface.
//!
//! A fixture-backed, one-shot front end for the engine: load a JSON
//! fixture directory into the memory store, run one operation, print
//! the materialized payload.

mod args;
mod commands;
mod errors;
mod fixtures;

pub use args::{Cli, Command};
pub use commands::run;
pub use errors::{CliError, CliResult};
