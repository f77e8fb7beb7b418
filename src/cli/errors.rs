//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine::EngineError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read fixtures: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad fixture file {path}: {detail}")]
    Fixture { path: PathBuf, detail: String },

    #[error("bad parameter {0:?}, expected KEY=VALUE")]
    BadParam(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type CliResult<T> = Result<T, CliError>;
