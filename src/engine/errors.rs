//! Engine error types.
//!
//! Rejections carry the per-field message map and are caller-visible
//! as a structured error envelope. Everything else is an internal
//! failure and never folds into the validation map.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::planner::PlannerError;
use crate::response::ResponseError;
use crate::store::StoreError;
use crate::validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The request failed validation; one message list per field.
    #[error("request rejected: {0}")]
    Rejected(ValidationErrors),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl EngineError {
    /// The field map for rejected requests, if this is a rejection.
    pub fn rejection(&self) -> Option<&ValidationErrors> {
        match self {
            EngineError::Rejected(errors) => Some(errors),
            _ => None,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
