//! Planner error types.

use thiserror::Error;

use crate::condition::ConditionError;
use crate::geometry::GeometryError;

/// Failures while turning a normalized query into a read plan.
#[derive(Debug, Clone, Error)]
pub enum PlannerError {
    /// The descriptor declares no business key, so a detail join
    /// cannot be keyed. Internal: catalog metadata is incomplete.
    #[error("dataset {dataset} declares no business key for joining")]
    JoinKeyMissing { dataset: String },

    /// Temporal operations need an observation-time column.
    #[error("dataset {dataset} has no timestamp column")]
    MissingDateColumn { dataset: String },

    /// Spatial operations need a geometry column.
    #[error("dataset {dataset} has no geometry column")]
    MissingGeometryColumn { dataset: String },

    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

pub type PlannerResult<T> = Result<T, PlannerError>;
