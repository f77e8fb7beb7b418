//! Read-query planning.
//!
//! Translates the validated query specification into executable plans:
//! time-bucket aggregations, paged row selects, snap-to-grid counts and
//! business-key joins. Plans are deterministic and carry compiled
//! predicates only.

mod ast;
mod errors;
mod planner;

pub use ast::{
    AggUnit, DetailJoinQuery, GridQuery, OrderBy, ReadQuery, SelectQuery, ShapeJoinQuery,
    TimeBucketQuery,
};
pub use errors::{PlannerError, PlannerResult};
pub use planner::Planner;
