//! civiq - a query-condition engine for civic datasets
//!
//! Validates untrusted request parameters against per-request
//! discovered schemas, compiles boolean predicate trees, and plans
//! time-bucketed, optionally joined aggregations over a pluggable
//! store.

pub mod catalog;
pub mod cli;
pub mod condition;
pub mod engine;
pub mod geometry;
pub mod observability;
pub mod planner;
pub mod response;
pub mod store;
pub mod validator;
