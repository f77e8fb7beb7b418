//! Query engine orchestration.
//!
//! Stateless per request: the store handle is the only shared state,
//! and it is read-only here. Long-running exports are expected to be
//! driven externally through [`Engine::run`]; the engine itself has no
//! tickets, no cache and no cancellation.

mod engine;
mod errors;

pub use engine::Engine;
pub use errors::{EngineError, EngineResult};
