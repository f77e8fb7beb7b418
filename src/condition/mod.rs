//! Condition Tree Compiler
//!
//! Parses nested boolean filter expressions into a tagged tree and
//! compiles them into composable, fully-typed predicates.

pub mod compiler;
pub mod errors;
pub mod expr;
pub mod operators;
pub mod scalar;
pub mod tree;

pub use compiler::{compile, compile_text};
pub use errors::{ConditionError, ConditionResult};
pub use expr::Expr;
pub use operators::Operator;
pub use scalar::{parse_date, Scalar};
pub use tree::ConditionNode;
