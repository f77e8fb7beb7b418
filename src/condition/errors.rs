//! Condition tree errors.

use thiserror::Error;

/// Result type for condition parsing and compilation.
pub type ConditionResult<T> = Result<T, ConditionError>;

/// Errors raised while parsing or compiling a condition tree.
///
/// A tree is one atomic unit: any of these invalidates the whole tree,
/// never just the offending leaf.
#[derive(Debug, Clone, Error)]
pub enum ConditionError {
    /// Leaf names a column the target dataset does not have.
    #[error("{column} is not a valid column")]
    UnknownColumn { column: String },

    /// Operator is not whitelisted for the column's semantic type.
    #[error("operator {operator} is not valid for {semantic_type} column {column}")]
    InvalidOperator {
        operator: String,
        column: String,
        semantic_type: &'static str,
    },

    /// Leaf value failed coercion to the column's semantic type.
    #[error("{column}: {detail}")]
    InvalidValue { column: String, detail: String },

    /// Boolean node with no children, or an empty tree.
    #[error("condition tree is empty")]
    EmptyTree,

    /// Input did not match the tree grammar.
    #[error("malformed condition tree: {0}")]
    Malformed(String),
}
