//! Condition tree compilation.
//!
//! Depth-first walk over a parsed [`ConditionNode`], resolving every
//! leaf against the target descriptor. Any failure invalidates the
//! whole tree; a compiled expression never contains a partial
//! predicate.

use serde_json::Value;

use super::errors::{ConditionError, ConditionResult};
use super::expr::Expr;
use super::operators::Operator;
use super::scalar::Scalar;
use super::tree::ConditionNode;
use crate::catalog::{DatasetDescriptor, SemanticType};

/// Compiles a parsed condition tree against one dataset descriptor.
///
/// A column belonging to a different dataset is always rejected here,
/// even on a name collision, because the only name space consulted is
/// the supplied descriptor.
pub fn compile(node: &ConditionNode, descriptor: &DatasetDescriptor) -> ConditionResult<Expr> {
    match node {
        ConditionNode::And(children) => Ok(Expr::And(compile_children(children, descriptor)?)),
        ConditionNode::Or(children) => Ok(Expr::Or(compile_children(children, descriptor)?)),
        ConditionNode::Comparison {
            column,
            operator,
            value,
        } => compile_leaf(column, operator, value, descriptor),
    }
}

/// Parses then compiles raw condition-tree JSON text.
pub fn compile_text(text: &str, descriptor: &DatasetDescriptor) -> ConditionResult<Expr> {
    let node = ConditionNode::parse_text(text)?;
    compile(&node, descriptor)
}

fn compile_children(
    children: &[ConditionNode],
    descriptor: &DatasetDescriptor,
) -> ConditionResult<Vec<Expr>> {
    if children.is_empty() {
        return Err(ConditionError::EmptyTree);
    }
    children.iter().map(|c| compile(c, descriptor)).collect()
}

fn compile_leaf(
    column: &str,
    operator: &str,
    value: &Value,
    descriptor: &DatasetDescriptor,
) -> ConditionResult<Expr> {
    let semantic_type =
        descriptor
            .column_type(column)
            .ok_or_else(|| ConditionError::UnknownColumn {
                column: column.to_string(),
            })?;

    let op = Operator::parse(operator).ok_or_else(|| ConditionError::InvalidOperator {
        operator: operator.to_string(),
        column: column.to_string(),
        semantic_type: semantic_type.type_name(),
    })?;
    if !op.allowed_for(semantic_type) {
        return Err(ConditionError::InvalidOperator {
            operator: operator.to_string(),
            column: column.to_string(),
            semantic_type: semantic_type.type_name(),
        });
    }

    match op {
        Operator::In => {
            let values = coerce_list(column, value, semantic_type)?;
            Ok(Expr::InList {
                column: column.to_string(),
                values,
            })
        }
        Operator::Is | Operator::IsNot => Ok(Expr::NullTest {
            column: column.to_string(),
            negated: op == Operator::IsNot,
        }),
        Operator::Within => {
            if !value.is_object() {
                return Err(ConditionError::InvalidValue {
                    column: column.to_string(),
                    detail: format!("{} is not a geometry fragment", value),
                });
            }
            Ok(Expr::Within {
                column: column.to_string(),
                fragment: value.clone(),
            })
        }
        _ => {
            let scalar =
                Scalar::coerce(value, semantic_type).map_err(|detail| {
                    ConditionError::InvalidValue {
                        column: column.to_string(),
                        detail,
                    }
                })?;
            Ok(Expr::compare(column, op, scalar))
        }
    }
}

/// Membership operands: a JSON array, or a comma-separated string.
fn coerce_list(
    column: &str,
    value: &Value,
    semantic_type: SemanticType,
) -> ConditionResult<Vec<Scalar>> {
    let raw_items: Vec<Value> = match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => s
            .split(',')
            .map(|item| Value::String(item.trim().to_string()))
            .collect(),
        other => vec![other.clone()],
    };
    if raw_items.is_empty() {
        return Err(ConditionError::InvalidValue {
            column: column.to_string(),
            detail: "membership list is empty".to_string(),
        });
    }
    raw_items
        .iter()
        .map(|item| {
            Scalar::coerce(item, semantic_type).map_err(|detail| ConditionError::InvalidValue {
                column: column.to_string(),
                detail,
            })
        })
        .collect()
}
