//! Condition tree grammar.
//!
//! Leaf: `{"op": <code>, "col": <column>, "val": <any>}`.
//! Boolean node: `{"op": "and"|"or", "val": [<node>, ...]}`.
//! Shorthand without an explicit operator: `{<column>: <value>}`
//! defaults to equality.
//!
//! The untyped JSON is parsed once into this tagged tree; all later
//! stages work on the immutable parse result.

use serde_json::Value;

use super::errors::{ConditionError, ConditionResult};

/// A parsed condition tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    /// Column comparison leaf. The operator code is still raw text
    /// here; the compiler resolves it against the whitelist.
    Comparison {
        column: String,
        operator: String,
        value: Value,
    },
    /// Conjunction of children.
    And(Vec<ConditionNode>),
    /// Disjunction of children.
    Or(Vec<ConditionNode>),
}

impl ConditionNode {
    /// Parses condition-tree JSON text.
    pub fn parse_text(text: &str) -> ConditionResult<ConditionNode> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ConditionError::Malformed(format!("{}: {}", e, text)))?;
        Self::parse(&value)
    }

    /// Parses one node of the tree.
    pub fn parse(value: &Value) -> ConditionResult<ConditionNode> {
        let object = value
            .as_object()
            .ok_or_else(|| ConditionError::Malformed(value.to_string()))?;
        if object.is_empty() {
            return Err(ConditionError::EmptyTree);
        }

        let op = match object.get("op").and_then(Value::as_str) {
            Some(op) => op.to_lowercase(),
            // Shorthand form: every key is an equality comparison.
            None => {
                let mut leaves: Vec<ConditionNode> = object
                    .iter()
                    .map(|(column, val)| ConditionNode::Comparison {
                        column: column.clone(),
                        operator: "eq".to_string(),
                        value: val.clone(),
                    })
                    .collect();
                return Ok(if leaves.len() == 1 {
                    leaves.remove(0)
                } else {
                    ConditionNode::And(leaves)
                });
            }
        };

        if op == "and" || op == "or" {
            let children = object
                .get("val")
                .and_then(Value::as_array)
                .ok_or_else(|| ConditionError::Malformed(value.to_string()))?;
            if children.is_empty() {
                return Err(ConditionError::EmptyTree);
            }
            let parsed: ConditionResult<Vec<ConditionNode>> =
                children.iter().map(ConditionNode::parse).collect();
            return Ok(if op == "and" {
                ConditionNode::And(parsed?)
            } else {
                ConditionNode::Or(parsed?)
            });
        }

        let column = object
            .get("col")
            .and_then(Value::as_str)
            .ok_or_else(|| ConditionError::Malformed(value.to_string()))?;
        let val = object
            .get("val")
            .ok_or_else(|| ConditionError::Malformed(value.to_string()))?;

        Ok(ConditionNode::Comparison {
            column: column.to_string(),
            operator: op,
            value: val.clone(),
        })
    }
}
