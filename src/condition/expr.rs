//! Compiled predicate expressions.
//!
//! An `Expr` is the output of condition compilation: every column has
//! been checked against the target descriptor, every operator against
//! the whitelist, and every operand coerced. Predicates compose by
//! conjunction and disjunction and are interpreted by the store.

use serde::Serialize;
use serde_json::Value;

use super::operators::Operator;
use super::scalar::Scalar;

/// One composable, fully-typed predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// `column <op> value`
    Compare {
        column: String,
        op: Operator,
        value: Scalar,
    },
    /// `column IN (values)`
    InList { column: String, values: Vec<Scalar> },
    /// `column IS [NOT] NULL`
    NullTest { column: String, negated: bool },
    /// Hour-of-day bound extracted from a timestamp column.
    HourOfDay {
        column: String,
        op: Operator,
        hour: u32,
    },
    /// Geometry containment against a polygon fragment.
    Within { column: String, fragment: Value },
    /// All children must hold.
    And(Vec<Expr>),
    /// At least one child must hold.
    Or(Vec<Expr>),
}

impl Expr {
    pub fn compare(column: impl Into<String>, op: Operator, value: Scalar) -> Expr {
        Expr::Compare {
            column: column.into(),
            op,
            value,
        }
    }

    pub fn eq(column: impl Into<String>, value: Scalar) -> Expr {
        Expr::compare(column, Operator::Eq, value)
    }

    /// Conjunction of the given predicates, flattening the trivial
    /// cases: `None` for no operands, the operand itself for one.
    pub fn all(mut exprs: Vec<Expr>) -> Option<Expr> {
        match exprs.len() {
            0 => None,
            1 => Some(exprs.remove(0)),
            _ => Some(Expr::And(exprs)),
        }
    }

    /// The `(column, operator)` pairs of every comparison leaf, in
    /// depth-first order. Used to check compile idempotence.
    pub fn leaf_signature(&self) -> Vec<(String, &'static str)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<(String, &'static str)>) {
        match self {
            Expr::Compare { column, op, .. } | Expr::HourOfDay { column, op, .. } => {
                out.push((column.clone(), op.as_str()))
            }
            Expr::InList { column, .. } => out.push((column.clone(), Operator::In.as_str())),
            Expr::NullTest { column, negated } => out.push((
                column.clone(),
                if *negated {
                    Operator::IsNot.as_str()
                } else {
                    Operator::Is.as_str()
                },
            )),
            Expr::Within { column, .. } => out.push((column.clone(), Operator::Within.as_str())),
            Expr::And(children) | Expr::Or(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}
