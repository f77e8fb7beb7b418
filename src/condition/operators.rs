//! Enumerated filter operators and the per-type whitelist.
//!
//! Operators are an explicit enum resolved through a lookup keyed by
//! (semantic column type, operator). Anything absent from the table is
//! rejected; there is no name-based probing.

use serde::Serialize;

use crate::catalog::SemanticType;

/// Filter operators accepted in query strings and condition trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Equals
    Eq,
    /// Not equals
    Ne,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
    /// Value in list
    In,
    /// Case-sensitive pattern match
    Like,
    /// Case-insensitive pattern match
    Ilike,
    /// Is null
    Is,
    /// Is not null
    IsNot,
    /// Geometry containment
    Within,
}

impl Operator {
    /// Parses an operator code as it appears after `__` in a parameter
    /// name or in a condition-tree `op` field.
    pub fn parse(code: &str) -> Option<Operator> {
        match code {
            "eq" => Some(Operator::Eq),
            "ne" => Some(Operator::Ne),
            "gt" => Some(Operator::Gt),
            "ge" => Some(Operator::Ge),
            "lt" => Some(Operator::Lt),
            "le" => Some(Operator::Le),
            "in" => Some(Operator::In),
            "like" => Some(Operator::Like),
            "ilike" => Some(Operator::Ilike),
            "is" => Some(Operator::Is),
            "isnot" => Some(Operator::IsNot),
            "within" => Some(Operator::Within),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::In => "in",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
            Operator::Is => "is",
            Operator::IsNot => "isnot",
            Operator::Within => "within",
        }
    }

    /// Whether this operator is whitelisted for columns of `ty`.
    ///
    /// Ordering and equality for numeric and date columns; equality,
    /// membership and patterns for strings; containment only for
    /// geometry. Null tests apply to every non-geometry type.
    pub fn allowed_for(&self, ty: SemanticType) -> bool {
        use Operator::*;

        if matches!(self, Is | IsNot) {
            return ty != SemanticType::Geometry;
        }

        match ty {
            SemanticType::Integer | SemanticType::Float => {
                matches!(self, Eq | Ne | Gt | Ge | Lt | Le | In)
            }
            SemanticType::Timestamp => matches!(self, Eq | Ne | Gt | Ge | Lt | Le),
            SemanticType::String => matches!(self, Eq | Ne | Like | Ilike | In),
            SemanticType::Boolean => matches!(self, Eq | Ne),
            SemanticType::Geometry => matches!(self, Within),
        }
    }
}
