//! Typed scalar values produced by coercion.
//!
//! Every filter value, whether it arrived as a query-string token or a
//! JSON literal inside a condition tree, is coerced to its column's
//! semantic type before it can reach a predicate.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::catalog::SemanticType;

/// A coerced filter operand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Scalar {
    /// Coerces a JSON value to the semantic type of the target column.
    ///
    /// Strings are parsed permissively for numeric, boolean and
    /// timestamp targets, since query-string values always arrive as
    /// text. Geometry columns never take scalar operands.
    pub fn coerce(value: &serde_json::Value, ty: SemanticType) -> Result<Scalar, String> {
        use serde_json::Value;

        let fail = || format!("{} is not a valid {} value", value, ty.type_name());

        match ty {
            SemanticType::String => match value {
                Value::String(s) => Ok(Scalar::Text(s.clone())),
                Value::Number(n) => Ok(Scalar::Text(n.to_string())),
                Value::Bool(b) => Ok(Scalar::Text(b.to_string())),
                _ => Err(fail()),
            },
            SemanticType::Integer => match value {
                Value::Number(n) => n.as_i64().map(Scalar::Int).ok_or_else(fail),
                Value::String(s) => s.trim().parse::<i64>().map(Scalar::Int).map_err(|_| fail()),
                _ => Err(fail()),
            },
            SemanticType::Float => match value {
                Value::Number(n) => n.as_f64().map(Scalar::Float).ok_or_else(fail),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Scalar::Float)
                    .map_err(|_| fail()),
                _ => Err(fail()),
            },
            SemanticType::Boolean => match value {
                Value::Bool(b) => Ok(Scalar::Bool(*b)),
                Value::String(s) => match s.as_str() {
                    "true" => Ok(Scalar::Bool(true)),
                    "false" => Ok(Scalar::Bool(false)),
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },
            SemanticType::Timestamp => match value {
                Value::String(s) => parse_date(s).map(Scalar::Timestamp).ok_or_else(fail),
                _ => Err(fail()),
            },
            SemanticType::Geometry => Err(fail()),
        }
    }

    /// Ordering between two scalars of the same variant family.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::Float(a), Scalar::Float(b)) => a.partial_cmp(b),
            (Scalar::Int(a), Scalar::Float(b)) => (*a as f64).partial_cmp(b),
            (Scalar::Float(a), Scalar::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
            (Scalar::Timestamp(a), Scalar::Timestamp(b)) => Some(a.cmp(b)),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Text content of string scalars, for pattern predicates.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Permissive date parsing.
///
/// Accepts full date-times, `YYYY-MM-DD` with one- or two-digit month
/// and day, `/`-separated dates, `YYYY-MM` and bare `YYYY` (which snap
/// to the start of the period).
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    let parts: Vec<&str> = raw.split(['-', '/']).collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut numbers = Vec::with_capacity(3);
    for part in &parts {
        numbers.push(part.parse::<u32>().ok()?);
    }

    let year = *numbers.first()? as i32;
    let month = numbers.get(1).copied().unwrap_or(1);
    let day = numbers.get(2).copied().unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(
            Scalar::coerce(&json!(1150), SemanticType::Integer).unwrap(),
            Scalar::Int(1150)
        );
        assert_eq!(
            Scalar::coerce(&json!("1150"), SemanticType::Integer).unwrap(),
            Scalar::Int(1150)
        );
        assert!(Scalar::coerce(&json!("abc"), SemanticType::Integer).is_err());
    }

    #[test]
    fn test_coerce_string_accepts_numbers() {
        assert_eq!(
            Scalar::coerce(&json!(7), SemanticType::String).unwrap(),
            Scalar::Text("7".to_string())
        );
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(
            Scalar::coerce(&json!("true"), SemanticType::Boolean).unwrap(),
            Scalar::Bool(true)
        );
        assert!(Scalar::coerce(&json!("yes"), SemanticType::Boolean).is_err());
    }

    #[test]
    fn test_coerce_timestamp() {
        let ts = Scalar::coerce(&json!("2013-10-1"), SemanticType::Timestamp).unwrap();
        assert_eq!(
            ts,
            Scalar::Timestamp(
                NaiveDate::from_ymd_opt(2013, 10, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_geometry_never_coerces() {
        assert!(Scalar::coerce(&json!("anything"), SemanticType::Geometry).is_err());
    }

    #[test]
    fn test_parse_date_year_only() {
        let dt = parse_date("2000").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
    }

    #[test]
    fn test_parse_date_slash_separated() {
        let dt = parse_date("2016/01/19").unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2016, 1, 19).unwrap());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("20z00").is_none());
        assert!(parse_date("").is_none());
        assert!(parse_date("2013-13-40").is_none());
    }

    #[test]
    fn test_compare_mixed_numerics() {
        assert_eq!(
            Scalar::Int(2).compare(&Scalar::Float(1.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Scalar::Text("a".into()).compare(&Scalar::Int(1)), None);
    }
}
