//! Tagged compliance conditions.
//!
//! A condition describes the *compliant* shape of an attribute value. A record violates a
//! control when its value does not satisfy the control's condition. Comparisons are exact
//! and case-sensitive.

use crate::model::AttrValue;
use serde_json::Value;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Condition {
    /// Value equals the literal. JSON scalars compare by their canonical text
    /// (`false`, `1`, `"x"` as `x`); null, arrays and objects never equal a literal.
    Equals(String),
    /// JSON `null` (including an absent attribute path).
    IsNull,
    /// Empty array, object, or string.
    IsEmpty,
    AnyOf(Vec<Condition>),
}

impl Condition {
    pub fn is_satisfied_by(&self, value: &AttrValue) -> bool {
        match self {
            Condition::Equals(lit) => match value {
                AttrValue::Text(s) => s == lit,
                AttrValue::Json(Value::String(s)) => s == lit,
                AttrValue::Json(Value::Bool(b)) => b.to_string() == *lit,
                AttrValue::Json(Value::Number(n)) => n.to_string() == *lit,
                AttrValue::Json(_) => false,
            },
            Condition::IsNull => matches!(value, AttrValue::Json(Value::Null)),
            Condition::IsEmpty => match value {
                AttrValue::Text(s) => s.is_empty(),
                AttrValue::Json(Value::String(s)) => s.is_empty(),
                AttrValue::Json(Value::Array(a)) => a.is_empty(),
                AttrValue::Json(Value::Object(o)) => o.is_empty(),
                AttrValue::Json(_) => false,
            },
            Condition::AnyOf(conditions) => conditions.iter().any(|c| c.is_satisfied_by(value)),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equals(lit) => write!(f, "equals '{lit}'"),
            Condition::IsNull => f.write_str("is null"),
            Condition::IsEmpty => f.write_str("is empty"),
            Condition::AnyOf(conditions) => {
                let parts: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
                f.write_str(&parts.join(" or "))
            }
        }
    }
}
