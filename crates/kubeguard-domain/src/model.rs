use serde_json::Value;
use std::fmt;

/// Attribute value extracted from query output.
///
/// Line records always carry `Text`; structured records carry the JSON value found at the
/// attribute path (`Null` when the path is absent).
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Text(String),
    Json(Value),
}

impl AttrValue {
    pub fn to_json(&self) -> Value {
        match self {
            AttrValue::Text(s) => Value::String(s.clone()),
            AttrValue::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => f.write_str(s),
            AttrValue::Json(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResourceRecord {
    pub identifier: String,
    pub attribute: String,
    pub value: AttrValue,
}

impl ResourceRecord {
    pub fn text(identifier: &str, attribute: &str, value: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            attribute: attribute.to_string(),
            value: AttrValue::Text(value.to_string()),
        }
    }

    pub fn json(identifier: &str, attribute: &str, value: Value) -> Self {
        Self {
            identifier: identifier.to_string(),
            attribute: attribute.to_string(),
            value: AttrValue::Json(value),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryFailureKind {
    /// The command ran and exited non-zero.
    Exit,
    Timeout,
    /// The API server could not be reached.
    Unreachable,
    /// The command could not be started.
    Spawn,
    /// No recorded output exists for the query.
    Replay,
}

impl QueryFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryFailureKind::Exit => "exit",
            QueryFailureKind::Timeout => "timeout",
            QueryFailureKind::Unreachable => "unreachable",
            QueryFailureKind::Spawn => "spawn",
            QueryFailureKind::Replay => "replay",
        }
    }
}

/// Why a control's query produced no output to evaluate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryFailure {
    pub kind: QueryFailureKind,
    pub message: String,
}

impl QueryFailure {
    pub fn new(kind: QueryFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
