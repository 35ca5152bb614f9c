//! Record parsers: turn raw query output into resource records.
//!
//! - `LineParser` is lenient: lines that do not match are dropped and reported as warnings.
//! - `JsonParser` is strict: a document that is not valid JSON (or has no recognizable shape)
//!   fails the whole control.

use crate::allowlist::PatternError;
use crate::model::{AttrValue, ResourceRecord};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier followed by one whitespace-delimited value.
pub const DEFAULT_LINE_PATTERN: &str = r"^\s*([^\s]+?)\s+([^\s]+?)\s*$";

/// Default identifier path for structured records.
pub const DEFAULT_IDENTIFIER_PATH: &str = "metadata.name";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parsed {
    pub records: Vec<ResourceRecord>,
    pub warnings: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected an object or an `items` list, found {0}")]
    Shape(&'static str),
}

#[derive(Clone, Debug)]
pub enum RecordParser {
    Lines(LineParser),
    Json(JsonParser),
}

impl RecordParser {
    pub fn parse(&self, text: &str) -> Result<Parsed, ParseError> {
        let mut parsed = match self {
            RecordParser::Lines(p) => p.parse(text),
            RecordParser::Json(p) => p.parse(text)?,
        };
        flag_duplicates(&mut parsed);
        Ok(parsed)
    }

    pub fn attribute(&self) -> &str {
        match self {
            RecordParser::Lines(p) => &p.attribute,
            RecordParser::Json(p) => p.attribute_path.as_str(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LineParser {
    regex: Regex,
    attribute: String,
}

impl LineParser {
    /// The pattern may name its groups `id` and `value`; otherwise groups 1 and 2 are used.
    pub fn new(pattern: &str, attribute: impl Into<String>) -> Result<Self, PatternError> {
        let regex = Regex::new(pattern).map_err(|source| PatternError::Regex {
            pattern: pattern.to_string(),
            source,
        })?;

        let names: Vec<&str> = regex.capture_names().flatten().collect();
        let named = names.contains(&"id") && names.contains(&"value");
        // captures_len counts the implicit whole-match group.
        if !named && regex.captures_len() < 3 {
            return Err(PatternError::MissingGroups {
                pattern: pattern.to_string(),
            });
        }

        Ok(Self {
            regex,
            attribute: attribute.into(),
        })
    }

    pub fn parse(&self, text: &str) -> Parsed {
        let mut parsed = Parsed::default();

        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let Some(caps) = self.regex.captures(line) else {
                parsed
                    .warnings
                    .push(format!("line {}: dropped unparseable line {:?}", idx + 1, line));
                continue;
            };

            let id = caps.name("id").or_else(|| caps.get(1));
            let value = caps.name("value").or_else(|| caps.get(2));
            match (id, value) {
                (Some(id), Some(value)) => parsed.records.push(ResourceRecord {
                    identifier: id.as_str().to_string(),
                    attribute: self.attribute.clone(),
                    value: AttrValue::Text(value.as_str().to_string()),
                }),
                _ => parsed.warnings.push(format!(
                    "line {}: pattern matched without identifier and value {:?}",
                    idx + 1,
                    line
                )),
            }
        }

        parsed
    }
}

/// Dotted path into a JSON object, e.g. `spec.allowedCapabilities`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath(String);

impl FieldPath {
    pub fn new(path: &str) -> Self {
        Self(path.trim().trim_start_matches('.').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn lookup<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.0
            .split('.')
            .filter(|seg| !seg.is_empty())
            .try_fold(value, |cur, seg| cur.get(seg))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug)]
pub struct JsonParser {
    identifier_path: FieldPath,
    attribute_path: FieldPath,
}

impl JsonParser {
    pub fn new(attribute_path: &str) -> Self {
        Self {
            identifier_path: FieldPath::new(DEFAULT_IDENTIFIER_PATH),
            attribute_path: FieldPath::new(attribute_path),
        }
    }

    pub fn with_identifier_path(mut self, path: &str) -> Self {
        self.identifier_path = FieldPath::new(path);
        self
    }

    pub fn parse(&self, text: &str) -> Result<Parsed, ParseError> {
        let doc: Value = serde_json::from_str(text)?;

        let items: Vec<&Value> = match doc.get("items") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(_) => return Err(ParseError::Shape("a non-list `items` field")),
            None if doc.is_object() => vec![&doc],
            None => return Err(ParseError::Shape(json_kind(&doc))),
        };

        let mut parsed = Parsed::default();
        for (idx, item) in items.into_iter().enumerate() {
            let identifier = match self.identifier_path.lookup(item) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => {
                    parsed.warnings.push(format!(
                        "item {idx}: no identifier at `{}`",
                        self.identifier_path
                    ));
                    format!("#{idx}")
                }
            };
            let value = self
                .attribute_path
                .lookup(item)
                .cloned()
                .unwrap_or(Value::Null);

            parsed.records.push(ResourceRecord {
                identifier,
                attribute: self.attribute_path.as_str().to_string(),
                value: AttrValue::Json(value),
            });
        }

        Ok(parsed)
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Duplicates are kept as independent records; a later value never masks an earlier one.
fn flag_duplicates(parsed: &mut Parsed) {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for r in &parsed.records {
        *seen.entry(r.identifier.as_str()).or_default() += 1;
    }
    let dups: Vec<String> = seen
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(id, n)| format!("identifier {id:?} appears {n} times; all occurrences evaluated"))
        .collect();
    parsed.warnings.extend(dups);
}
