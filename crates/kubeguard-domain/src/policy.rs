use crate::allowlist::AllowMatcher;
use crate::condition::Condition;
use crate::parse::RecordParser;
use kubeguard_types::{ControlTags, Severity};

/// How the quantifier applies the condition across records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantifier {
    /// Universal: no non-allowlisted record may violate the condition.
    All,
    /// Existential: at least one record must satisfy the condition.
    Any,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputShape {
    /// Headerless custom columns, one JSONPath per column (e.g. `.metadata.name`).
    Columns(Vec<String>),
    Json,
}

/// What to ask the cluster for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuerySpec {
    /// Resource kind as understood by the query tool (`pods`, `serviceaccounts`, `psp`).
    pub resource: String,
    pub all_namespaces: bool,
    pub output: OutputShape,
}

impl QuerySpec {
    pub fn columns(resource: &str, all_namespaces: bool, columns: &[&str]) -> Self {
        Self {
            resource: resource.to_string(),
            all_namespaces,
            output: OutputShape::Columns(columns.iter().map(|c| c.to_string()).collect()),
        }
    }

    pub fn json(resource: &str, all_namespaces: bool) -> Self {
        Self {
            resource: resource.to_string(),
            all_namespaces,
            output: OutputShape::Json,
        }
    }
}

/// A fully resolved control. Immutable for the duration of a run.
#[derive(Clone, Debug)]
pub struct Control {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    pub impact: f32,
    pub remediation: Option<String>,

    /// Phrase used in result messages, e.g. "List of pods with automountServiceAccountToken setting".
    pub subject: String,

    pub query: QuerySpec,
    pub parser: RecordParser,
    pub condition: Condition,
    pub quantifier: Quantifier,
    pub allowlist: AllowMatcher,
    pub tags: ControlTags,
}

#[derive(Clone, Debug)]
pub struct EffectiveConfig {
    pub profile: String,
    /// Failed controls at or above this severity fail the run; lower ones warn.
    pub fail_on: Severity,
    pub timeout_secs: u64,
    /// Enabled controls, in evaluation and report order.
    pub controls: Vec<Control>,
}

impl EffectiveConfig {
    pub fn control(&self, control_id: &str) -> Option<&Control> {
        self.controls.iter().find(|c| c.id == control_id)
    }
}
