use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Stable schema identifier for kubeguard reports.
pub const SCHEMA_REPORT_V1: &str = "kubeguard.report.v1";

/// Benchmark severity tag. Ordered from least to most severe.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Outcome of one control.
///
/// `Error` means the control could not be evaluated (query or parse failure). It is a
/// failure for verdict purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ControlStatus {
    Pass,
    Fail,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

/// Benchmark metadata carried through unchanged from the control definition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ControlTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cis_rid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cis_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nist: Vec<String>,
    /// CIS Controls safeguards keyed by Controls version, e.g. `"7" -> ["5.2"]`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cis_controls: BTreeMap<String, Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Violation {
    /// Resource identifier (or the queried resource kind for control-level violations).
    pub identifier: String,
    pub code: String,

    /// The attribute value that failed the predicate, when there is one.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: JsonValue,

    /// Stable identifier intended for dedup and trending: a hash of
    /// `control_id + code + identifier`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Result of evaluating one control.
///
/// `status == Pass` iff `violations` is empty. Failures that prevent evaluation still carry
/// exactly one violation describing what went wrong.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ControlResult {
    pub control_id: String,
    pub title: String,
    pub severity: Severity,
    pub impact: f32,
    pub status: ControlStatus,

    /// Human-readable outcome, e.g. `List of pods with ...: pod-a, pod-b`.
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,

    pub records_evaluated: u32,
    pub violations: Vec<Violation>,

    /// Non-fatal parse observations (dropped lines, duplicate identifiers).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    #[serde(default)]
    pub tags: ControlTags,
}

impl ControlResult {
    pub fn is_pass(&self) -> bool {
        self.status == ControlStatus::Pass
    }

    pub fn violating_identifiers(&self) -> Vec<&str> {
        self.violations
            .iter()
            .map(|v| v.identifier.as_str())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Kubeguard-specific summary payload for the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct KubeguardData {
    pub profile: String,
    pub fail_on: String,

    pub controls_total: u32,
    pub controls_passed: u32,
    pub controls_failed: u32,
    pub controls_errored: u32,

    pub violations_total: u32,
}

/// A generic receipt/envelope.
///
/// Keeping this generic allows tool-specific data while still enforcing a stable outer shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportEnvelope<TData = KubeguardData> {
    /// Versioned schema identifier for the envelope shape.
    pub schema: String,
    pub tool: ToolMeta,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub finished_at: OffsetDateTime,
    pub verdict: Verdict,
    pub results: Vec<ControlResult>,
    pub data: TData,
}

pub type KubeguardReport = ReportEnvelope<KubeguardData>;
