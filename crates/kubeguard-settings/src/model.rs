use kubeguard_types::ControlTags;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `kubeguard.toml` schema v1.
///
/// This is a *user-facing* config model: strings are validated at resolve time so error
/// messages can name the offending control.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KubeguardConfigV1 {
    /// Optional schema string for tooling (`kubeguard.config.v1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// `eks-cis` (default), `audit`, or `custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    /// Lowest severity whose failed controls fail the run: `low`, `medium`, `high`, `critical`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<String>,

    /// Per-query timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Named allowlist inputs (e.g. `allowlist_pods`). A missing input is an empty list.
    #[serde(default)]
    pub inputs: BTreeMap<String, Vec<String>>,

    /// Map of control_id -> override.
    #[serde(default)]
    pub controls: BTreeMap<String, ControlConfig>,

    /// Additional data-driven controls, evaluated after the built-in catalog.
    #[serde(default)]
    pub custom_controls: Vec<ControlDefinition>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ControlConfig {
    /// Override the profile's enable/disable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Override the control's severity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
}

/// A complete control definition. The built-in catalog is expressed in the same shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ControlDefinition {
    pub id: String,
    pub title: String,

    /// Defaults to `medium`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,

    /// Benchmark impact score in `0.0..=1.0`. Defaults to 0.5.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,

    /// Phrase used in result messages. Defaults to `Non-compliant <resource>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    pub query: QueryDefinition,

    /// Defaults to the line parser for column queries. Required for JSON queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<ParserDefinition>,

    /// The compliant shape of the attribute.
    pub condition: ConditionDefinition,

    #[serde(default)]
    pub quantifier: QuantifierDefinition,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowlist: Option<AllowlistDefinition>,

    #[serde(default)]
    pub tags: ControlTags,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "output", rename_all = "snake_case")]
pub enum QueryDefinition {
    /// Headerless custom columns; the first column is the identifier.
    Columns {
        resource: String,
        #[serde(default)]
        all_namespaces: bool,
        columns: Vec<String>,
    },
    Json {
        resource: String,
        #[serde(default)]
        all_namespaces: bool,
    },
}

impl QueryDefinition {
    pub fn resource(&self) -> &str {
        match self {
            QueryDefinition::Columns { resource, .. } | QueryDefinition::Json { resource, .. } => {
                resource
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParserDefinition {
    Lines {
        /// Regex with `id`/`value` named groups, or positional groups 1 and 2.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        /// Attribute name recorded on each record. Defaults to the last column path.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribute: Option<String>,
    },
    Json {
        /// Dotted path of the evaluated attribute, e.g. `spec.allowedCapabilities`.
        attribute_path: String,
        /// Defaults to `metadata.name`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        identifier_path: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ConditionDefinition {
    Equals { value: String },
    IsNull,
    IsEmpty,
    AnyOf { of: Vec<ConditionDefinition> },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuantifierDefinition {
    #[default]
    All,
    Any,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AllowlistDefinition {
    #[serde(default)]
    pub mode: AllowModeDefinition,

    /// Name of an `[inputs]` entry whose values are added to `entries`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AllowModeDefinition {
    #[default]
    Exact,
    Pattern,
    Glob,
}
