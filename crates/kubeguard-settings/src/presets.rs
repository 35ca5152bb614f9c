use crate::model::{
    AllowModeDefinition, AllowlistDefinition, ConditionDefinition, ControlDefinition,
    ParserDefinition, QuantifierDefinition, QueryDefinition,
};
use kubeguard_types::{ControlTags, Severity, ids, lookup_explanation};
use std::collections::BTreeMap;

pub const DEFAULT_PROFILE: &str = "eks-cis";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Known profile names, in the order `--help` and errors list them.
pub const PROFILES: &[&str] = &["eks-cis", "audit", "custom"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Profile {
    pub name: &'static str,
    pub fail_on: Severity,
    /// Whether built-in controls start enabled.
    pub builtins_enabled: bool,
}

/// Preset profiles are opinionated defaults.
///
/// Keep these small and readable. Anything complex should go into repo config.
pub fn profile(name: &str) -> Option<Profile> {
    match name {
        "eks-cis" => Some(Profile {
            name: "eks-cis",
            fail_on: Severity::Low,
            builtins_enabled: true,
        }),
        // Same controls, but only critical findings fail the run.
        "audit" => Some(Profile {
            name: "audit",
            fail_on: Severity::Critical,
            builtins_enabled: true,
        }),
        "custom" => Some(Profile {
            name: "custom",
            fail_on: Severity::Low,
            builtins_enabled: false,
        }),
        _ => None,
    }
}

/// The built-in EKS CIS catalog, in evaluation order.
pub fn builtin_controls() -> Vec<ControlDefinition> {
    vec![
        automount_control(
            ids::CONTROL_EKS_CIS_4_1_6_PODS,
            "pods",
            ".spec.automountServiceAccountToken",
            "List of pods with automountServiceAccountToken setting",
            AllowModeDefinition::Pattern,
            ids::INPUT_ALLOWLIST_PODS,
        ),
        automount_control(
            ids::CONTROL_EKS_CIS_4_1_6_SERVICE_ACCOUNTS,
            "serviceaccounts",
            ".automountServiceAccountToken",
            "List of service accounts with automountServiceAccountToken setting",
            AllowModeDefinition::Exact,
            ids::INPUT_ALLOWLIST_SERVICE_ACCOUNTS,
        ),
        ControlDefinition {
            id: ids::CONTROL_EKS_CIS_4_2_7.to_string(),
            title: title_for(ids::CONTROL_EKS_CIS_4_2_7),
            severity: Some(Severity::Medium.as_str().to_string()),
            impact: Some(0.5),
            remediation: remediation_for(ids::CONTROL_EKS_CIS_4_2_7),
            subject: Some("Pod security policies".to_string()),
            query: QueryDefinition::Json {
                resource: "psp".to_string(),
                all_namespaces: false,
            },
            parser: Some(ParserDefinition::Json {
                attribute_path: "spec.allowedCapabilities".to_string(),
                identifier_path: None,
            }),
            condition: ConditionDefinition::AnyOf {
                of: vec![ConditionDefinition::IsNull, ConditionDefinition::IsEmpty],
            },
            quantifier: QuantifierDefinition::Any,
            allowlist: None,
            tags: ControlTags {
                cis_rid: Some("4.2.8".to_string()),
                cis_level: Some(1),
                nist: vec!["AC-6 (9)".to_string(), "AC-6 (2)".to_string()],
                cis_controls: cis_controls(&[("6", "5.1"), ("7", "4.3"), ("8", "5.4")]),
            },
        },
    ]
}

fn automount_control(
    id: &str,
    resource: &str,
    token_column: &str,
    subject: &str,
    mode: AllowModeDefinition,
    input: &str,
) -> ControlDefinition {
    ControlDefinition {
        id: id.to_string(),
        title: title_for(id),
        severity: Some(Severity::Medium.as_str().to_string()),
        impact: Some(0.5),
        remediation: remediation_for(id),
        subject: Some(subject.to_string()),
        query: QueryDefinition::Columns {
            resource: resource.to_string(),
            all_namespaces: true,
            columns: vec![".metadata.name".to_string(), token_column.to_string()],
        },
        parser: None,
        condition: ConditionDefinition::Equals {
            value: "false".to_string(),
        },
        quantifier: QuantifierDefinition::All,
        allowlist: Some(AllowlistDefinition {
            mode,
            input: Some(input.to_string()),
            entries: Vec::new(),
        }),
        tags: ControlTags {
            cis_rid: Some("4.1.6".to_string()),
            cis_level: Some(1),
            nist: vec!["AC-6 (9)".to_string(), "CM-2".to_string()],
            cis_controls: cis_controls(&[("6", "5.1"), ("7", "5.2")]),
        },
    }
}

/// `(controls version, safeguard)` pairs; a version may repeat.
fn cis_controls(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (version, safeguard) in pairs {
        out.entry(version.to_string())
            .or_default()
            .push(safeguard.to_string());
    }
    out
}

fn title_for(id: &str) -> String {
    lookup_explanation(id)
        .map(|e| e.title.to_string())
        .unwrap_or_else(|| id.to_string())
}

fn remediation_for(id: &str) -> Option<String> {
    lookup_explanation(id).map(|e| e.remediation.to_string())
}
