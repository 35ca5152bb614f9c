use crate::allowlist::{AllowMatcher, AllowMode};
use crate::condition::Condition;
use crate::parse::{DEFAULT_LINE_PATTERN, JsonParser, LineParser, RecordParser};
use crate::policy::{Control, EffectiveConfig, QuerySpec, Quantifier};
use kubeguard_types::{ControlTags, Severity};

pub fn line_control(resource: &str, mode: AllowMode, allow: &[&str]) -> Control {
    let entries: Vec<String> = allow.iter().map(|s| s.to_string()).collect();
    Control {
        id: format!("test-{resource}"),
        title: "automount".to_string(),
        severity: Severity::Medium,
        impact: 0.5,
        remediation: Some("set automountServiceAccountToken: false".to_string()),
        subject: format!("List of {resource} with automountServiceAccountToken setting"),
        query: QuerySpec::columns(
            resource,
            true,
            &[".metadata.name", ".spec.automountServiceAccountToken"],
        ),
        parser: RecordParser::Lines(
            LineParser::new(DEFAULT_LINE_PATTERN, "automountServiceAccountToken")
                .expect("default pattern compiles"),
        ),
        condition: Condition::Equals("false".to_string()),
        quantifier: Quantifier::All,
        allowlist: AllowMatcher::compile(mode, &entries).expect("allowlist compiles"),
        tags: ControlTags::default(),
    }
}

pub fn existential_psp_control() -> Control {
    Control {
        id: "test-psp".to_string(),
        title: "capabilities".to_string(),
        severity: Severity::Medium,
        impact: 0.5,
        remediation: None,
        subject: "Pod security policies".to_string(),
        query: QuerySpec::json("psp", false),
        parser: RecordParser::Json(JsonParser::new("spec.allowedCapabilities")),
        condition: Condition::AnyOf(vec![Condition::IsNull, Condition::IsEmpty]),
        quantifier: Quantifier::Any,
        allowlist: AllowMatcher::Empty,
        tags: ControlTags::default(),
    }
}

pub fn config(fail_on: Severity, controls: Vec<Control>) -> EffectiveConfig {
    EffectiveConfig {
        profile: "test".to_string(),
        fail_on,
        timeout_secs: 5,
        controls,
    }
}
