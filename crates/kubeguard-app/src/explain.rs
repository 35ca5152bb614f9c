//! The `explain` use case: look up control/code documentation.

use crate::load_config;
use kubeguard_domain::policy::Quantifier;
use kubeguard_query::kubectl_args;
use kubeguard_settings::Overrides;
use kubeguard_types::ControlTags;
use kubeguard_types::explain::{self, Explanation};

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    /// Found an explanation for the identifier.
    Found(ExplainEntry),
    /// Unknown identifier; includes available control ids and codes.
    NotFound {
        identifier: String,
        available_control_ids: &'static [&'static str],
        available_codes: &'static [&'static str],
    },
}

/// Documentation for one identifier, plus benchmark details when it names a built-in control.
#[derive(Clone, Debug)]
pub struct ExplainEntry {
    pub identifier: String,
    pub explanation: Explanation,
    pub control: Option<ControlFacts>,
}

/// How a built-in control is checked, as shipped in the `eks-cis` catalog.
#[derive(Clone, Debug)]
pub struct ControlFacts {
    pub severity: String,
    pub impact: f32,
    pub quantifier: Quantifier,
    pub command: String,
    pub tags: ControlTags,
}

/// Look up an explanation for a control id or code.
pub fn run_explain(identifier: &str) -> ExplainOutput {
    match explain::lookup_explanation(identifier) {
        Some(explanation) => ExplainOutput::Found(ExplainEntry {
            identifier: identifier.to_string(),
            explanation,
            control: builtin_control_facts(identifier),
        }),
        None => ExplainOutput::NotFound {
            identifier: identifier.to_string(),
            available_control_ids: explain::all_control_ids(),
            available_codes: explain::all_codes(),
        },
    }
}

fn builtin_control_facts(id: &str) -> Option<ControlFacts> {
    let resolved = load_config("", Overrides::default()).ok()?;
    let control = resolved.effective.control(id)?;
    let mut command = String::from("kubectl");
    for arg in kubectl_args(&control.query) {
        command.push(' ');
        command.push_str(&arg);
    }
    Some(ControlFacts {
        severity: control.severity.as_str().to_string(),
        impact: control.impact,
        quantifier: control.quantifier,
        command,
        tags: control.tags.clone(),
    })
}

/// Format an explanation for terminal display.
pub fn format_explanation(entry: &ExplainEntry) -> String {
    let exp = &entry.explanation;
    let mut out = format!("{}: {}
", entry.identifier, exp.title);

    if let Some(facts) = &entry.control {
        out.push('\n');
        if let Some(rid) = &facts.tags.cis_rid {
            match facts.tags.cis_level {
                Some(level) => out.push_str(&format!("  CIS EKS {rid} (level {level})\n")),
                None => out.push_str(&format!("  CIS EKS {rid}\n")),
            }
        }
        if !facts.tags.nist.is_empty() {
            out.push_str(&format!("  NIST 800-53: {}\n", facts.tags.nist.join(", ")));
        }
        if !facts.tags.cis_controls.is_empty() {
            let mapped: Vec<String> = facts
                .tags
                .cis_controls
                .iter()
                .map(|(version, safeguards)| format!("v{version} {}", safeguards.join("/")))
                .collect();
            out.push_str(&format!("  CIS Controls: {}\n", mapped.join(", ")));
        }
        out.push_str(&format!(
            "  severity {} (impact {:.1})\n",
            facts.severity, facts.impact
        ));
        let rule = match facts.quantifier {
            Quantifier::All => "every record must comply",
            Quantifier::Any => "at least one record must comply",
        };
        out.push_str(&format!("  query: {}\n  rule: {rule}\n", facts.command));
    }

    out.push('\n');
    out.push_str(exp.description);
    out.push_str("\n\nRemediation\n-----------\n");
    out.push_str(exp.remediation);
    out.push_str("\n\nNon-compliant:\n```yaml\n");
    out.push_str(exp.examples.before);
    out.push_str("\n```\n\nCompliant:\n```yaml\n");
    out.push_str(exp.examples.after);
    out.push_str("\n```\n");

    out
}

/// Format the "not found" error message for terminal display.
pub fn format_not_found(
    identifier: &str,
    control_ids: &[&'static str],
    codes: &[&'static str],
) -> String {
    let mut out = String::new();

    out.push_str(&format!("Unknown control id or code: {}\n\n", identifier));
    out.push_str("Available control ids:\n");
    for id in control_ids {
        out.push_str(&format!("  - {}\n", id));
    }
    out.push_str("\nAvailable codes:\n");
    for code in codes {
        out.push_str(&format!("  - {}\n", code));
    }

    out
}
