use crate::fingerprint::fingerprint_for_violation;
use crate::model::{QueryFailure, ResourceRecord};
use crate::policy::{Control, EffectiveConfig, Quantifier};
use crate::report::{DomainReport, StatusCounts};
use kubeguard_types::{ControlResult, ControlStatus, KubeguardData, Verdict, Violation, ids};
use serde_json::Value;

/// Outcome of applying a control's condition, quantifier and allowlist to parsed records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evaluation {
    pub violations: Vec<Violation>,
    /// For existential controls: the first record that satisfied the condition.
    pub satisfied_by: Option<String>,
}

/// Evaluate one control against its query output.
///
/// A query failure or a structured parse failure yields an `Error` result carrying a single
/// violation; nothing here aborts other controls.
pub fn evaluate_control(control: &Control, output: Result<&str, &QueryFailure>) -> ControlResult {
    let text = match output {
        Ok(text) => text,
        Err(failure) => {
            return error_result(
                control,
                ids::CODE_QUERY_FAILED,
                format!(
                    "query execution failed ({}): {}",
                    failure.kind.as_str(),
                    failure.message
                ),
            );
        }
    };

    let parsed = match control.parser.parse(text) {
        Ok(parsed) => parsed,
        Err(err) => {
            return error_result(
                control,
                ids::CODE_PARSE_FAILED,
                format!("could not parse query output: {err}"),
            );
        }
    };

    let evaluation = evaluate_records(control, &parsed.records);
    let message = result_message(control, &parsed.records, &evaluation);
    let status = if evaluation.violations.is_empty() {
        ControlStatus::Pass
    } else {
        ControlStatus::Fail
    };

    ControlResult {
        control_id: control.id.clone(),
        title: control.title.clone(),
        severity: control.severity,
        impact: control.impact,
        status,
        message,
        remediation: control.remediation.clone(),
        records_evaluated: parsed.records.len() as u32,
        violations: evaluation.violations,
        warnings: parsed.warnings,
        tags: control.tags.clone(),
    }
}

/// Apply the control's quantifier to already-parsed records.
pub fn evaluate_records(control: &Control, records: &[ResourceRecord]) -> Evaluation {
    match control.quantifier {
        Quantifier::All => Evaluation {
            violations: records
                .iter()
                .filter(|r| !control.allowlist.is_allowed(&r.identifier))
                .filter(|r| !control.condition.is_satisfied_by(&r.value))
                .map(|r| violation(control, ids::CODE_NON_COMPLIANT_VALUE, r))
                .collect(),
            satisfied_by: None,
        },
        Quantifier::Any => {
            // The allowlist exempts records from violation; it never makes a record compliant.
            if let Some(r) = records
                .iter()
                .find(|r| control.condition.is_satisfied_by(&r.value))
            {
                return Evaluation {
                    violations: Vec::new(),
                    satisfied_by: Some(r.identifier.clone()),
                };
            }

            if records.is_empty() {
                let identifier = control.query.resource.clone();
                return Evaluation {
                    violations: vec![Violation {
                        fingerprint: Some(fingerprint_for_violation(
                            &control.id,
                            ids::CODE_NO_COMPLIANT_RESOURCE,
                            &identifier,
                        )),
                        identifier,
                        code: ids::CODE_NO_COMPLIANT_RESOURCE.to_string(),
                        value: Value::Null,
                    }],
                    satisfied_by: None,
                };
            }

            Evaluation {
                violations: records
                    .iter()
                    .map(|r| violation(control, ids::CODE_NON_COMPLIANT_VALUE, r))
                    .collect(),
                satisfied_by: None,
            }
        }
    }
}

/// Build the run-level report from per-control results (kept in control order).
pub fn summarize(cfg: &EffectiveConfig, results: Vec<ControlResult>) -> DomainReport {
    let counts = StatusCounts::from_results(&results);
    let verdict = compute_verdict(&results, cfg);

    let data = KubeguardData {
        profile: cfg.profile.clone(),
        fail_on: cfg.fail_on.as_str().to_string(),
        controls_total: results.len() as u32,
        controls_passed: counts.pass,
        controls_failed: counts.fail,
        controls_errored: counts.error,
        violations_total: results.iter().map(|r| r.violations.len() as u32).sum(),
    };

    DomainReport {
        verdict,
        results,
        data,
        counts,
    }
}

fn compute_verdict(results: &[ControlResult], cfg: &EffectiveConfig) -> Verdict {
    // Fail closed: a control that could not be evaluated fails the run.
    if results.iter().any(|r| r.status == ControlStatus::Error) {
        return Verdict::Fail;
    }

    let failed = results.iter().filter(|r| r.status == ControlStatus::Fail);
    let mut verdict = Verdict::Pass;
    for r in failed {
        if r.severity >= cfg.fail_on {
            return Verdict::Fail;
        }
        verdict = Verdict::Warn;
    }
    verdict
}

fn violation(control: &Control, code: &str, record: &ResourceRecord) -> Violation {
    Violation {
        identifier: record.identifier.clone(),
        code: code.to_string(),
        value: record.value.to_json(),
        fingerprint: Some(fingerprint_for_violation(&control.id, code, &record.identifier)),
    }
}

fn error_result(control: &Control, code: &str, message: String) -> ControlResult {
    let identifier = control.query.resource.clone();
    ControlResult {
        control_id: control.id.clone(),
        title: control.title.clone(),
        severity: control.severity,
        impact: control.impact,
        status: ControlStatus::Error,
        remediation: control.remediation.clone(),
        records_evaluated: 0,
        violations: vec![Violation {
            fingerprint: Some(fingerprint_for_violation(&control.id, code, &identifier)),
            identifier,
            code: code.to_string(),
            value: Value::String(message.clone()),
        }],
        message,
        warnings: Vec::new(),
        tags: control.tags.clone(),
    }
}

fn result_message(control: &Control, records: &[ResourceRecord], eval: &Evaluation) -> String {
    let attribute = control.parser.attribute();
    match control.quantifier {
        Quantifier::All => {
            if eval.violations.is_empty() {
                format!("{}: none", control.subject)
            } else {
                let names: Vec<&str> = eval
                    .violations
                    .iter()
                    .map(|v| v.identifier.as_str())
                    .collect();
                format!("{}: {}", control.subject, names.join(", "))
            }
        }
        Quantifier::Any => match &eval.satisfied_by {
            Some(id) => format!(
                "{} '{}' satisfies: {} {}",
                control.query.resource, id, attribute, control.condition
            ),
            None if records.is_empty() => format!(
                "no {} found; at least one must satisfy: {} {}",
                control.query.resource, attribute, control.condition
            ),
            None => {
                let names: Vec<&str> = records.iter().map(|r| r.identifier.as_str()).collect();
                format!(
                    "no {} satisfies: {} {} (checked: {})",
                    control.query.resource,
                    attribute,
                    control.condition,
                    names.join(", ")
                )
            }
        },
    }
}
