use crate::{RenderableReport, RenderableStatus};

/// Render violations and parser warnings as GitHub Actions workflow command annotations.
///
/// Format:
/// `::{level} title={control_id}::[{control_id}:{code}] {identifier}: {message}`
///
/// Errored controls and violations are `error`; parser warnings are `notice`.
pub fn render_github_annotations(report: &RenderableReport) -> Vec<String> {
    let mut out = Vec::new();

    for c in &report.controls {
        let level = match c.status {
            RenderableStatus::Pass => "notice",
            RenderableStatus::Fail | RenderableStatus::Error => "error",
        };
        let title = escape_property(&c.control_id);

        for v in &c.violations {
            let message = escape_data(&format!(
                "[{}:{}] {}: {}",
                c.control_id, v.code, v.identifier, c.message
            ));
            out.push(format!("::{level} title={title}::{message}"));
        }

        for w in &c.warnings {
            let message = escape_data(&format!("[{}] {}", c.control_id, w));
            out.push(format!("::notice title={title}::{message}"));
        }
    }

    out
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        RenderableControl, RenderableData, RenderableVerdictStatus, RenderableViolation,
    };

    fn report(controls: Vec<RenderableControl>) -> RenderableReport {
        RenderableReport {
            verdict: RenderableVerdictStatus::Fail,
            controls,
            data: RenderableData {
                profile: "eks-cis".to_string(),
                controls_total: 1,
                controls_passed: 0,
                controls_failed: 1,
                controls_errored: 0,
                violations_total: 2,
            },
        }
    }

    #[test]
    fn one_annotation_per_violation_and_warning() {
        let anns = render_github_annotations(&report(vec![RenderableControl {
            control_id: "eks-cis-4.1.6-service-accounts".to_string(),
            title: "t".to_string(),
            severity: "medium".to_string(),
            status: RenderableStatus::Fail,
            message: "List of service accounts with automountServiceAccountToken setting: sa-b, sa-c"
                .to_string(),
            remediation: None,
            violations: vec![
                RenderableViolation {
                    identifier: "sa-b".to_string(),
                    code: "non_compliant_value".to_string(),
                },
                RenderableViolation {
                    identifier: "sa-c".to_string(),
                    code: "non_compliant_value".to_string(),
                },
            ],
            warnings: vec!["100% odd\nline".to_string()],
        }]));

        assert_eq!(anns.len(), 3);
        assert!(anns[0].starts_with("::error title=eks-cis-4.1.6-service-accounts::"));
        assert!(anns[0].contains("[eks-cis-4.1.6-service-accounts:non_compliant_value] sa-b:"));
        assert!(anns[2].starts_with("::notice "));
        assert!(anns[2].contains("100%25 odd%0Aline"));
    }

    #[test]
    fn passing_controls_emit_nothing() {
        let anns = render_github_annotations(&report(vec![RenderableControl {
            control_id: "eks-cis-4.2.7".to_string(),
            title: "t".to_string(),
            severity: "medium".to_string(),
            status: RenderableStatus::Pass,
            message: "restricted satisfies is null or is empty".to_string(),
            remediation: None,
            violations: Vec::new(),
            warnings: Vec::new(),
        }]));
        assert!(anns.is_empty());
    }
}
