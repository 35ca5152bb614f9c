use crate::{RenderableControl, RenderableReport, RenderableStatus, RenderableVerdictStatus};

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str("# Kubeguard report\n\n");
    let verdict = match report.verdict {
        RenderableVerdictStatus::Pass => "PASS",
        RenderableVerdictStatus::Warn => "WARN",
        RenderableVerdictStatus::Fail => "FAIL",
    };
    let d = &report.data;
    out.push_str(&format!(
        "- Verdict: **{}**\n- Profile: `{}`\n- Controls: {} total, {} passed, {} failed, {} errored\n- Violations: {}\n\n",
        verdict,
        d.profile,
        d.controls_total,
        d.controls_passed,
        d.controls_failed,
        d.controls_errored,
        d.violations_total
    ));

    if report.controls.is_empty() {
        out.push_str("No controls evaluated.\n");
        return out;
    }

    out.push_str("| Control | Severity | Status |\n|---|---|---|\n");
    for c in &report.controls {
        out.push_str(&format!(
            "| `{}` {} | {} | {} |\n",
            c.control_id,
            escape_cell(&c.title),
            c.severity,
            status_label(c.status)
        ));
    }
    out.push('\n');

    let failing: Vec<&RenderableControl> = report
        .controls
        .iter()
        .filter(|c| c.status != RenderableStatus::Pass)
        .collect();
    if failing.is_empty() {
        out.push_str("All controls passed.\n");
    } else {
        out.push_str("## Failing controls\n\n");
        for c in failing {
            render_failing(&mut out, c);
        }
    }

    let warned: Vec<&RenderableControl> = report
        .controls
        .iter()
        .filter(|c| !c.warnings.is_empty())
        .collect();
    if !warned.is_empty() {
        out.push_str("## Warnings\n\n");
        for c in warned {
            for w in &c.warnings {
                out.push_str(&format!("- `{}`: {}\n", c.control_id, w));
            }
        }
        out.push('\n');
    }

    out
}

fn render_failing(out: &mut String, c: &RenderableControl) {
    out.push_str(&format!(
        "### [{}] `{}` {}\n\n{}\n\n",
        status_label(c.status),
        c.control_id,
        c.title,
        c.message
    ));
    for v in &c.violations {
        out.push_str(&format!("- `{}` ({})\n", v.identifier, v.code));
    }
    if !c.violations.is_empty() {
        out.push('\n');
    }
    if let Some(fix) = &c.remediation {
        out.push_str("<details><summary>Remediation</summary>\n\n");
        out.push_str(fix.trim_end());
        out.push_str("\n\n</details>\n\n");
    }
}

fn status_label(status: RenderableStatus) -> &'static str {
    match status {
        RenderableStatus::Pass => "PASS",
        RenderableStatus::Fail => "FAIL",
        RenderableStatus::Error => "ERROR",
    }
}

fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|")
}
