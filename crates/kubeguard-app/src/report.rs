use anyhow::Context;
use kubeguard_render::{
    RenderableControl, RenderableData, RenderableReport, RenderableStatus,
    RenderableVerdictStatus, RenderableViolation,
};
use kubeguard_types::{
    ControlResult, ControlStatus, ControlTags, KubeguardData, KubeguardReport, ReportEnvelope,
    SCHEMA_REPORT_V1, Severity, ToolMeta, Verdict, Violation, ids,
};
use time::OffsetDateTime;

pub fn parse_report_json(text: &str) -> anyhow::Result<KubeguardReport> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;

    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if schema != SCHEMA_REPORT_V1 {
        anyhow::bail!("unknown report schema: {schema:?} (expected {SCHEMA_REPORT_V1})");
    }

    serde_json::from_value(value).context("parse kubeguard report")
}

pub fn serialize_report(report: &KubeguardReport) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec_pretty(report).context("serialize report")
}

pub fn to_renderable(report: &KubeguardReport) -> RenderableReport {
    RenderableReport {
        verdict: match report.verdict {
            Verdict::Pass => RenderableVerdictStatus::Pass,
            Verdict::Warn => RenderableVerdictStatus::Warn,
            Verdict::Fail => RenderableVerdictStatus::Fail,
        },
        controls: report.results.iter().map(renderable_control).collect(),
        data: RenderableData {
            profile: report.data.profile.clone(),
            controls_total: report.data.controls_total,
            controls_passed: report.data.controls_passed,
            controls_failed: report.data.controls_failed,
            controls_errored: report.data.controls_errored,
            violations_total: report.data.violations_total,
        },
    }
}

fn renderable_control(r: &ControlResult) -> RenderableControl {
    RenderableControl {
        control_id: r.control_id.clone(),
        title: r.title.clone(),
        severity: r.severity.as_str().to_string(),
        status: match r.status {
            ControlStatus::Pass => RenderableStatus::Pass,
            ControlStatus::Fail => RenderableStatus::Fail,
            ControlStatus::Error => RenderableStatus::Error,
        },
        message: r.message.clone(),
        remediation: r.remediation.clone(),
        violations: r
            .violations
            .iter()
            .map(|v| RenderableViolation {
                identifier: v.identifier.clone(),
                code: v.code.clone(),
            })
            .collect(),
        warnings: r.warnings.clone(),
    }
}

/// A report describing a failure of the tool itself (bad config, unwritable output, ...).
///
/// It carries a single errored `tool.runtime` result so consumers still get a well-formed report.
pub fn runtime_error_report(message: &str) -> KubeguardReport {
    let now = OffsetDateTime::now_utc();
    ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "kubeguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at: now,
        finished_at: now,
        verdict: Verdict::Fail,
        results: vec![ControlResult {
            control_id: ids::CONTROL_TOOL_RUNTIME.to_string(),
            title: "kubeguard runtime".to_string(),
            severity: Severity::Critical,
            impact: 1.0,
            status: ControlStatus::Error,
            message: message.to_string(),
            remediation: Some("Fix the tool error and re-run kubeguard.".to_string()),
            records_evaluated: 0,
            violations: vec![Violation {
                identifier: "kubeguard".to_string(),
                code: ids::CODE_RUNTIME_ERROR.to_string(),
                value: serde_json::Value::Null,
                fingerprint: None,
            }],
            warnings: Vec::new(),
            tags: ControlTags::default(),
        }],
        data: KubeguardData {
            profile: "unknown".to_string(),
            fail_on: Severity::Low.as_str().to_string(),
            controls_total: 1,
            controls_passed: 0,
            controls_failed: 0,
            controls_errored: 1,
            violations_total: 1,
        },
    }
}
