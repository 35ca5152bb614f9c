//! The `check` use case: resolve controls, run their queries, evaluate, and produce a report.

use anyhow::Context;
use kubeguard_domain::model::QueryFailure;
use kubeguard_domain::policy::Control;
use kubeguard_domain::{evaluate_control, summarize};
use kubeguard_query::QueryRunner;
use kubeguard_settings::{KubeguardConfigV1, Overrides, ResolvedConfig};
use kubeguard_types::{
    ControlResult, KubeguardReport, ReportEnvelope, SCHEMA_REPORT_V1, ToolMeta, Verdict,
};
use rayon::prelude::*;
use time::OffsetDateTime;
use tracing::{debug, info, info_span, warn};

/// Input for the check use case.
pub struct CheckInput<'a> {
    /// Resolved configuration (see [`load_config`]).
    pub resolved: ResolvedConfig,
    /// Executes each control's query. Built by the caller from the resolved timeout.
    pub runner: &'a dyn QueryRunner,
    /// Worker threads for control evaluation; `None` uses one per CPU.
    pub jobs: Option<usize>,
}

/// Output from the check use case.
#[derive(Clone, Debug)]
pub struct CheckOutput {
    /// The generated report.
    pub report: KubeguardReport,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Parse and resolve config text. Empty text means defaults.
pub fn load_config(config_text: &str, overrides: Overrides) -> anyhow::Result<ResolvedConfig> {
    let cfg = if config_text.trim().is_empty() {
        KubeguardConfigV1::default()
    } else {
        kubeguard_settings::parse_config_toml(config_text).context("parse config")?
    };
    kubeguard_settings::resolve_config(cfg, overrides).context("resolve config")
}

/// Run the check use case.
///
/// Query and parse failures become `error` results; only worker-pool problems are returned
/// as `Err`.
pub fn run_check(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    let started_at = OffsetDateTime::now_utc();

    let resolved = input.resolved;
    let effective = &resolved.effective;
    info!(
        profile = %effective.profile,
        controls = effective.controls.len(),
        "starting check"
    );

    let results = evaluate_all(&effective.controls, input.runner, input.jobs)?;
    let domain_report = summarize(effective, results);

    let finished_at = OffsetDateTime::now_utc();
    info!(
        verdict = ?domain_report.verdict,
        passed = domain_report.counts.pass,
        failed = domain_report.counts.fail,
        errored = domain_report.counts.error,
        elapsed_ms = (finished_at - started_at).whole_milliseconds().max(0) as u64,
        "check finished"
    );

    let report = ReportEnvelope {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "kubeguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        started_at,
        finished_at,
        verdict: domain_report.verdict,
        results: domain_report.results,
        data: domain_report.data,
    };

    Ok(CheckOutput {
        report,
        resolved_config: resolved,
    })
}

/// Evaluate controls in parallel. `collect` on an indexed parallel iterator keeps definition order.
fn evaluate_all(
    controls: &[Control],
    runner: &dyn QueryRunner,
    jobs: Option<usize>,
) -> anyhow::Result<Vec<ControlResult>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.unwrap_or(0))
        .thread_name(|i| format!("kubeguard-worker-{i}"))
        .build()
        .context("build worker pool")?;

    Ok(pool.install(|| {
        controls
            .par_iter()
            .map(|control| run_control(control, runner))
            .collect()
    }))
}

fn run_control(control: &Control, runner: &dyn QueryRunner) -> ControlResult {
    let span = info_span!("control", control_id = %control.id);
    let _enter = span.enter();

    debug!(command = %runner.describe(&control.query), "querying");
    let result = match runner.invoke(&control.query) {
        Ok(raw) => {
            // kubectl reports deprecations and similar notices on stderr of a successful call.
            let notice = raw.stderr.trim();
            if !notice.is_empty() {
                warn!(stderr = %notice, "query succeeded with diagnostics");
            }
            evaluate_control(control, Ok(raw.stdout.as_str()))
        }
        Err(err) => {
            warn!(error = %err, "query failed");
            let failure = QueryFailure::from(&err);
            evaluate_control(control, Err(&failure))
        }
    };

    for warning in &result.warnings {
        warn!(%warning, "record parser");
    }
    debug!(
        status = ?result.status,
        records = result.records_evaluated,
        violations = result.violations.len(),
        "evaluated"
    );
    result
}

/// Map verdict to exit code: 0 = pass/warn, 2 = fail.
pub fn verdict_exit_code(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Pass => 0,
        Verdict::Warn => 0,
        Verdict::Fail => 2,
    }
}
