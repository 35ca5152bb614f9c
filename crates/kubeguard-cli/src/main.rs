//! CLI entry point for kubeguard.
//!
//! This module is intentionally thin: it handles argument parsing, logging setup, I/O, and
//! exit codes. All business logic lives in the `kubeguard-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{ArgAction, Args, Parser, Subcommand};
use kubeguard_app::{
    CheckInput, ExplainOutput, format_list, load_config, parse_report_json, render_annotations,
    render_markdown, run_check, run_explain, run_list, runtime_error_report, serialize_report,
    to_renderable, verdict_exit_code,
};
use kubeguard_query::{KubectlRunner, QueryRunner, ReplayRunner};
use kubeguard_settings::{Overrides, ResolvedConfig};
use kubeguard_types::KubeguardReport;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive; overrides `-v`/`--quiet`.
const LOG_ENV: &str = "KUBEGUARD_LOG";

#[derive(Parser, Debug)]
#[command(
    name = "kubeguard",
    version,
    about = "CIS Kubernetes/EKS benchmark control checks driven by kubectl queries"
)]
struct Cli {
    /// Path to kubeguard config TOML (missing file means defaults).
    #[arg(long, default_value = "kubeguard.toml")]
    config: Utf8PathBuf,

    /// Override profile (eks-cis|audit|custom).
    #[arg(long)]
    profile: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Logs go to stderr.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

/// How to reach the cluster (or recorded output standing in for it).
#[derive(Args, Debug, Clone)]
struct QueryArgs {
    /// kubectl executable.
    #[arg(long, default_value = "kubectl")]
    kubectl: String,

    /// kubeconfig context to use.
    #[arg(long)]
    context: Option<String>,

    /// kubeconfig file to use.
    #[arg(long)]
    kubeconfig: Option<String>,

    /// Read recorded query output from this directory instead of running kubectl
    /// (`<resource>.txt` for column queries, `<resource>.json` for JSON queries).
    #[arg(long)]
    replay_dir: Option<Utf8PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate controls and write artifacts.
    Check {
        #[command(flatten)]
        query: QueryArgs,

        /// Per-query timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Lowest severity whose failed controls fail the run (low|medium|high|critical).
        #[arg(long)]
        fail_on: Option<String>,

        /// Worker threads for control evaluation (default: one per CPU).
        #[arg(long)]
        jobs: Option<usize>,

        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/kubeguard/report.json")]
        report_out: Utf8PathBuf,

        /// Write a Markdown report alongside the JSON.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown report (if enabled).
        #[arg(long, default_value = "artifacts/kubeguard/comment.md")]
        markdown_out: Utf8PathBuf,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/kubeguard/report.json")]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/kubeguard/report.json")]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit.
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Explain a control id or code with rationale and remediation guidance.
    Explain {
        /// The control id (e.g., "eks-cis-4.2.7") or code (e.g., "non_compliant_value").
        identifier: String,
    },

    /// List the controls the effective configuration enables.
    List {
        #[command(flatten)]
        query: QueryArgs,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match &cli.cmd {
        Commands::Check {
            query,
            timeout_secs,
            fail_on,
            jobs,
            report_out,
            write_markdown,
            markdown_out,
        } => {
            let overrides = Overrides {
                profile: cli.profile.clone(),
                fail_on: fail_on.clone(),
                timeout_secs: *timeout_secs,
            };
            cmd_check(
                &cli.config,
                overrides,
                query,
                *jobs,
                report_out,
                (*write_markdown).then_some(markdown_out.as_path()),
            )
        }
        Commands::Md { report, output } => cmd_md(report, output.as_deref()),
        Commands::Annotations { report, max } => cmd_annotations(report, *max),
        Commands::Explain { identifier } => cmd_explain(identifier),
        Commands::List { query } => cmd_list(&cli, query),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn cmd_check(
    config_path: &Utf8Path,
    overrides: Overrides,
    query: &QueryArgs,
    jobs: Option<usize>,
    report_out: &Utf8Path,
    markdown_out: Option<&Utf8Path>,
) -> anyhow::Result<()> {
    let result = (|| -> anyhow::Result<i32> {
        let cfg_text = read_config(config_path)?;
        let resolved = load_config(&cfg_text, overrides)?;
        let runner = build_runner(query, &resolved);

        let output = run_check(CheckInput {
            resolved,
            runner: runner.as_ref(),
            jobs,
        })?;

        write_report_file(report_out, &output.report).context("write report json")?;

        if let Some(markdown_out) = markdown_out {
            let renderable = to_renderable(&output.report);
            let md = render_markdown(&renderable);
            write_text_file(markdown_out, &md).context("write markdown")?;
        }

        tracing::info!(report = %report_out, "report written");
        Ok(verdict_exit_code(output.report.verdict))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            let report = runtime_error_report(&format!("{err:#}"));
            let _ = write_report_file(report_out, &report);
            eprintln!("kubeguard error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn cmd_list(cli: &Cli, query: &QueryArgs) -> anyhow::Result<()> {
    let cfg_text = read_config(&cli.config)?;
    let overrides = Overrides {
        profile: cli.profile.clone(),
        ..Overrides::default()
    };
    let resolved = load_config(&cfg_text, overrides)?;
    let runner = build_runner(query, &resolved);
    let rows = run_list(&resolved.effective, runner.as_ref());
    print!("{}", format_list(&resolved.effective.profile, &rows));
    Ok(())
}

/// Load config if present; a missing file is allowed (defaults apply).
fn read_config(path: &Utf8Path) -> anyhow::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(config = %path, "config not found; using defaults");
            Ok(String::new())
        }
        Err(err) => Err(err).with_context(|| format!("read config: {path}")),
    }
}

fn build_runner(query: &QueryArgs, resolved: &ResolvedConfig) -> Box<dyn QueryRunner> {
    match &query.replay_dir {
        Some(dir) => Box::new(ReplayRunner::new(dir.clone())),
        None => Box::new(
            KubectlRunner::new(
                query.kubectl.clone(),
                Duration::from_secs(resolved.effective.timeout_secs),
            )
            .with_context(query.context.clone())
            .with_kubeconfig(query.kubeconfig.clone()),
        ),
    }
}

fn write_report_file(path: &Utf8Path, report: &KubeguardReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    let data = serialize_report(report).context("serialize report")?;
    std::fs::write(path, data).with_context(|| format!("write report: {}", path))?;
    Ok(())
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {}", path))?;
    Ok(())
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<()> {
    let report_text = std::fs::read_to_string(report_path)
        .with_context(|| format!("read report: {}", report_path))?;
    let report = parse_report_json(&report_text)?;
    let renderable = to_renderable(&report);
    let md = render_markdown(&renderable);

    if let Some(out_path) = output {
        write_text_file(out_path, &md).context("write markdown output")?;
    } else {
        print!("{}", md);
    }

    Ok(())
}

fn cmd_annotations(report_path: &Utf8Path, max: usize) -> anyhow::Result<()> {
    let report_text = std::fs::read_to_string(report_path)
        .with_context(|| format!("read report: {}", report_path))?;
    let report = parse_report_json(&report_text)?;
    let renderable = to_renderable(&report);

    for annotation in render_annotations(&renderable, max) {
        println!("{}", annotation);
    }

    Ok(())
}

fn cmd_explain(identifier: &str) -> anyhow::Result<()> {
    match run_explain(identifier) {
        ExplainOutput::Found(entry) => {
            print!("{}", kubeguard_app::format_explanation(&entry));
            Ok(())
        }
        ExplainOutput::NotFound {
            identifier,
            available_control_ids,
            available_codes,
        } => {
            let text = kubeguard_app::format_not_found(
                &identifier,
                available_control_ids,
                available_codes,
            );
            eprint!("{text}");
            std::process::exit(1);
        }
    }
}
