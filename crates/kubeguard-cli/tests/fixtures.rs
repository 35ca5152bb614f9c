//! End-to-end CLI integration tests using recorded cluster output.
//!
//! Each fixture in `tests/fixtures/` contains:
//! - a `kubeguard.toml` (possibly empty, meaning defaults)
//! - recorded query output: `pods.txt`, `serviceaccounts.txt`, `psp.json`
//!
//! These tests run `kubeguard check --replay-dir <fixture>` and verify the exit code and the
//! parts of the JSON report each fixture exists to exercise.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to get a Command for the kubeguard binary.
/// Wraps the deprecated cargo_bin to centralize the deprecation warning.
#[allow(deprecated)]
fn kubeguard_cmd() -> Command {
    Command::cargo_bin("kubeguard").expect("kubeguard binary not found - run `cargo build` first")
}

/// Get the path to the test fixtures directory
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("kubeguard-cli crate should have a parent directory")
        .parent()
        .expect("crates directory should have a parent (repo root)")
        .join("tests")
        .join("fixtures")
}

struct CheckRun {
    exit_code: i32,
    report: Value,
    _temp_dir: TempDir,
    report_path: PathBuf,
}

/// Run the CLI check command against a fixture and return the JSON report.
fn run_check_on_fixture(fixture_name: &str, extra: &[&str]) -> CheckRun {
    let fixture_path = fixtures_dir().join(fixture_name);
    assert!(fixture_path.exists(), "missing fixture {fixture_name}");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let report_path = temp_dir.path().join("report.json");

    let output = kubeguard_cmd()
        .arg("--config")
        .arg(fixture_path.join("kubeguard.toml"))
        .arg("check")
        .arg("--replay-dir")
        .arg(&fixture_path)
        .arg("--report-out")
        .arg(&report_path)
        .args(extra)
        .output()
        .expect("Failed to run command");

    let exit_code = output.status.code().unwrap_or(-1);
    let report = read_report(&report_path);

    CheckRun {
        exit_code,
        report,
        _temp_dir: temp_dir,
        report_path,
    }
}

fn read_report(path: &Path) -> Value {
    let content = std::fs::read_to_string(path).expect("Failed to read report");
    serde_json::from_str(&content).expect("Failed to parse report JSON")
}

fn result<'a>(report: &'a Value, control_id: &str) -> &'a Value {
    report["results"]
        .as_array()
        .expect("results should be array")
        .iter()
        .find(|r| r["control_id"] == control_id)
        .unwrap_or_else(|| panic!("no result for {control_id}"))
}

fn violating(result: &Value) -> Vec<String> {
    result["violations"]
        .as_array()
        .expect("violations should be array")
        .iter()
        .map(|v| v["identifier"].as_str().expect("identifier").to_string())
        .collect()
}

// ============================================================================
// Fixture tests
// ============================================================================

#[test]
fn fixture_compliant_passes() {
    let run = run_check_on_fixture("compliant", &[]);

    assert_eq!(run.exit_code, 0, "compliant fixture should exit with 0 (pass)");
    assert_eq!(run.report["schema"], "kubeguard.report.v1");
    assert_eq!(run.report["verdict"], "pass");
    assert_eq!(run.report["data"]["profile"], "eks-cis");
    assert_eq!(run.report["data"]["controls_total"], 3);
    assert_eq!(run.report["data"]["violations_total"], 0);
    for r in run.report["results"].as_array().expect("results") {
        assert_eq!(r["status"], "pass", "{}", r["control_id"]);
        assert!(r["violations"].as_array().expect("violations").is_empty());
    }

    let psp = result(&run.report, "eks-cis-4.2.7");
    assert_eq!(psp["records_evaluated"], 2);
    assert_eq!(psp["tags"]["cis_rid"], "4.2.8");
    assert_eq!(psp["tags"]["cis_controls"]["8"], serde_json::json!(["5.4"]));
}

#[test]
fn fixture_pods_allowlist_reports_only_unlisted_pods() {
    let run = run_check_on_fixture("pods_allowlist", &[]);

    assert_eq!(run.exit_code, 2, "pods_allowlist fixture should exit with 2 (fail)");
    assert_eq!(run.report["verdict"], "fail");

    let pods = result(&run.report, "eks-cis-4.1.6-pods");
    assert_eq!(pods["status"], "fail");
    assert_eq!(violating(pods), vec!["pod-b", "pod-c"]);
    assert_eq!(
        pods["message"],
        "List of pods with automountServiceAccountToken setting: pod-b, pod-c"
    );
    assert_eq!(pods["violations"][0]["code"], "non_compliant_value");
    assert_eq!(pods["violations"][0]["value"], "true");
    assert_eq!(
        pods["violations"][0]["fingerprint"]
            .as_str()
            .expect("fingerprint")
            .len(),
        64
    );

    assert_eq!(result(&run.report, "eks-cis-4.1.6-service-accounts")["status"], "pass");
}

#[test]
fn fixture_service_account_allowlisted_passes() {
    let run = run_check_on_fixture("service_account_allowlisted", &[]);

    assert_eq!(run.exit_code, 0);
    let sa = result(&run.report, "eks-cis-4.1.6-service-accounts");
    assert_eq!(sa["status"], "pass");
    assert_eq!(sa["records_evaluated"], 1);
    assert_eq!(
        sa["message"],
        "List of service accounts with automountServiceAccountToken setting: none"
    );
}

#[test]
fn fixture_psp_none_compliant_fails() {
    let run = run_check_on_fixture("psp_none_compliant", &[]);

    assert_eq!(run.exit_code, 2);
    let psp = result(&run.report, "eks-cis-4.2.7");
    assert_eq!(psp["status"], "fail");
    assert_eq!(violating(psp), vec!["psp-a", "psp-b"]);
    assert_eq!(psp["violations"][0]["value"], serde_json::json!(["NET_ADMIN"]));
}

#[test]
fn fixture_psp_missing_errors_that_control_only() {
    let run = run_check_on_fixture("psp_missing", &[]);

    assert_eq!(run.exit_code, 2, "an errored control fails the run");
    assert_eq!(run.report["verdict"], "fail");
    assert_eq!(run.report["data"]["controls_errored"], 1);

    let psp = result(&run.report, "eks-cis-4.2.7");
    assert_eq!(psp["status"], "error");
    assert_eq!(psp["violations"][0]["code"], "query_failed");
    assert!(
        psp["message"]
            .as_str()
            .expect("message")
            .starts_with("query execution failed (replay)")
    );

    assert_eq!(result(&run.report, "eks-cis-4.1.6-pods")["status"], "pass");
    assert_eq!(result(&run.report, "eks-cis-4.1.6-service-accounts")["status"], "pass");
}

#[test]
fn fixture_audit_profile_warns() {
    let run = run_check_on_fixture("audit_warn", &[]);

    assert_eq!(run.exit_code, 0, "audit profile only fails on critical findings");
    assert_eq!(run.report["verdict"], "warn");
    assert_eq!(run.report["data"]["fail_on"], "critical");
    assert_eq!(result(&run.report, "eks-cis-4.1.6-pods")["status"], "fail");
}

#[test]
fn fixture_malformed_lines_surface_warnings() {
    let run = run_check_on_fixture("malformed_lines", &[]);

    assert_eq!(run.exit_code, 0);
    let pods = result(&run.report, "eks-cis-4.1.6-pods");
    assert_eq!(pods["status"], "pass");
    assert_eq!(pods["records_evaluated"], 2);
    let warnings = pods["warnings"].as_array().expect("warnings");
    assert_eq!(warnings.len(), 1);
    assert!(
        warnings[0]
            .as_str()
            .expect("warning")
            .contains("line 3: dropped unparseable line")
    );

    let sa = result(&run.report, "eks-cis-4.1.6-service-accounts");
    assert_eq!(sa["records_evaluated"], 2);
    assert!(sa["warnings"][0].as_str().expect("warning").contains("appears 2 times"));
}

#[test]
fn fixture_custom_glob_control() {
    let run = run_check_on_fixture("custom_glob", &[]);

    assert_eq!(run.exit_code, 2);
    assert_eq!(run.report["data"]["profile"], "custom");
    let results = run.report["results"].as_array().expect("results");
    assert_eq!(results.len(), 1, "custom profile runs no built-in controls");

    let custom = &results[0];
    assert_eq!(custom["control_id"], "org-host-network");
    assert_eq!(custom["severity"], "high");
    assert_eq!(violating(custom), vec!["ingress-0"]);
    assert_eq!(custom["message"], "Pods using the host network: ingress-0");
    assert_eq!(custom["tags"]["nist"], serde_json::json!(["SC-7"]));
}

// ============================================================================
// CLI behavior tests
// ============================================================================

#[test]
fn fail_on_override_downgrades_to_warn() {
    let run = run_check_on_fixture("pods_allowlist", &["--fail-on", "critical"]);
    assert_eq!(run.exit_code, 0);
    assert_eq!(run.report["verdict"], "warn");
}

#[test]
fn single_worker_gives_same_results() {
    let parallel = run_check_on_fixture("pods_allowlist", &[]);
    let serial = run_check_on_fixture("pods_allowlist", &["--jobs", "1"]);
    assert_eq!(parallel.report["results"], serial.report["results"]);
}

#[test]
fn check_command_creates_output_file_in_new_directory() {
    let fixture_path = fixtures_dir().join("compliant");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let report_path = temp_dir.path().join("subdir").join("report.json");
    let md_path = temp_dir.path().join("md").join("comment.md");

    kubeguard_cmd()
        .arg("--config")
        .arg(fixture_path.join("kubeguard.toml"))
        .arg("check")
        .arg("--replay-dir")
        .arg(&fixture_path)
        .arg("--report-out")
        .arg(&report_path)
        .arg("--write-markdown")
        .arg("--markdown-out")
        .arg(&md_path)
        .assert()
        .success();

    assert!(report_path.exists(), "report should be created");
    let md = std::fs::read_to_string(&md_path).expect("markdown");
    assert!(md.contains("# Kubeguard report"));
    assert!(md.contains("All controls passed."));
}

#[test]
fn invalid_config_writes_runtime_error_report() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("kubeguard.toml");
    std::fs::write(&config_path, "[inputs]\nallowlist_pods = [\"(unclosed\"]\n").expect("write");
    let report_path = temp_dir.path().join("report.json");

    kubeguard_cmd()
        .arg("--config")
        .arg(&config_path)
        .arg("check")
        .arg("--replay-dir")
        .arg(fixtures_dir().join("compliant"))
        .arg("--report-out")
        .arg(&report_path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid regular expression"));

    let report = read_report(&report_path);
    assert_eq!(report["verdict"], "fail");
    assert_eq!(report["results"][0]["control_id"], "tool.runtime");
    assert_eq!(report["results"][0]["violations"][0]["code"], "runtime_error");
}

#[cfg(unix)]
#[test]
fn missing_kubectl_errors_every_control() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let report_path = temp_dir.path().join("report.json");

    kubeguard_cmd()
        .arg("--config")
        .arg(temp_dir.path().join("absent.toml"))
        .arg("check")
        .arg("--kubectl")
        .arg(temp_dir.path().join("no-such-kubectl"))
        .arg("--report-out")
        .arg(&report_path)
        .assert()
        .code(2);

    let report = read_report(&report_path);
    assert_eq!(report["data"]["controls_errored"], 3);
    for r in report["results"].as_array().expect("results") {
        assert_eq!(r["status"], "error");
        assert_eq!(r["violations"][0]["code"], "query_failed");
        assert!(
            r["message"]
                .as_str()
                .expect("message")
                .starts_with("query execution failed (spawn)")
        );
    }
}

#[test]
fn md_and_annotations_render_existing_report() {
    let run = run_check_on_fixture("pods_allowlist", &[]);

    kubeguard_cmd()
        .arg("md")
        .arg("--report")
        .arg(&run.report_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Verdict: **FAIL**"))
        .stdout(predicate::str::contains("- `pod-b` (non_compliant_value)"));

    kubeguard_cmd()
        .arg("annotations")
        .arg("--report")
        .arg(&run.report_path)
        .arg("--max")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "::error title=eks-cis-4.1.6-pods::[eks-cis-4.1.6-pods:non_compliant_value] pod-b",
        ))
        .stdout(predicate::str::contains("pod-c").not());
}

#[test]
fn explain_known_and_unknown() {
    kubeguard_cmd()
        .args(["explain", "eks-cis-4.1.6-pods"])
        .assert()
        .success()
        .stdout(predicate::str::contains("automountServiceAccountToken: false"));

    kubeguard_cmd()
        .args(["explain", "eks-cis-9.9.9"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown control id or code"));
}

#[test]
fn list_shows_effective_controls() {
    let fixture_path = fixtures_dir().join("compliant");
    kubeguard_cmd()
        .arg("--config")
        .arg(fixture_path.join("kubeguard.toml"))
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("profile: eks-cis"))
        .stdout(predicate::str::contains("pattern (2)"))
        .stdout(predicate::str::contains(
            "kubectl get serviceaccounts --all-namespaces",
        ));
}
