//! Conformance tests for kubeguard.
//!
//! These tests validate:
//! 1. Every control id and code has an explanation
//! 2. The built-in catalog and the explain registry agree
//! 3. Reports produced from every fixture validate against the generated report schema

use assert_cmd::Command;
use kubeguard_types::{KubeguardReport, explain, ids};
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("kubeguard-cli should have parent")
        .parent()
        .expect("crates should have parent")
        .join("tests")
        .join("fixtures")
}

/// Fixture directories holding recorded cluster output.
fn kubeguard_fixtures() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::fs::read_dir(fixtures_dir())
        .expect("read fixtures dir")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.join("kubeguard.toml").exists())
        .collect();
    dirs.sort();
    dirs
}

#[allow(deprecated)]
fn kubeguard_cmd() -> Command {
    Command::cargo_bin("kubeguard").expect("kubeguard binary not found")
}

fn report_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(KubeguardReport)).expect("schema to json")
}

// =============================================================================
// Explanation Coverage Tests
// =============================================================================

#[test]
fn all_control_ids_have_explanations() {
    for control_id in explain::all_control_ids() {
        let exp = explain::lookup_explanation(control_id)
            .unwrap_or_else(|| panic!("control id '{control_id}' has no explanation"));
        assert!(!exp.title.is_empty(), "{control_id}: empty title");
        assert!(!exp.description.is_empty(), "{control_id}: empty description");
        assert!(!exp.remediation.is_empty(), "{control_id}: empty remediation");
        assert!(
            !exp.examples.before.is_empty() && !exp.examples.after.is_empty(),
            "{control_id}: missing examples"
        );
    }
}

#[test]
fn all_codes_have_explanations() {
    for code in explain::all_codes() {
        let exp = explain::lookup_explanation(code)
            .unwrap_or_else(|| panic!("code '{code}' has no explanation"));
        assert!(!exp.description.is_empty(), "{code}: empty description");
    }
}

#[test]
fn builtin_catalog_matches_explain_registry() {
    let builtin: Vec<String> = kubeguard_settings::builtin_controls()
        .into_iter()
        .map(|c| c.id)
        .collect();
    let documented: Vec<String> = explain::all_control_ids()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(builtin, documented);
}

#[test]
fn control_ids_and_codes_do_not_overlap() {
    for id in explain::all_control_ids() {
        assert!(
            !explain::all_codes().contains(id),
            "'{id}' is both a control id and a code"
        );
    }
}

#[test]
fn tool_runtime_ids_are_not_catalog_entries() {
    assert!(!explain::all_control_ids().contains(&ids::CONTROL_TOOL_RUNTIME));
    assert!(!explain::all_codes().contains(&ids::CODE_RUNTIME_ERROR));
}

// =============================================================================
// Report Schema Conformance
// =============================================================================

#[test]
fn generated_schema_is_valid_draft7() {
    let schema = report_schema();
    assert!(jsonschema::draft7::new(&schema).is_ok());
}

#[test]
fn all_fixture_reports_validate_against_schema() {
    let schema = report_schema();
    let validator = jsonschema::draft7::new(&schema).expect("compile schema");

    let fixtures = kubeguard_fixtures();
    assert!(!fixtures.is_empty(), "no kubeguard fixtures found");

    for fixture in fixtures {
        let temp = TempDir::new().expect("temp dir");
        let report_path = temp.path().join("report.json");

        let output = kubeguard_cmd()
            .arg("--config")
            .arg(fixture.join("kubeguard.toml"))
            .arg("check")
            .arg("--replay-dir")
            .arg(&fixture)
            .arg("--report-out")
            .arg(&report_path)
            .output()
            .expect("run kubeguard");
        let code = output.status.code().unwrap_or(-1);
        assert!(
            code == 0 || code == 2,
            "{}: unexpected exit code {code}",
            fixture.display()
        );

        let text = std::fs::read_to_string(&report_path).expect("read report");
        let report: Value = serde_json::from_str(&text).expect("report json");

        let errors: Vec<String> = validator
            .iter_errors(&report)
            .map(|e| e.to_string())
            .collect();
        assert!(
            errors.is_empty(),
            "{} does not conform:\n{}",
            fixture.display(),
            errors.join("\n")
        );

        assert_eq!(report["schema"], "kubeguard.report.v1");
        for result in report["results"].as_array().expect("results") {
            let control_id = result["control_id"].as_str().expect("control_id");
            for violation in result["violations"].as_array().expect("violations") {
                let code = violation["code"].as_str().expect("code");
                assert!(
                    explain::all_codes().contains(&code),
                    "{control_id}: undocumented code {code}"
                );
            }
        }
    }
}

#[test]
fn runtime_error_report_validates_against_schema() {
    let schema = report_schema();
    let validator = jsonschema::draft7::new(&schema).expect("compile schema");

    let temp = TempDir::new().expect("temp dir");
    let config = temp.path().join("kubeguard.toml");
    std::fs::write(&config, "timeout_secs = 0\n").expect("write config");
    let report_path = temp.path().join("report.json");

    kubeguard_cmd()
        .arg("--config")
        .arg(&config)
        .arg("check")
        .arg("--report-out")
        .arg(&report_path)
        .assert()
        .code(1);

    let text = std::fs::read_to_string(&report_path).expect("read report");
    let report: Value = serde_json::from_str(&text).expect("report json");
    assert!(validator.is_valid(&report));
    assert_eq!(report["results"][0]["control_id"], ids::CONTROL_TOOL_RUNTIME);
}
