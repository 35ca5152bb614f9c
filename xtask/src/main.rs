//! Developer tasks (schema generation, conformance checks).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use kubeguard_app::{CheckInput, load_config, run_check};
use kubeguard_query::ReplayRunner;
use kubeguard_settings::Overrides;
use kubeguard_types::explain;
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    match manifest_dir.parent() {
        Some(root) if manifest_dir.ends_with("xtask") => root.to_path_buf(),
        _ => manifest_dir,
    }
}

fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

fn fixtures_dir() -> PathBuf {
    project_root().join("tests").join("fixtures")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_report_schema() -> schemars::Schema {
    schema_for!(kubeguard_types::KubeguardReport)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(kubeguard_settings::KubeguardConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "kubeguard.report.v1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "kubeguard.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

/// Emit schemas to the schemas/ directory.
fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Validate that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }

    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {}", name);
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {}", name);
        }
    }
    eprintln!("\nRun `cargo run -p xtask -- emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Run every replay fixture and validate reports against the schema");
    eprintln!("  explain-coverage  Validate all control IDs and codes have explanations");
}

/// Replay fixtures: directories under tests/fixtures holding a kubeguard.toml.
fn replay_fixtures() -> anyhow::Result<Vec<PathBuf>> {
    let dir = fixtures_dir();
    let mut out = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
        let path = entry?.path();
        if path.join("kubeguard.toml").is_file() {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

fn check_fixture(fixture: &Path) -> anyhow::Result<serde_json::Value> {
    let config_text = fs::read_to_string(fixture.join("kubeguard.toml")).context("read config")?;
    let resolved = load_config(&config_text, Overrides::default())?;
    let runner = ReplayRunner::new(fixture.to_string_lossy().into_owned());
    let output = run_check(CheckInput {
        resolved,
        runner: &runner,
        jobs: Some(1),
    })?;
    serde_json::to_value(&output.report).context("serialize report")
}

/// Conformance: every fixture's report validates against the report schema and only uses
/// documented violation codes.
fn conform() -> anyhow::Result<()> {
    let schema = serde_json::to_value(generate_report_schema()).context("schema to json")?;
    let validator = jsonschema::draft7::new(&schema)
        .map_err(|e| anyhow::anyhow!("invalid report schema: {e}"))?;

    let fixtures = replay_fixtures()?;
    if fixtures.is_empty() {
        bail!("no replay fixtures found under {}", fixtures_dir().display());
    }

    let mut errors = Vec::new();
    for fixture in &fixtures {
        let name = fixture
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let report = check_fixture(fixture).with_context(|| format!("fixture '{name}'"))?;

        for err in validator.iter_errors(&report) {
            errors.push(format!("{name}: {err}"));
        }

        let results = report["results"].as_array().cloned().unwrap_or_default();
        for result in &results {
            let control_id = result["control_id"].as_str().unwrap_or_default();
            let violations = result["violations"].as_array().cloned().unwrap_or_default();
            for v in &violations {
                let code = v["code"].as_str().unwrap_or_default();
                if !explain::all_codes().contains(&code) {
                    errors.push(format!("{name}: {control_id} uses undocumented code '{code}'"));
                }
            }
        }

        println!("  ✓ fixture '{}' ({} controls)", name, results.len());
    }

    if errors.is_empty() {
        println!("\n✓ {} fixtures conform", fixtures.len());
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!("Conformance failed with {} errors", errors.len())
    }
}

/// Validate that all control IDs and codes have explanations, and that every built-in
/// control is documented.
fn explain_coverage() -> anyhow::Result<()> {
    let control_ids = explain::all_control_ids();
    let codes = explain::all_codes();
    let mut errors = Vec::new();

    for id in control_ids.iter().chain(codes.iter()) {
        match explain::lookup_explanation(id) {
            Some(exp) => {
                if exp.title.is_empty() {
                    errors.push(format!("'{}' has empty title", id));
                }
                if exp.description.is_empty() {
                    errors.push(format!("'{}' has empty description", id));
                }
                if exp.remediation.is_empty() {
                    errors.push(format!("'{}' has empty remediation", id));
                }
            }
            None => errors.push(format!("'{}' has no explanation", id)),
        }
    }

    for control in kubeguard_settings::builtin_controls() {
        if !control_ids.contains(&control.id.as_str()) {
            errors.push(format!("built-in control '{}' is not documented", control.id));
        }
    }

    if errors.is_empty() {
        println!("✓ {} control IDs have explanations", control_ids.len());
        println!("✓ {} codes have explanations", codes.len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!(
            "Explain coverage validation failed with {} errors",
            errors.len()
        )
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo run -p xtask -- help` for usage."),
    }
    .context("xtask failed")
}
