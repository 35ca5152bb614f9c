//! Property-based tests for the domain crate.
//!
//! These tests use proptest to verify invariants around:
//! - allowlist exclusion (exact and pattern modes)
//! - pass iff no violations
//! - idempotent evaluation of unchanged query output

use crate::allowlist::AllowMode;
use crate::engine::{evaluate_control, evaluate_records};
use crate::model::ResourceRecord;
use crate::test_support::{existential_psp_control, line_control};
use kubeguard_types::ControlStatus;
use proptest::prelude::*;

// ============================================================================
// Strategies for generating arbitrary values
// ============================================================================

/// Kubernetes-style object names.
fn arb_name() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,20}").unwrap()
}

/// Values as printed by a custom-columns query.
fn arb_value() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("false".to_string()),
        Just("true".to_string()),
        Just("<none>".to_string()),
        prop::string::string_regex("[A-Za-z0-9_]{1,8}").unwrap(),
    ]
}

fn arb_rows() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((arb_name(), arb_value()), 0..24)
}

fn render_rows(rows: &[(String, String)]) -> String {
    rows.iter()
        .map(|(name, value)| format!("{name}   {value}\n"))
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn exact_allowlisted_identifiers_never_violate(
        rows in arb_rows(),
        pick in prop::collection::vec(any::<prop::sample::Index>(), 0..4),
    ) {
        let allowed: Vec<String> = if rows.is_empty() {
            Vec::new()
        } else {
            pick.iter().map(|i| rows[i.index(rows.len())].0.clone()).collect()
        };
        let allow_refs: Vec<&str> = allowed.iter().map(|s| s.as_str()).collect();
        let control = line_control("serviceaccounts", AllowMode::Exact, &allow_refs);

        let result = evaluate_control(&control, Ok(render_rows(&rows).as_str()));
        for v in &result.violations {
            prop_assert!(!allowed.contains(&v.identifier));
        }
    }

    #[test]
    fn pattern_allowlisted_identifiers_never_violate(rows in arb_rows()) {
        let control = line_control("pods", AllowMode::Pattern, &["^kube-", "-system$"]);
        let result = evaluate_control(&control, Ok(render_rows(&rows).as_str()));
        for v in &result.violations {
            prop_assert!(!v.identifier.starts_with("kube-"));
            prop_assert!(!v.identifier.ends_with("-system"));
        }
    }

    #[test]
    fn pass_iff_violations_empty(rows in arb_rows()) {
        let control = line_control("pods", AllowMode::Exact, &[]);
        let result = evaluate_control(&control, Ok(render_rows(&rows).as_str()));
        prop_assert_eq!(result.status == ControlStatus::Pass, result.violations.is_empty());

        let expected = rows.iter().filter(|(_, v)| v != "false").count();
        prop_assert_eq!(result.violations.len(), expected);
        prop_assert_eq!(result.records_evaluated as usize, rows.len());
    }

    #[test]
    fn evaluation_is_idempotent(rows in arb_rows()) {
        let control = line_control("pods", AllowMode::Pattern, &["^a"]);
        let text = render_rows(&rows);
        let first = evaluate_control(&control, Ok(text.as_str()));
        let second = evaluate_control(&control, Ok(text.as_str()));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn existential_passes_iff_some_record_is_null_or_empty(
        caps in prop::collection::vec(
            prop_oneof![
                Just(serde_json::Value::Null),
                Just(serde_json::json!([])),
                Just(serde_json::json!(["NET_ADMIN"])),
                Just(serde_json::json!(["SYS_ADMIN", "NET_RAW"])),
            ],
            0..6,
        )
    ) {
        let control = existential_psp_control();
        let records: Vec<ResourceRecord> = caps
            .iter()
            .enumerate()
            .map(|(i, v)| ResourceRecord::json(&format!("psp-{i}"), "spec.allowedCapabilities", v.clone()))
            .collect();

        let eval = evaluate_records(&control, &records);
        let any_ok = caps
            .iter()
            .any(|v| v.is_null() || v.as_array().is_some_and(|a| a.is_empty()));
        prop_assert_eq!(eval.violations.is_empty(), any_ok);
        prop_assert_eq!(eval.satisfied_by.is_some(), any_ok);
    }
}
