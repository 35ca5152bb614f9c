//! The `list` use case: show the controls a config resolves to.

use kubeguard_domain::policy::{EffectiveConfig, Quantifier};
use kubeguard_query::QueryRunner;

/// One row of `kubeguard list`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlSummary {
    pub control_id: String,
    pub severity: String,
    pub quantifier: &'static str,
    pub allowlist: String,
    pub query: String,
    pub title: String,
}

pub fn run_list(effective: &EffectiveConfig, runner: &dyn QueryRunner) -> Vec<ControlSummary> {
    effective
        .controls
        .iter()
        .map(|c| ControlSummary {
            control_id: c.id.clone(),
            severity: c.severity.as_str().to_string(),
            quantifier: match c.quantifier {
                Quantifier::All => "all",
                Quantifier::Any => "any",
            },
            allowlist: match c.allowlist.mode() {
                Some(mode) => format!("{} ({})", mode.as_str(), c.allowlist.len()),
                None => "-".to_string(),
            },
            query: runner.describe(&c.query),
            title: c.title.clone(),
        })
        .collect()
}

pub fn format_list(profile: &str, rows: &[ControlSummary]) -> String {
    let mut out = format!("profile: {profile}\n");
    if rows.is_empty() {
        out.push_str("no controls enabled\n");
        return out;
    }
    let width = rows.iter().map(|r| r.control_id.len()).max().unwrap_or(0);
    for r in rows {
        out.push_str(&format!(
            "{:<width$}  {:<8}  {:<3}  {:<12}  {}\n    {}\n",
            r.control_id, r.severity, r.quantifier, r.allowlist, r.title, r.query
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_config;
    use kubeguard_query::KubectlRunner;
    use kubeguard_settings::Overrides;
    use std::time::Duration;

    #[test]
    fn lists_builtin_catalog_with_allowlist_sizes() {
        let resolved = load_config(
            "[inputs]\nallowlist_pods = [\"^kube-\", \"^aws-node\"]\n",
            Overrides::default(),
        )
        .expect("config");
        let runner = KubectlRunner::new("kubectl", Duration::from_secs(60));
        let rows = run_list(&resolved.effective, &runner);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].allowlist, "pattern (2)");
        assert_eq!(rows[1].allowlist, "-");
        assert_eq!(rows[2].quantifier, "any");
        assert_eq!(rows[2].query, "kubectl get psp -o json");

        let text = format_list(&resolved.effective.profile, &rows);
        assert!(text.starts_with("profile: eks-cis\n"));
        assert!(text.contains("eks-cis-4.1.6-service-accounts"));
    }

    #[test]
    fn custom_profile_without_controls_lists_nothing() {
        let resolved = load_config("profile = \"custom\"", Overrides::default()).expect("config");
        let runner = KubectlRunner::new("kubectl", Duration::from_secs(60));
        let rows = run_list(&resolved.effective, &runner);
        assert!(rows.is_empty());
        assert!(format_list("custom", &rows).contains("no controls enabled"));
    }
}
