use crate::model::{
    AllowModeDefinition, ConditionDefinition, ControlDefinition, KubeguardConfigV1,
    ParserDefinition, QuantifierDefinition, QueryDefinition,
};
use crate::presets::{self, DEFAULT_PROFILE, DEFAULT_TIMEOUT_SECS, PROFILES};
use anyhow::Context;
use kubeguard_domain::allowlist::{AllowMatcher, AllowMode};
use kubeguard_domain::condition::Condition;
use kubeguard_domain::parse::{DEFAULT_LINE_PATTERN, JsonParser, LineParser, RecordParser};
use kubeguard_domain::policy::{Control, EffectiveConfig, Quantifier, QuerySpec};
use kubeguard_types::Severity;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub fail_on: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
}

pub fn resolve_config(
    cfg: KubeguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    let profile_name = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

    let profile = presets::profile(&profile_name).with_context(|| {
        format!(
            "unknown profile: {profile_name} (expected {})",
            PROFILES.join("|")
        )
    })?;

    let fail_on = match overrides.fail_on.as_deref().or(cfg.fail_on.as_deref()) {
        Some(s) => parse_severity(s).context("invalid fail_on")?,
        None => profile.fail_on,
    };

    let timeout_secs = overrides
        .timeout_secs
        .or(cfg.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        anyhow::bail!("timeout_secs must be at least 1");
    }

    // (definition, enabled) in evaluation order: built-ins first, then custom controls.
    let mut definitions: Vec<(ControlDefinition, bool)> = presets::builtin_controls()
        .into_iter()
        .map(|d| (d, profile.builtins_enabled))
        .collect();

    let mut seen: BTreeSet<String> = definitions.iter().map(|(d, _)| d.id.clone()).collect();
    for def in cfg.custom_controls {
        if !seen.insert(def.id.clone()) {
            anyhow::bail!("duplicate control id: {}", def.id);
        }
        definitions.push((def, true));
    }

    // per-control overrides
    for (control_id, cc) in &cfg.controls {
        let Some((def, enabled)) = definitions.iter_mut().find(|(d, _)| &d.id == control_id)
        else {
            anyhow::bail!("unknown control in [controls]: {control_id}");
        };
        if let Some(on) = cc.enabled {
            *enabled = on;
        }
        if let Some(sev) = cc.severity.as_deref() {
            parse_severity(sev).with_context(|| format!("invalid severity for {control_id}"))?;
            def.severity = Some(sev.to_string());
        }
    }

    let mut controls = Vec::new();
    for (def, enabled) in definitions {
        let id = def.id.clone();
        // Built even when disabled so a broken definition is reported before any query runs.
        let control =
            build_control(def, &cfg.inputs).with_context(|| format!("invalid control {id}"))?;
        if enabled {
            controls.push(control);
        }
    }

    Ok(ResolvedConfig {
        effective: EffectiveConfig {
            profile: profile.name.to_string(),
            fail_on,
            timeout_secs,
            controls,
        },
    })
}

fn build_control(
    def: ControlDefinition,
    inputs: &BTreeMap<String, Vec<String>>,
) -> anyhow::Result<Control> {
    if def.id.trim().is_empty() {
        anyhow::bail!("control id must not be empty");
    }

    let severity = match def.severity.as_deref() {
        Some(s) => parse_severity(s)?,
        None => Severity::Medium,
    };

    let impact = def.impact.unwrap_or(0.5);
    if !(0.0..=1.0).contains(&impact) {
        anyhow::bail!("impact must be within 0.0..=1.0, got {impact}");
    }

    let resource = def.query.resource().to_string();
    if resource.trim().is_empty() {
        anyhow::bail!("query resource must not be empty");
    }

    let (query, parser) = build_query_and_parser(&def.query, def.parser.as_ref())?;

    // An allowlist only exempts violations; it cannot make an existential control pass.
    if def.quantifier == QuantifierDefinition::Any
        && def
            .allowlist
            .as_ref()
            .is_some_and(|a| !a.entries.is_empty() || a.input.is_some())
    {
        anyhow::bail!("allowlist has no effect on existential (`quantifier = \"any\"`) controls");
    }

    let allowlist = match &def.allowlist {
        None => AllowMatcher::Empty,
        Some(allow) => {
            let mut entries = allow.entries.clone();
            if let Some(name) = &allow.input {
                entries.extend(lookup_input(inputs, name).iter().cloned());
            }
            AllowMatcher::compile(allow_mode(allow.mode), &entries)
                .context("invalid allowlist entry")?
        }
    };

    Ok(Control {
        subject: def
            .subject
            .unwrap_or_else(|| format!("Non-compliant {resource}")),
        id: def.id,
        title: def.title,
        severity,
        impact,
        remediation: def.remediation,
        query,
        parser,
        condition: build_condition(&def.condition)?,
        quantifier: match def.quantifier {
            QuantifierDefinition::All => Quantifier::All,
            QuantifierDefinition::Any => Quantifier::Any,
        },
        allowlist,
        tags: def.tags,
    })
}

fn build_query_and_parser(
    query: &QueryDefinition,
    parser: Option<&ParserDefinition>,
) -> anyhow::Result<(QuerySpec, RecordParser)> {
    match (query, parser) {
        (
            QueryDefinition::Columns {
                resource,
                all_namespaces,
                columns,
            },
            None | Some(ParserDefinition::Lines { .. }),
        ) => {
            if columns.len() < 2 {
                anyhow::bail!("column queries need an identifier column and a value column");
            }
            let (pattern, attribute) = match parser {
                Some(ParserDefinition::Lines { pattern, attribute }) => {
                    (pattern.clone(), attribute.clone())
                }
                _ => (None, None),
            };
            let attribute = attribute.unwrap_or_else(|| column_attribute(columns));
            let pattern = pattern.as_deref().unwrap_or(DEFAULT_LINE_PATTERN);
            let line = LineParser::new(pattern, attribute).context("invalid line pattern")?;
            let cols: Vec<&str> = columns.iter().map(String::as_str).collect();
            Ok((
                QuerySpec::columns(resource, *all_namespaces, &cols),
                RecordParser::Lines(line),
            ))
        }
        (
            QueryDefinition::Json {
                resource,
                all_namespaces,
            },
            Some(ParserDefinition::Json {
                attribute_path,
                identifier_path,
            }),
        ) => {
            if attribute_path.trim().is_empty() {
                anyhow::bail!("attribute_path must not be empty");
            }
            let mut json = JsonParser::new(attribute_path);
            if let Some(path) = identifier_path {
                json = json.with_identifier_path(path);
            }
            Ok((
                QuerySpec::json(resource, *all_namespaces),
                RecordParser::Json(json),
            ))
        }
        (QueryDefinition::Json { .. }, None) => {
            anyhow::bail!("json queries need a `json` parser with an attribute_path")
        }
        (QueryDefinition::Columns { .. }, Some(ParserDefinition::Json { .. })) => {
            anyhow::bail!("column queries must use the `lines` parser")
        }
        (QueryDefinition::Json { .. }, Some(ParserDefinition::Lines { .. })) => {
            anyhow::bail!("json queries must use the `json` parser")
        }
    }
}

/// `.spec.automountServiceAccountToken` -> `spec.automountServiceAccountToken`.
fn column_attribute(columns: &[String]) -> String {
    columns
        .last()
        .map(|c| c.trim_start_matches('.').to_string())
        .unwrap_or_default()
}

fn build_condition(def: &ConditionDefinition) -> anyhow::Result<Condition> {
    Ok(match def {
        ConditionDefinition::Equals { value } => Condition::Equals(value.clone()),
        ConditionDefinition::IsNull => Condition::IsNull,
        ConditionDefinition::IsEmpty => Condition::IsEmpty,
        ConditionDefinition::AnyOf { of } => {
            if of.is_empty() {
                anyhow::bail!("any_of needs at least one condition");
            }
            Condition::AnyOf(of.iter().map(build_condition).collect::<anyhow::Result<_>>()?)
        }
    })
}

fn allow_mode(mode: AllowModeDefinition) -> AllowMode {
    match mode {
        AllowModeDefinition::Exact => AllowMode::Exact,
        AllowModeDefinition::Pattern => AllowMode::Pattern,
        AllowModeDefinition::Glob => AllowMode::Glob,
    }
}

/// A missing input is an empty allowlist.
fn lookup_input<'a>(inputs: &'a BTreeMap<String, Vec<String>>, name: &str) -> &'a [String] {
    inputs.get(name).map(Vec::as_slice).unwrap_or(&[])
}

fn parse_severity(v: &str) -> anyhow::Result<Severity> {
    match v {
        "low" => Ok(Severity::Low),
        "medium" => Ok(Severity::Medium),
        "high" => Ok(Severity::High),
        "critical" => Ok(Severity::Critical),
        other => anyhow::bail!("unknown severity: {other} (expected low|medium|high|critical)"),
    }
}
