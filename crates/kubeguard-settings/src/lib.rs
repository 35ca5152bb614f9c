//! Config parsing, built-in catalog, and profile resolution.
//!
//! This crate is intentionally IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::{
    AllowModeDefinition, AllowlistDefinition, ConditionDefinition, ControlConfig,
    ControlDefinition, KubeguardConfigV1, ParserDefinition, QuantifierDefinition,
    QueryDefinition,
};
pub use presets::{DEFAULT_PROFILE, DEFAULT_TIMEOUT_SECS, PROFILES, builtin_controls};
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `kubeguard.toml` (or equivalent) into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<KubeguardConfigV1> {
    let cfg: KubeguardConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config used by the engine (profile + overrides + control definitions).
pub fn resolve_config(
    cfg: KubeguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
