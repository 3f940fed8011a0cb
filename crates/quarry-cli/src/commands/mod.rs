pub mod plan;
pub mod render;
pub mod validate;

use std::fs;

use anyhow::Context;

use quarry_bootstrap::ResolvedEndpoints;
use quarry_core::{ClusterConfig, validate_and_normalize};

/// Load, parse and validate a configuration document.
pub fn load_config(path: &str, region: Option<&str>) -> anyhow::Result<ClusterConfig> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let config = ClusterConfig::from_json_str(&text)
        .with_context(|| format!("parsing {path}"))?;
    validate_and_normalize(config, region).with_context(|| format!("validating {path}"))
}

/// Load the resolved-endpoints profile, or fall back to empty endpoints —
/// placeholders then surface verbatim in rendered scripts.
pub fn load_endpoints(path: Option<&str>) -> anyhow::Result<ResolvedEndpoints> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            toml::from_str(&text).with_context(|| format!("parsing {path}"))
        }
        None => Ok(ResolvedEndpoints::default()),
    }
}
