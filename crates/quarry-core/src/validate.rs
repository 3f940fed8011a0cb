//! Fail-fast validation and normalization of a parsed configuration.
//!
//! Runs exactly once, before any resource group is declared. Every error
//! here is fatal and synchronous; nothing downstream has to re-check the
//! invariants this module enforces.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::{
    ClusterConfig, EmitterConfig, EmitterType, HostingPlatform, NodeGroupMap,
};
use crate::constants::{
    DEFAULT_CONCURRENT_QUERY_LIMIT, DEFAULT_DRUID_VERSION, DEFAULT_ZOOKEEPER_VERSION,
    EC2_ONLY_EXTENSIONS, FIPS_ENABLED_REGIONS, MANDATORY_EXTENSIONS,
};
use crate::error::{ConfigError, ConfigResult};
use crate::roles::{NodeRole, TierKey};

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("name regex"));
static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$").expect("version regex"));

const OIDC_DISCOVERY_SUFFIX: &str = ".well-known/openid-configuration";

/// Validate a parsed configuration and apply normalization (defaults,
/// mandatory extensions, identity-provider URI fixup). Returns the
/// normalized configuration; the input is consumed.
pub fn validate_and_normalize(
    mut config: ClusterConfig,
    region: Option<&str>,
) -> ConfigResult<ClusterConfig> {
    if config.cluster_name.is_empty() {
        return Err(ConfigError::MissingField("druidClusterName"));
    }
    if !NAME_RE.is_match(&config.cluster_name) {
        return Err(ConfigError::InvalidClusterName(config.cluster_name.clone()));
    }

    if config.druid_version.is_empty() {
        config.druid_version = DEFAULT_DRUID_VERSION.to_string();
    }
    validate_version(&config.druid_version)?;
    if let Some(zk_version) = &config.zookeeper_version {
        validate_version(zk_version)?;
    }

    if config.extensions.is_empty() {
        return Err(ConfigError::MissingField("druidExtensions"));
    }

    let hosting = match config.platform {
        HostingPlatform::Ec2 => config
            .ec2_config
            .as_ref()
            .ok_or(ConfigError::MissingHostingConfig("ec2"))?,
        HostingPlatform::Eks => config
            .eks_config
            .as_ref()
            .ok_or(ConfigError::MissingHostingConfig("eks"))?,
    };
    validate_node_groups(hosting, config.platform)?;

    if let (Some(true), Some(region)) = (config.use_fips_endpoint, region)
        && !FIPS_ENABLED_REGIONS.contains(&region.to_lowercase().as_str())
    {
        return Err(ConfigError::FipsUnsupportedRegion {
            region: region.to_string(),
            supported: FIPS_ENABLED_REGIONS.join(", "),
        });
    }

    normalize(&mut config)?;
    debug!(cluster = %config.cluster_name, "configuration validated");
    Ok(config)
}

fn validate_version(version: &str) -> ConfigResult<()> {
    if version.is_empty() || !VERSION_RE.is_match(version) {
        return Err(ConfigError::InvalidVersion(version.to_string()));
    }
    // Versions are usually semver-shaped; an odd one is worth a note but
    // not a failure (snapshot and vendor builds exist).
    if semver::Version::parse(version).is_err() {
        warn!(version, "version string is not semver");
    }
    Ok(())
}

fn validate_node_groups(hosting: &NodeGroupMap, platform: HostingPlatform) -> ConfigResult<()> {
    if hosting.is_empty() {
        return Err(ConfigError::MissingField("hosting configuration"));
    }

    let mut seen = HashSet::new();
    for (key, group) in hosting.iter() {
        let tier_key = TierKey::parse(key)?;
        if !seen.insert((tier_key.role, tier_key.tier.clone())) {
            return Err(ConfigError::DuplicateTier {
                role: tier_key.role.to_string(),
                tier: tier_key.tier,
            });
        }

        if group.min_nodes == 0 {
            return Err(ConfigError::ZeroMinNodes {
                group: key.to_string(),
            });
        }
        if let Some(max) = group.max_nodes
            && group.min_nodes > max
        {
            return Err(ConfigError::NodeCountRange {
                group: key.to_string(),
                min: group.min_nodes,
                max,
            });
        }
    }

    // A cluster needs somewhere to store and ingest data: a combined data
    // group, or both dedicated subroles.
    let has_data = hosting
        .groups_for_role(NodeRole::Data)
        .iter()
        .any(|(_, g)| g.min_nodes > 0);
    let has_historical = !hosting.groups_for_role(NodeRole::Historical).is_empty();
    let has_middle_manager = !hosting.groups_for_role(NodeRole::MiddleManager).is_empty();
    if !has_data && !(has_historical && has_middle_manager) {
        return Err(ConfigError::NoDataGroup);
    }

    if platform == HostingPlatform::Ec2 {
        for required in ["zookeeper", "master"] {
            if !hosting.contains_key(required) {
                return Err(ConfigError::MissingField(match required {
                    "zookeeper" => "druidEc2Config.zookeeper",
                    _ => "druidEc2Config.master",
                }));
            }
        }
        if hosting.groups_for_role(NodeRole::Query).is_empty() {
            return Err(ConfigError::MissingField("druidEc2Config.query"));
        }
    }

    validate_schedule_policies(hosting)?;
    Ok(())
}

fn validate_schedule_policies(hosting: &NodeGroupMap) -> ConfigResult<()> {
    let mut expressions = HashSet::new();
    for (key, group) in hosting.iter() {
        let Some(policies) = group
            .auto_scaling_policy
            .as_ref()
            .and_then(|p| p.schedule_policies.as_ref())
        else {
            continue;
        };
        for policy in policies {
            if !cron_expression_is_valid(&policy.schedule_expression) {
                return Err(ConfigError::InvalidCronExpression {
                    group: key.to_string(),
                    expression: policy.schedule_expression.clone(),
                });
            }
            if !expressions.insert(policy.schedule_expression.clone()) {
                return Err(ConfigError::DuplicateCronExpression {
                    group: key.to_string(),
                    expression: policy.schedule_expression.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Accepts both classic five-field crontab expressions and six/seven-field
/// expressions with a seconds column.
fn cron_expression_is_valid(expression: &str) -> bool {
    let fields = expression.split_whitespace().count();
    if fields == 5 {
        cron::Schedule::from_str(&format!("0 {expression}")).is_ok()
    } else {
        cron::Schedule::from_str(expression).is_ok()
    }
}

fn normalize(config: &mut ClusterConfig) -> ConfigResult<()> {
    if config.zookeeper_version.is_none() {
        config.zookeeper_version = Some(DEFAULT_ZOOKEEPER_VERSION.to_string());
    }
    if config.concurrent_query_limit.is_none() {
        config.concurrent_query_limit = Some(DEFAULT_CONCURRENT_QUERY_LIMIT);
    }
    if config.availability_zone_count.is_none() {
        config.availability_zone_count = Some(3);
    }

    // Mandatory extensions are always present exactly once; operator order
    // is preserved after the mandatory block.
    let mut extensions: Vec<String> = MANDATORY_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect();
    if config.platform == HostingPlatform::Ec2 {
        extensions.extend(EC2_ONLY_EXTENSIONS.iter().map(|e| e.to_string()));
    }
    for extension in config.extensions.drain(..) {
        if !extensions.contains(&extension) {
            extensions.push(extension);
        }
    }
    config.extensions = extensions;

    match &mut config.emitter {
        None => {
            config.emitter = Some(EmitterConfig {
                emitter_type: EmitterType::Cloudwatch,
                emitter_config: None,
            });
        }
        Some(emitter) if emitter.emitter_type == EmitterType::Statsd => {
            if !config.extensions.iter().any(|e| e == "statsd-emitter") {
                return Err(ConfigError::StatsdEmitterWithoutExtension);
            }
            if let Some(statsd) = &mut emitter.emitter_config
                && statsd.dogstatsd_constant_tags.is_none()
            {
                statsd.dogstatsd_constant_tags =
                    Some(vec![format!("cluster_name:{}", config.cluster_name)]);
            }
        }
        Some(_) => {}
    }

    if let Some(oidc) = &mut config.oidc_idp
        && !oidc.discovery_uri.ends_with(OIDC_DISCOVERY_SUFFIX)
    {
        if oidc.discovery_uri.ends_with('/') {
            oidc.discovery_uri = format!("{}{OIDC_DISCOVERY_SUFFIX}", oidc.discovery_uri);
        } else {
            oidc.discovery_uri = format!("{}/{OIDC_DISCOVERY_SUFFIX}", oidc.discovery_uri);
        }
    }

    Ok(())
}
