//! Configuration error types.

use thiserror::Error;

/// Errors raised while parsing or validating a cluster configuration.
///
/// All of these are fatal and synchronous: they surface before any
/// resource group is declared.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("hosting configuration for platform {0} is missing")]
    MissingHostingConfig(&'static str),

    #[error(
        "no data-capable node group configured: define `data`, or both `historical` and `middleManager`"
    )]
    NoDataGroup,

    #[error("node group {group}: minNodes ({min}) exceeds maxNodes ({max})")]
    NodeCountRange { group: String, min: u32, max: u32 },

    #[error("node group {group}: minNodes must be at least 1")]
    ZeroMinNodes { group: String },

    #[error("malformed node group key: {0}")]
    MalformedGroupKey(String),

    #[error("unknown node group key: {0}")]
    UnknownGroupKey(String),

    #[error("duplicate tier {tier} for role {role}")]
    DuplicateTier { role: String, tier: String },

    #[error("invalid cluster name {0:?}: expected [a-zA-Z0-9_-]+")]
    InvalidClusterName(String),

    #[error("invalid version string {0:?}")]
    InvalidVersion(String),

    #[error("invalid cron expression {expression:?} in schedule policy for {group}")]
    InvalidCronExpression { group: String, expression: String },

    #[error("duplicate cron expression {expression:?} in schedule policy for {group}")]
    DuplicateCronExpression { group: String, expression: String },

    #[error("the statsd emitter requires the statsd-emitter extension to be enabled")]
    StatsdEmitterWithoutExtension,

    #[error("FIPS endpoints are not available in region {region}; supported: {supported}")]
    FipsUnsupportedRegion { region: String, supported: String },

    #[error("failed to parse configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
