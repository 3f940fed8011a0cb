//! Quarry core — configuration model and naming for the topology planner.
//!
//! This crate owns everything the rest of the workspace agrees on:
//!
//! - **`config`** — the typed cluster configuration document
//! - **`roles`** — node roles, service tiers, and canonical tier naming
//! - **`validate`** — fail-fast validation and normalization of a parsed
//!   configuration, run once before any resource is planned
//! - **`constants`** — default runtime properties and platform constants
//!
//! Configuration is parsed and validated exactly once at startup. The
//! resulting [`ClusterConfig`] is immutable and shared by reference across
//! the whole declaration pass.

pub mod config;
pub mod constants;
pub mod error;
pub mod roles;
pub mod validate;

pub use config::{
    AutoScalingPolicy, ClusterConfig, CustomLifecycleHookParams, DeepStorageConfig,
    EmitterConfig, EmitterType, HostingPlatform, MetadataStoreConfig, MetadataStoreType,
    NodeGroupConfig, NodeGroupMap, OidcIdpConfig, PropertyMap, RetentionRule,
    RollingUpdatePolicy, SchedulePolicy, ScalingStep,
};
pub use error::{ConfigError, ConfigResult};
pub use roles::{DEFAULT_TIER, NodeRole, ProcessType, TierKey, node_tier_name, service_name};
pub use validate::validate_and_normalize;
