//! Typed cluster configuration document.
//!
//! Mirrors the JSON document supplied by the operator. Field names follow
//! the document's camelCase convention. Free-form runtime-property override
//! maps stay as JSON values — they are passed through to the bootstrap
//! renderer, which serializes structured values back to JSON strings.

use std::collections::HashMap;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigResult;
use crate::roles::{NodeRole, ProcessType, TierKey};

/// Free-form runtime property bag (`druid.*` keys to JSON values).
pub type PropertyMap = serde_json::Map<String, serde_json::Value>;

/// Target hosting platform for the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostingPlatform {
    /// VM-based autoscaling groups.
    Ec2,
    /// Container-orchestration node groups.
    Eks,
}

/// Root configuration object, constructed once at startup and immutable
/// thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    #[serde(rename = "druidClusterName")]
    pub cluster_name: String,
    /// Server software version; defaulted during normalization when omitted.
    #[serde(default)]
    pub druid_version: String,
    pub zookeeper_version: Option<String>,
    #[serde(rename = "druidOperationPlatform")]
    pub platform: HostingPlatform,
    #[serde(rename = "druidExtensions")]
    pub extensions: Vec<String>,

    #[serde(rename = "druidEc2Config")]
    pub ec2_config: Option<NodeGroupMap>,
    #[serde(rename = "druidEksConfig")]
    pub eks_config: Option<NodeGroupMap>,

    #[serde(rename = "druidMetadataStoreConfig")]
    pub metadata_store: Option<MetadataStoreConfig>,
    #[serde(rename = "druidDeepStorageConfig")]
    pub deep_storage: Option<DeepStorageConfig>,
    #[serde(rename = "druidCommonRuntimeConfig")]
    pub common_runtime_config: Option<PropertyMap>,
    #[serde(rename = "druidEmitterConfig")]
    pub emitter: Option<EmitterConfig>,
    #[serde(rename = "druidRetentionRules")]
    pub retention_rules: Option<Vec<RetentionRule>>,
    #[serde(rename = "druidConcurrentQueryLimit")]
    pub concurrent_query_limit: Option<u32>,
    #[serde(rename = "oidcIdpConfig")]
    pub oidc_idp: Option<OidcIdpConfig>,

    pub internet_facing: Option<bool>,
    pub use_fips_endpoint: Option<bool>,
    pub retain_data: Option<bool>,
    pub availability_zone_count: Option<u32>,

    pub tags: Option<HashMap<String, String>>,
    pub additional_tags: Option<HashMap<String, String>>,
}

impl ClusterConfig {
    /// Parse a configuration document from JSON text. Validation is a
    /// separate, explicit step — see [`crate::validate_and_normalize`].
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Hosting configuration for the selected platform, if present.
    pub fn hosting(&self) -> Option<&NodeGroupMap> {
        match self.platform {
            HostingPlatform::Ec2 => self.ec2_config.as_ref(),
            HostingPlatform::Eks => self.eks_config.as_ref(),
        }
    }
}

/// Sizing and policy for one named node group (role or role_tier key).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeGroupConfig {
    pub min_nodes: u32,
    pub max_nodes: Option<u32>,
    pub instance_type: String,
    pub root_volume_size: Option<u32>,
    pub segment_cache_volume_size: Option<u32>,
    pub task_cache_volume_size: Option<u32>,
    pub service_priority: Option<i32>,
    pub auto_scaling_policy: Option<AutoScalingPolicy>,
    pub rolling_update_policy: Option<RollingUpdatePolicy>,
    /// Per-process runtime property overrides.
    pub runtime_config: Option<HashMap<ProcessType, PropertyMap>>,
}

impl NodeGroupConfig {
    pub fn runtime_overrides(&self, process: ProcessType) -> Option<&PropertyMap> {
        self.runtime_config.as_ref()?.get(&process)
    }
}

/// Hosting configuration: named node groups in declaration order.
///
/// Insertion order is load-bearing — it fixes the intra-role dependency
/// chain the sequencing engine declares — so this is an ordered map rather
/// than a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct NodeGroupMap(Vec<(String, NodeGroupConfig)>);

impl NodeGroupMap {
    pub fn new() -> Self {
        NodeGroupMap(Vec::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, config: NodeGroupConfig) {
        self.0.push((key.into(), config));
    }

    pub fn get(&self, key: &str) -> Option<&NodeGroupConfig> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeGroupConfig)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Groups belonging to `role`, in declaration order, with their parsed
    /// tier keys. Keys that fail to parse are skipped — validation has
    /// already rejected them by the time planners run.
    pub fn groups_for_role(&self, role: NodeRole) -> Vec<(TierKey, &NodeGroupConfig)> {
        self.iter()
            .filter_map(|(key, config)| {
                let tier_key = TierKey::parse(key).ok()?;
                (tier_key.role == role).then_some((tier_key, config))
            })
            .collect()
    }

    /// Query tiers ordered by descending service priority — the order in
    /// which brokers are consulted.
    pub fn broker_tiers(&self) -> Vec<String> {
        let mut tiers: Vec<(String, i32)> = self
            .groups_for_role(NodeRole::Query)
            .into_iter()
            .map(|(key, config)| (key.tier, config.service_priority.unwrap_or(0)))
            .collect();
        tiers.sort_by(|a, b| b.1.cmp(&a.1));
        tiers.into_iter().map(|(tier, _)| tier).collect()
    }
}

impl Serialize for NodeGroupMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for NodeGroupMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor;

        impl<'de> Visitor<'de> for MapVisitor {
            type Value = NodeGroupMap;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map of node group name to node group config")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, NodeGroupConfig>()? {
                    entries.push((key, value));
                }
                Ok(NodeGroupMap(entries))
            }
        }

        deserializer.deserialize_map(MapVisitor)
    }
}

impl FromIterator<(String, NodeGroupConfig)> for NodeGroupMap {
    fn from_iter<I: IntoIterator<Item = (String, NodeGroupConfig)>>(iter: I) -> Self {
        NodeGroupMap(iter.into_iter().collect())
    }
}

/// Scaling policy attached to a node group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScalingPolicy {
    pub cpu_utilisation_percent: Option<u32>,
    pub request_count_per_target: Option<u32>,
    pub pending_task_count_scale_steps: Option<Vec<ScalingStep>>,
    pub disk_utilisation_scale_steps: Option<Vec<ScalingStep>>,
    pub schedule_policies: Option<Vec<SchedulePolicy>>,
    pub custom_lifecycle_hook_params: Option<CustomLifecycleHookParams>,
}

/// One interval of a metric-step scaling policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingStep {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    /// Capacity change to apply when the metric is in this interval.
    pub change: i32,
}

/// Time-window scaling policy driven by a cron expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePolicy {
    pub schedule_expression: String,
    pub min_nodes: u32,
    pub max_nodes: Option<u32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Per-tier override of the termination lifecycle hook defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomLifecycleHookParams {
    /// Outcome applied when the hook times out; defaults to continue.
    pub default_result: Option<String>,
    /// Heartbeat timeout in seconds.
    pub heartbeat_timeout: Option<u64>,
}

/// Rolling update batching for a node group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingUpdatePolicy {
    pub max_batch_size: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataStoreType {
    Aurora,
    AuroraServerless,
    Custom,
}

/// Metadata database selection and credentials references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataStoreConfig {
    pub metadata_store_type: MetadataStoreType,
    pub database_uri: Option<String>,
    pub database_port: Option<u16>,
    pub database_name: Option<String>,
    pub database_secret_arn: Option<String>,
    pub backup_plan_config: Option<BackupPlanConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPlanConfig {
    pub schedule_expression: String,
    pub delete_after_days: Option<u32>,
}

/// Deep-storage bucket location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeepStorageConfig {
    pub bucket_arn: Option<String>,
    pub bucket_prefix: Option<String>,
    pub bucket_encryption_key_arn: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitterType {
    Cloudwatch,
    Statsd,
}

/// Telemetry emitter selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitterConfig {
    pub emitter_type: EmitterType,
    pub emitter_config: Option<StatsdEmitterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsdEmitterConfig {
    pub hostname: String,
    pub port: u16,
    pub dogstatsd_constant_tags: Option<Vec<String>>,
}

/// Segment retention rule (ISO-8601 periods/intervals).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub period: Option<String>,
    pub interval: Option<String>,
    pub include_future: Option<bool>,
    pub tiered_replicants: Option<HashMap<String, u32>>,
}

/// Identity-provider settings for the web console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OidcIdpConfig {
    pub client_id: String,
    pub client_secret_arn: String,
    #[serde(rename = "discoveryURI")]
    pub discovery_uri: String,
    pub group_claim_name: Option<String>,
    pub custom_scopes: Option<Vec<String>>,
    pub group_role_mappings: Option<HashMap<String, Vec<String>>>,
}
