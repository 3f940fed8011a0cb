//! Node roles, service tiers, and canonical tier naming.
//!
//! A *role* is the logical function of a provisioned node group (master,
//! data, query, ...). A *tier* is an optional named sub-partition within a
//! role (`data_hot`, `query_cold`) enabling heterogeneous sizing for the
//! same role. Tier names are parsed out of hosting-config keys: a key
//! `<role>_<tier>` carries a tier suffix, a bare `<role>` key maps to the
//! default-tier sentinel.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Sentinel tier name for node groups declared without an explicit tier.
pub const DEFAULT_TIER: &str = "_default_tier";

/// Logical function of a provisioned node group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeRole {
    /// Coordination-service ensemble members.
    Zookeeper,
    /// Control tier: coordinator and overlord processes.
    Master,
    /// Query-serving tier: broker and router processes.
    Query,
    /// Combined data tier: historical and middle-manager processes.
    Data,
    /// Historical-only data subrole.
    Historical,
    /// Ingestion-only data subrole.
    MiddleManager,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Zookeeper => "zookeeper",
            NodeRole::Master => "master",
            NodeRole::Query => "query",
            NodeRole::Data => "data",
            NodeRole::Historical => "historical",
            NodeRole::MiddleManager => "middleManager",
        }
    }

    /// Roles that make up the data phase of the declaration pass.
    pub fn is_data_phase(&self) -> bool {
        matches!(
            self,
            NodeRole::Data | NodeRole::Historical | NodeRole::MiddleManager
        )
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individual server process running on a node group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProcessType {
    Coordinator,
    Overlord,
    Broker,
    Router,
    Historical,
    MiddleManager,
    Zookeeper,
}

impl ProcessType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessType::Coordinator => "coordinator",
            ProcessType::Overlord => "overlord",
            ProcessType::Broker => "broker",
            ProcessType::Router => "router",
            ProcessType::Historical => "historical",
            ProcessType::MiddleManager => "middleManager",
            ProcessType::Zookeeper => "zookeeper",
        }
    }

    /// The node role a process type is hosted on.
    pub fn node_role(&self) -> NodeRole {
        match self {
            ProcessType::Coordinator | ProcessType::Overlord => NodeRole::Master,
            ProcessType::Historical | ProcessType::MiddleManager => NodeRole::Data,
            ProcessType::Broker | ProcessType::Router => NodeRole::Query,
            ProcessType::Zookeeper => NodeRole::Zookeeper,
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hosting-config key resolved into its role and tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierKey {
    pub role: NodeRole,
    /// Tier name, or [`DEFAULT_TIER`] for a bare role key.
    pub tier: String,
}

static GROUP_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(zookeeper|master|query|data|historical|middleManager)(\w*)$")
        .expect("group key regex")
});

impl TierKey {
    /// Parse a hosting-config key such as `data`, `data_hot` or
    /// `query_tier2` into its role and tier suffix.
    ///
    /// A suffix must be introduced by a single underscore and be non-empty
    /// after trimming it; `data_` and `datahot` are malformed.
    pub fn parse(key: &str) -> ConfigResult<TierKey> {
        let caps = GROUP_KEY_RE
            .captures(key)
            .ok_or_else(|| ConfigError::UnknownGroupKey(key.to_string()))?;

        let role = match &caps[1] {
            "zookeeper" => NodeRole::Zookeeper,
            "master" => NodeRole::Master,
            "query" => NodeRole::Query,
            "data" => NodeRole::Data,
            "historical" => NodeRole::Historical,
            _ => NodeRole::MiddleManager,
        };

        let suffix = &caps[2];
        let tier = if suffix.is_empty() {
            DEFAULT_TIER.to_string()
        } else {
            match suffix.strip_prefix('_') {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => return Err(ConfigError::MalformedGroupKey(key.to_string())),
            }
        };

        Ok(TierKey { role, tier })
    }

    /// Canonical tier name, the inverse of [`TierKey::parse`].
    pub fn name(&self) -> String {
        node_tier_name(self.role, Some(&self.tier))
    }
}

/// Canonical name for a role/tier pair: the bare role name when the tier is
/// absent or the default sentinel, `<role>_<tier>` otherwise.
///
/// Pure and total — used both as a human-readable tag and as the key for
/// per-tier sizing lookups.
pub fn node_tier_name(role: NodeRole, tier: Option<&str>) -> String {
    match tier {
        Some(t) if t != DEFAULT_TIER => format!("{}_{}", role.as_str(), t),
        _ => role.as_str().to_string(),
    }
}

/// Service name emitted in metrics dimensions: `<cluster>_<tier name>`, or
/// the bare tier name when the cluster name is empty.
pub fn service_name(cluster_name: &str, role: NodeRole, tier: Option<&str>) -> String {
    let tier_name = node_tier_name(role, tier);
    if cluster_name.is_empty() {
        tier_name
    } else {
        format!("{cluster_name}_{tier_name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_role_name_for_default_tier() {
        assert_eq!(node_tier_name(NodeRole::Data, None), "data");
        assert_eq!(node_tier_name(NodeRole::Data, Some(DEFAULT_TIER)), "data");
        assert_eq!(node_tier_name(NodeRole::Query, Some("hot")), "query_hot");
    }

    #[test]
    fn parse_round_trips_through_name() {
        for key in ["data", "data_hot", "query_tier2", "historical_cold", "master"] {
            let parsed = TierKey::parse(key).unwrap();
            assert_eq!(parsed.name(), key);
        }
    }

    #[test]
    fn parse_resolves_role_and_tier() {
        let parsed = TierKey::parse("middleManager_ingest").unwrap();
        assert_eq!(parsed.role, NodeRole::MiddleManager);
        assert_eq!(parsed.tier, "ingest");

        let parsed = TierKey::parse("data").unwrap();
        assert_eq!(parsed.role, NodeRole::Data);
        assert_eq!(parsed.tier, DEFAULT_TIER);
    }

    #[test]
    fn parse_rejects_malformed_keys() {
        assert!(matches!(
            TierKey::parse("data_"),
            Err(ConfigError::MalformedGroupKey(_))
        ));
        assert!(matches!(
            TierKey::parse("datahot"),
            Err(ConfigError::MalformedGroupKey(_))
        ));
        assert!(matches!(
            TierKey::parse("broker"),
            Err(ConfigError::UnknownGroupKey(_))
        ));
    }

    #[test]
    fn process_to_role_mapping() {
        assert_eq!(ProcessType::Coordinator.node_role(), NodeRole::Master);
        assert_eq!(ProcessType::Overlord.node_role(), NodeRole::Master);
        assert_eq!(ProcessType::Historical.node_role(), NodeRole::Data);
        assert_eq!(ProcessType::MiddleManager.node_role(), NodeRole::Data);
        assert_eq!(ProcessType::Broker.node_role(), NodeRole::Query);
        assert_eq!(ProcessType::Router.node_role(), NodeRole::Query);
        assert_eq!(ProcessType::Zookeeper.node_role(), NodeRole::Zookeeper);
    }

    #[test]
    fn service_name_includes_cluster() {
        assert_eq!(
            service_name("analytics", NodeRole::Query, Some("hot")),
            "analytics_query_hot"
        );
        assert_eq!(service_name("", NodeRole::Master, None), "master");
    }
}
