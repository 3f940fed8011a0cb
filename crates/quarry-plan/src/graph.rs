//! Declared resource graph.
//!
//! The declaration pass builds this graph in memory; nothing here talks to a
//! provisioning engine. Construction cannot fail — validation has already
//! rejected every configuration this module would trip over.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use quarry_core::{AutoScalingPolicy, NodeRole};

use crate::error::{PlanError, PlanResult};

/// Lifecycle of a declared group inside the planning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupState {
    Init,
    Declared,
    DependencyAttached,
}

/// What happens to a group's durable resources when the plan is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionPolicy {
    #[default]
    Destroy,
    Retain,
}

/// A dedicated network interface giving an ensemble member a stable address.
///
/// Addresses are not known at planning time; [`NetworkInterface::address`]
/// is a symbolic token (`@<id>`) the provisioning engine resolves when the
/// interface materializes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInterface {
    pub id: String,
    pub subnet_index: usize,
    pub description: String,
}

impl NetworkInterface {
    pub fn address(&self) -> String {
        format!("@{}", self.id)
    }
}

/// Storage volumes attached to each node of a group, sizes in GiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageVolumes {
    pub root_gib: u32,
    pub segment_cache_gib: Option<u32>,
    pub task_cache_gib: Option<u32>,
}

/// Rolling-update batching applied when a group's launch settings change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingUpdate {
    pub max_batch_size: u32,
    /// Minutes to wait for bootstrap success signals per batch.
    pub pause_minutes: u64,
}

/// One autoscaled node group in the plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub role: NodeRole,
    pub tier: String,
    pub min_nodes: u32,
    pub max_nodes: u32,
    pub instance_type: String,
    /// Index of the availability zone this group is pinned to, when the
    /// platform splits a tier into per-zone groups.
    pub availability_zone: Option<u32>,
    pub volumes: StorageVolumes,
    pub rolling_update: RollingUpdate,
    /// Scaling behavior the engine attaches to the group; ensemble members
    /// never scale and carry none.
    pub scaling: Option<AutoScalingPolicy>,
    pub bootstrap: String,
    pub tags: BTreeMap<String, String>,
    pub state: GroupState,
}

/// The full declared topology: groups, dependency edges, and the stable
/// network identities backing the coordination ensemble.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceGraph {
    groups: Vec<ResourceGroup>,
    /// `(dependent, dependency)` pairs: the first group is declared only
    /// after the second is up.
    edges: Vec<(String, String)>,
    network_interfaces: Vec<NetworkInterface>,
    pub retention: RetentionPolicy,
}

impl ResourceGraph {
    pub fn new(retention: RetentionPolicy) -> Self {
        ResourceGraph {
            retention,
            ..Default::default()
        }
    }

    /// Add a group to the graph in the `Declared` state and return its id.
    pub fn declare(&mut self, mut group: ResourceGroup) -> String {
        group.state = GroupState::Declared;
        let id = group.id.clone();
        self.groups.push(group);
        id
    }

    pub fn declare_interface(&mut self, interface: NetworkInterface) {
        self.network_interfaces.push(interface);
    }

    /// Record that `dependent` must wait for `dependency`.
    pub fn depend(&mut self, dependent: &str, dependency: &str) -> PlanResult<()> {
        if !self.contains(dependency) {
            return Err(PlanError::UnknownGroup(dependency.to_string()));
        }
        let group = self
            .groups
            .iter_mut()
            .find(|g| g.id == dependent)
            .ok_or_else(|| PlanError::UnknownGroup(dependent.to_string()))?;
        group.state = GroupState::DependencyAttached;
        self.edges.push((dependent.to_string(), dependency.to_string()));
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.groups.iter().any(|g| g.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&ResourceGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn groups(&self) -> &[ResourceGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [ResourceGroup] {
        &mut self.groups
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn network_interfaces(&self) -> &[NetworkInterface] {
        &self.network_interfaces
    }

    /// Ids of the groups `id` depends on, in declaration order.
    pub fn dependencies_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|(dependent, _)| dependent == id)
            .map(|(_, dependency)| dependency.as_str())
            .collect()
    }

    pub fn has_edge(&self, dependent: &str, dependency: &str) -> bool {
        self.edges
            .iter()
            .any(|(a, b)| a == dependent && b == dependency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str, role: NodeRole) -> ResourceGroup {
        ResourceGroup {
            id: id.to_string(),
            role,
            tier: quarry_core::DEFAULT_TIER.to_string(),
            min_nodes: 1,
            max_nodes: 1,
            instance_type: "m5.large".to_string(),
            availability_zone: None,
            volumes: StorageVolumes {
                root_gib: 20,
                segment_cache_gib: None,
                task_cache_gib: None,
            },
            rolling_update: RollingUpdate {
                max_batch_size: 1,
                pause_minutes: 60,
            },
            scaling: None,
            bootstrap: String::new(),
            tags: BTreeMap::new(),
            state: GroupState::Init,
        }
    }

    #[test]
    fn declare_moves_group_to_declared() {
        let mut graph = ResourceGraph::default();
        let id = graph.declare(group("master", NodeRole::Master));
        assert_eq!(graph.group(&id).unwrap().state, GroupState::Declared);
    }

    #[test]
    fn depend_records_edge_and_advances_state() {
        let mut graph = ResourceGraph::default();
        graph.declare(group("data", NodeRole::Data));
        graph.declare(group("query", NodeRole::Query));
        graph.depend("query", "data").unwrap();

        assert!(graph.has_edge("query", "data"));
        assert_eq!(
            graph.group("query").unwrap().state,
            GroupState::DependencyAttached
        );
        assert_eq!(graph.dependencies_of("query"), ["data"]);
    }

    #[test]
    fn depend_rejects_unknown_groups() {
        let mut graph = ResourceGraph::default();
        graph.declare(group("query", NodeRole::Query));
        assert!(matches!(
            graph.depend("query", "missing"),
            Err(PlanError::UnknownGroup(_))
        ));
        assert!(matches!(
            graph.depend("missing", "query"),
            Err(PlanError::UnknownGroup(_))
        ));
    }

    #[test]
    fn interface_address_is_a_symbolic_token() {
        let eni = NetworkInterface {
            id: "analytics-zk-eni-1".to_string(),
            subnet_index: 0,
            description: "ZooKeeperNode1".to_string(),
        };
        assert_eq!(eni.address(), "@analytics-zk-eni-1");
    }
}
