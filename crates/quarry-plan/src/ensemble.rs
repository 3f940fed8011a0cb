//! Coordination-service ensemble planning.
//!
//! The ensemble is not one autoscaled group of N nodes: a member that loses
//! its identity breaks quorum. Each member is its own single-node group with
//! a one-based server id and a dedicated network interface, and member i+1
//! is declared strictly after member i.

use std::collections::BTreeMap;

use tracing::info;

use quarry_bootstrap::{ResolvedEndpoints, render, role_script, zookeeper_variables};
use quarry_core::{ClusterConfig, DEFAULT_TIER, NodeGroupConfig, NodeRole};

use crate::error::{PlanError, PlanResult};
use crate::graph::{GroupState, NetworkInterface, ResourceGraph, ResourceGroup};
use crate::planner::{rolling_update, storage_volumes};

/// Result of the ensemble pass: member group ids in declaration order and
/// the client connection string assembled from the members' stable
/// addresses.
#[derive(Debug, Clone)]
pub struct EnsemblePlan {
    pub member_ids: Vec<String>,
    pub connection_string: String,
}

/// Declare the ensemble into `graph`: N chained single-node groups, each
/// backed by a dedicated network interface.
pub fn plan_ensemble(
    config: &ClusterConfig,
    group: &NodeGroupConfig,
    endpoints: &ResolvedEndpoints,
    graph: &mut ResourceGraph,
) -> PlanResult<EnsemblePlan> {
    let member_count = group.min_nodes;
    if member_count == 0 {
        return Err(PlanError::MissingEnsembleGroup);
    }

    let mut addresses = Vec::with_capacity(member_count as usize);
    for server_id in 1..=member_count {
        let interface = NetworkInterface {
            id: format!("{}-zk-eni-{server_id}", config.cluster_name),
            subnet_index: (server_id as usize - 1),
            description: format!("ZooKeeperNode{server_id}"),
        };
        addresses.push(interface.address());
        graph.declare_interface(interface);
    }

    let mut member_ids = Vec::with_capacity(member_count as usize);
    let mut previous: Option<String> = None;
    for server_id in 1..=member_count {
        let vars = zookeeper_variables(config, group, endpoints, server_id, &addresses)?;
        let bootstrap = render(&role_script(NodeRole::Zookeeper), &vars);

        let member_id = format!("zookeeper-{server_id}");
        let mut tags = BTreeMap::new();
        tags.insert("Name".to_string(), format!("ZooKeeperNode{server_id}"));
        tags.insert(
            "ZooKeeperNodeId".to_string(),
            format!("ZooKeeperNode{server_id}"),
        );

        graph.declare(ResourceGroup {
            id: member_id.clone(),
            role: NodeRole::Zookeeper,
            tier: DEFAULT_TIER.to_string(),
            min_nodes: 1,
            max_nodes: 1,
            instance_type: group.instance_type.clone(),
            availability_zone: None,
            volumes: storage_volumes(config.platform, NodeRole::Zookeeper, group),
            rolling_update: rolling_update(group),
            scaling: None,
            bootstrap,
            tags,
            state: GroupState::Init,
        });

        if let Some(previous_id) = &previous {
            graph.depend(&member_id, previous_id)?;
        }
        previous = Some(member_id.clone());
        member_ids.push(member_id);
    }

    let connection_string = addresses
        .iter()
        .map(|addr| format!("{addr}:2181"))
        .collect::<Vec<_>>()
        .join(",");

    info!(
        members = member_count,
        connection_string, "planned coordination ensemble"
    );

    Ok(EnsemblePlan {
        member_ids,
        connection_string,
    })
}
