//! The declaration pass: turns a validated configuration into a
//! [`ResourceGraph`] with every dependency edge attached.
//!
//! Ordering rules, in pass order:
//!
//! 1. the coordination ensemble is declared first, members chained;
//! 2. every data-phase group waits for the last ensemble member, and when
//!    both historical and middle-manager tiers exist the first
//!    middle-manager group waits for the last historical group;
//! 3. every query group waits for every data-phase group;
//! 4. the master group waits for every query group.
//!
//! Within a role-processing pass each new group additionally waits for the
//! previous group of that pass, so N tiers in a role yield exactly N-1
//! intra-role edges.

use std::collections::BTreeMap;

use tracing::{debug, info};

use quarry_bootstrap::{ResolvedEndpoints, bootstrap_variables, render, role_script};
use quarry_core::constants::{
    DEFAULT_ROOT_VOLUME_SIZE_GIB, DEFAULT_SEGMENT_CACHE_VOLUME_SIZE_GIB,
    DEFAULT_TASK_CACHE_VOLUME_SIZE_GIB, ROLLING_UPDATE_PAUSE_MINUTES,
};
use quarry_core::{
    ClusterConfig, HostingPlatform, NodeGroupConfig, NodeRole, TierKey, node_tier_name,
};

use crate::annotate::annotate;
use crate::ensemble::plan_ensemble;
use crate::error::{PlanError, PlanResult};
use crate::graph::{
    GroupState, ResourceGraph, ResourceGroup, RetentionPolicy, RollingUpdate, StorageVolumes,
};
use crate::node_groups::{AzSlice, split_across_azs};

/// Run the full declaration pass over a validated configuration.
pub fn plan(config: &ClusterConfig, endpoints: &ResolvedEndpoints) -> PlanResult<ResourceGraph> {
    let retention = if config.retain_data.unwrap_or(false) {
        RetentionPolicy::Retain
    } else {
        RetentionPolicy::Destroy
    };
    let mut graph = ResourceGraph::new(retention);

    let hosting = config.hosting().ok_or(PlanError::MissingHosting)?;

    // Fail fast on zone distribution before anything is declared.
    let az_slices = if config.platform == HostingPlatform::Eks {
        Some(compute_az_slices(config)?)
    } else {
        None
    };

    let zookeeper = hosting
        .groups_for_role(NodeRole::Zookeeper)
        .into_iter()
        .next()
        .ok_or(PlanError::MissingEnsembleGroup)?
        .1;
    let ensemble = plan_ensemble(config, zookeeper, endpoints, &mut graph)?;

    // Later passes render bootstrap scripts against the assembled ensemble
    // connection string.
    let mut endpoints = endpoints.clone();
    endpoints.zookeeper_connection_string = ensemble.connection_string.clone();
    let last_member = ensemble
        .member_ids
        .last()
        .cloned()
        .ok_or(PlanError::MissingEnsembleGroup)?;

    let data_ids = plan_data_tiers(config, &endpoints, az_slices.as_ref(), &mut graph)?;
    for id in &data_ids {
        graph.depend(id, &last_member)?;
    }

    let query_ids = plan_query_tiers(config, &endpoints, &mut graph)?;
    for query_id in &query_ids {
        for data_id in &data_ids {
            graph.depend(query_id, data_id)?;
        }
    }

    let master_id = plan_master(config, &endpoints, &mut graph)?;
    for query_id in &query_ids {
        graph.depend(&master_id, query_id)?;
    }

    info!(
        groups = graph.groups().len(),
        edges = graph.edges().len(),
        "declaration pass complete"
    );

    Ok(annotate(graph, config))
}

/// Storage volumes for one group. Every node gets an encrypted root volume;
/// cache volumes are attached when configured. The container platform also
/// applies its built-in cache-volume defaults to data-phase roles.
pub(crate) fn storage_volumes(
    platform: HostingPlatform,
    role: NodeRole,
    group: &NodeGroupConfig,
) -> StorageVolumes {
    let mut segment_cache_gib = group.segment_cache_volume_size;
    let mut task_cache_gib = group.task_cache_volume_size;
    if platform == HostingPlatform::Eks {
        if matches!(role, NodeRole::Data | NodeRole::Historical) && segment_cache_gib.is_none() {
            segment_cache_gib = Some(DEFAULT_SEGMENT_CACHE_VOLUME_SIZE_GIB);
        }
        if matches!(role, NodeRole::Data | NodeRole::MiddleManager) && task_cache_gib.is_none() {
            task_cache_gib = Some(DEFAULT_TASK_CACHE_VOLUME_SIZE_GIB);
        }
    }

    StorageVolumes {
        root_gib: group.root_volume_size.unwrap_or(DEFAULT_ROOT_VOLUME_SIZE_GIB),
        segment_cache_gib,
        task_cache_gib,
    }
}

pub(crate) fn rolling_update(group: &NodeGroupConfig) -> RollingUpdate {
    RollingUpdate {
        max_batch_size: group
            .rolling_update_policy
            .as_ref()
            .and_then(|p| p.max_batch_size)
            .unwrap_or(1),
        pause_minutes: ROLLING_UPDATE_PAUSE_MINUTES,
    }
}

fn declare_group(
    config: &ClusterConfig,
    endpoints: &ResolvedEndpoints,
    role: NodeRole,
    tier: &str,
    group: &NodeGroupConfig,
    slice: Option<&AzSlice>,
    graph: &mut ResourceGraph,
) -> PlanResult<String> {
    let vars = bootstrap_variables(config, role, tier, group, endpoints)?;
    let bootstrap = render(&role_script(role), &vars);

    let tier_name = node_tier_name(role, Some(tier));
    let (id, min_nodes, max_nodes, az) = match slice {
        Some(slice) => (
            format!("{tier_name}-az{}", slice.az_index + 1),
            slice.min_nodes,
            slice.max_nodes,
            Some(slice.az_index),
        ),
        None => (
            tier_name,
            group.min_nodes,
            group.max_nodes.unwrap_or(group.min_nodes),
            None,
        ),
    };

    debug!(group = %id, %role, "declaring node group");
    Ok(graph.declare(ResourceGroup {
        id,
        role,
        tier: tier.to_string(),
        min_nodes,
        max_nodes,
        instance_type: group.instance_type.clone(),
        availability_zone: az,
        volumes: storage_volumes(config.platform, role, group),
        rolling_update: rolling_update(group),
        scaling: group.auto_scaling_policy.clone(),
        bootstrap,
        tags: BTreeMap::new(),
        state: GroupState::Init,
    }))
}

/// Chain `id` behind the last entry of `pass_list`, then append it.
fn chain(graph: &mut ResourceGraph, pass_list: &mut Vec<String>, id: String) -> PlanResult<()> {
    if let Some(previous) = pass_list.last() {
        graph.depend(&id, previous)?;
    }
    pass_list.push(id);
    Ok(())
}

/// Declare every data-phase tier. Returns the declared ids: combined data
/// groups first, then middle-manager groups, then historical groups.
fn plan_data_tiers(
    config: &ClusterConfig,
    endpoints: &ResolvedEndpoints,
    az_slices: Option<&BTreeMap<String, Vec<AzSlice>>>,
    graph: &mut ResourceGraph,
) -> PlanResult<Vec<String>> {
    let hosting = config.hosting().ok_or(PlanError::MissingHosting)?;

    let mut data_ids = Vec::new();
    let mut historical_ids = Vec::new();
    let mut middle_manager_ids = Vec::new();

    for (key, group) in hosting.iter() {
        let Ok(tier_key) = TierKey::parse(key) else {
            continue;
        };
        if !tier_key.role.is_data_phase() {
            continue;
        }
        let pass_list = match tier_key.role {
            NodeRole::Historical => &mut historical_ids,
            NodeRole::MiddleManager => &mut middle_manager_ids,
            _ => &mut data_ids,
        };

        match az_slices.and_then(|slices| slices.get(key)) {
            Some(slices) => {
                for slice in slices {
                    let id = declare_group(
                        config,
                        endpoints,
                        tier_key.role,
                        &tier_key.tier,
                        group,
                        Some(slice),
                        graph,
                    )?;
                    chain(graph, pass_list, id)?;
                }
            }
            None => {
                let id = declare_group(
                    config,
                    endpoints,
                    tier_key.role,
                    &tier_key.tier,
                    group,
                    None,
                    graph,
                )?;
                chain(graph, pass_list, id)?;
            }
        }
    }

    // Historical groups come up before any middle manager starts ingesting.
    if let (Some(last_historical), Some(first_middle_manager)) =
        (historical_ids.last(), middle_manager_ids.first())
    {
        graph.depend(first_middle_manager, last_historical)?;
    }

    let mut ids = data_ids;
    ids.append(&mut middle_manager_ids);
    ids.append(&mut historical_ids);
    Ok(ids)
}

fn plan_query_tiers(
    config: &ClusterConfig,
    endpoints: &ResolvedEndpoints,
    graph: &mut ResourceGraph,
) -> PlanResult<Vec<String>> {
    let hosting = config.hosting().ok_or(PlanError::MissingHosting)?;

    let mut query_ids = Vec::new();
    for (tier_key, group) in hosting.groups_for_role(NodeRole::Query) {
        let id = declare_group(
            config,
            endpoints,
            NodeRole::Query,
            &tier_key.tier,
            group,
            None,
            graph,
        )?;
        chain(graph, &mut query_ids, id)?;
    }
    Ok(query_ids)
}

fn plan_master(
    config: &ClusterConfig,
    endpoints: &ResolvedEndpoints,
    graph: &mut ResourceGraph,
) -> PlanResult<String> {
    let hosting = config.hosting().ok_or(PlanError::MissingHosting)?;
    let (tier_key, group) = hosting
        .groups_for_role(NodeRole::Master)
        .into_iter()
        .next()
        .ok_or_else(|| PlanError::UnknownGroup("master".to_string()))?;

    declare_group(
        config,
        endpoints,
        NodeRole::Master,
        &tier_key.tier,
        group,
        None,
        graph,
    )
}

/// Pre-compute the per-zone split of every data-phase tier, failing on the
/// first tier that does not distribute evenly.
fn compute_az_slices(config: &ClusterConfig) -> PlanResult<BTreeMap<String, Vec<AzSlice>>> {
    let hosting = config.hosting().ok_or(PlanError::MissingHosting)?;
    let az_count = config.availability_zone_count.unwrap_or(3);

    let mut slices = BTreeMap::new();
    for (key, group) in hosting.iter() {
        let Ok(tier_key) = TierKey::parse(key) else {
            continue;
        };
        if !tier_key.role.is_data_phase() {
            continue;
        }
        slices.insert(
            key.to_string(),
            split_across_azs(
                key,
                group.min_nodes,
                group.max_nodes.unwrap_or(group.min_nodes),
                az_count,
            )?,
        );
    }
    Ok(slices)
}
