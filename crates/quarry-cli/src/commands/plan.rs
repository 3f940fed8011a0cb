use std::fs;

use serde::Serialize;
use tracing::info;

use quarry_core::{ClusterConfig, MetadataStoreType, NodeRole, RetentionRule, node_tier_name};
use quarry_lifecycle::{AutomationContext, GroupLifecycle};
use quarry_monitor::MonitoringPlan;
use quarry_plan::ResourceGraph;

use super::{load_config, load_endpoints};

/// Everything the declaration pass produces, serialized for the engine.
#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub graph: ResourceGraph,
    pub lifecycle: Vec<GroupLifecycle>,
    pub monitoring: MonitoringPlan,
    /// Segment retention rules the engine applies cluster-wide once the
    /// control tier is reachable.
    pub retention_rules: Option<Vec<RetentionRule>>,
}

pub fn plan(
    config_path: &str,
    endpoints_path: Option<&str>,
    region: Option<&str>,
    out: Option<&str>,
) -> anyhow::Result<()> {
    let config = load_config(config_path, region)?;
    let endpoints = load_endpoints(endpoints_path)?;

    let output = build_output(&config, &endpoints)?;
    let json = serde_json::to_string_pretty(&output)?;

    match out {
        Some(path) => {
            fs::write(path, &json)?;
            info!(path, "plan written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn build_output(
    config: &ClusterConfig,
    endpoints: &quarry_bootstrap::ResolvedEndpoints,
) -> anyhow::Result<PlanOutput> {
    let graph = quarry_plan::plan(config, endpoints)?;
    let lifecycle = attach_lifecycle(config, endpoints, &graph);
    let monitoring = compose_monitoring(config, &graph);

    Ok(PlanOutput {
        graph,
        lifecycle,
        monitoring,
        retention_rules: config.retention_rules.clone(),
    })
}

/// Termination hooks for every autoscaled group. Ensemble members keep
/// their instances for life, so they get no hook.
fn attach_lifecycle(
    config: &ClusterConfig,
    endpoints: &quarry_bootstrap::ResolvedEndpoints,
    graph: &ResourceGraph,
) -> Vec<GroupLifecycle> {
    let ctx = AutomationContext {
        region: endpoints.region.clone(),
        installation_bucket: endpoints.installation_bucket.clone(),
        system_user_secret_arn: endpoints.system_user_secret_name.clone(),
        graceful_termination_flag: endpoints.graceful_termination_flag.clone(),
        execution_timeout_secs: 0,
    };

    graph
        .groups()
        .iter()
        .filter(|group| group.role != NodeRole::Zookeeper)
        .filter_map(|group| {
            let tier_name = node_tier_name(group.role, Some(&group.tier));
            let group_config = config.hosting()?.get(&tier_name)?;
            Some(quarry_lifecycle::attach(
                &config.cluster_name,
                &group.id,
                group.role,
                &group.tier,
                group_config,
                &ctx,
            ))
        })
        .collect()
}

fn compose_monitoring(config: &ClusterConfig, graph: &ResourceGraph) -> MonitoringPlan {
    let mut zookeeper_members = 0u32;
    let mut groups = Vec::new();
    for group in graph.groups() {
        if group.role == NodeRole::Zookeeper {
            zookeeper_members += 1;
        } else {
            groups.push((
                node_tier_name(group.role, Some(&group.tier)),
                group.id.clone(),
            ));
        }
    }

    // Externally managed metadata stores bring their own monitoring.
    let db_identifier = match config.metadata_store.as_ref() {
        Some(store) if store.metadata_store_type == MetadataStoreType::Custom => None,
        _ => Some(format!("{}-metadata", config.cluster_name)),
    };

    quarry_monitor::compose(
        &config.cluster_name,
        &groups,
        zookeeper_members,
        db_identifier.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_bootstrap::ResolvedEndpoints;

    fn config() -> ClusterConfig {
        let json = r#"{
            "druidClusterName": "analytics",
            "druidVersion": "30.0.0",
            "druidOperationPlatform": "ec2",
            "druidExtensions": ["druid-kafka-indexing-service"],
            "druidEc2Config": {
                "zookeeper": {"minNodes": 3, "instanceType": "m5.large"},
                "data": {"minNodes": 2, "instanceType": "r5.2xlarge"},
                "query": {"minNodes": 2, "instanceType": "m5.xlarge"},
                "master": {"minNodes": 1, "instanceType": "m5.large"}
            }
        }"#;
        let config = ClusterConfig::from_json_str(json).unwrap();
        quarry_core::validate_and_normalize(config, None).unwrap()
    }

    #[test]
    fn lifecycle_skips_ensemble_members() {
        let config = config();
        let endpoints = ResolvedEndpoints::default();
        let graph = quarry_plan::plan(&config, &endpoints).unwrap();

        let lifecycle = attach_lifecycle(&config, &endpoints, &graph);
        let ids: Vec<&str> = lifecycle.iter().map(|l| l.hook.group_id.as_str()).collect();
        assert_eq!(ids, ["data", "query", "master"]);
    }

    #[test]
    fn monitoring_counts_the_ensemble_and_covers_all_tiers() {
        let config = config();
        let graph = quarry_plan::plan(&config, &ResolvedEndpoints::default()).unwrap();

        let monitoring = compose_monitoring(&config, &graph);
        // 3 members * 2 zk alarms + 1 db + 2 query-service + 3 tiers * 3.
        assert_eq!(monitoring.alarms.len(), 6 + 1 + 2 + 9);
    }

    #[test]
    fn retention_rules_are_carried_into_the_plan_output() {
        let json = r#"{
            "druidClusterName": "analytics",
            "druidVersion": "30.0.0",
            "druidOperationPlatform": "ec2",
            "druidExtensions": ["druid-kafka-indexing-service"],
            "druidEc2Config": {
                "zookeeper": {"minNodes": 1, "instanceType": "m5.large"},
                "data": {"minNodes": 2, "instanceType": "r5.2xlarge"},
                "query": {"minNodes": 2, "instanceType": "m5.xlarge"},
                "master": {"minNodes": 1, "instanceType": "m5.large"}
            },
            "druidRetentionRules": [
                {"type": "loadByPeriod", "period": "P30D"},
                {"type": "dropForever"}
            ]
        }"#;
        let config = ClusterConfig::from_json_str(json).unwrap();
        let config = quarry_core::validate_and_normalize(config, None).unwrap();

        let output = build_output(&config, &ResolvedEndpoints::default()).unwrap();
        let rules = output.retention_rules.as_ref().unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].rule_type, "loadByPeriod");

        let serialized = serde_json::to_value(&output).unwrap();
        assert_eq!(serialized["retention_rules"][1]["type"], "dropForever");
    }
}
