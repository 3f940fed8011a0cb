//! Template-variable assembly for node bootstrap scripts.
//!
//! Every node group gets a flat `KEY -> value` map fed to [`crate::render`].
//! Values come from four places, later ones winning on key conflicts: static
//! role defaults, sizing-derived numbers, operator overrides, and identifiers
//! resolved from already-planned resources ([`ResolvedEndpoints`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use quarry_catalog::{instance_type_info, tuning};
use quarry_core::constants::{
    DEEP_STORAGE_PREFIX, DEFAULT_CONCURRENT_QUERY_LIMIT, DEFAULT_ZOOKEEPER_VERSION,
    METRICS_NAMESPACE,
};
use quarry_core::{
    ClusterConfig, NodeGroupConfig, NodeRole, ProcessType, PropertyMap, node_tier_name,
};

use crate::BootstrapResult;

/// Identifiers resolved from resources planned before the node groups.
///
/// Optional fields render as empty strings when absent, matching the
/// bootstrap scripts' `[ -n "$VAR" ]` guards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolvedEndpoints {
    pub region: String,
    pub installation_bucket: String,
    pub deep_storage_bucket: String,
    pub deep_storage_key_id: Option<String>,
    pub zookeeper_connection_string: String,
    pub metadata_db_endpoint: String,
    pub metadata_db_port: u16,
    pub metadata_db_name: String,
    pub metadata_db_secret_name: String,
    pub admin_user_secret_name: String,
    pub system_user_secret_name: String,
    pub oidc_client_secret_name: Option<String>,
    pub tls_certificate_secret_name: Option<String>,
    pub graceful_termination_flag: String,
    pub base_url: String,
}

fn role_template(role: NodeRole) -> &'static str {
    match role {
        NodeRole::Zookeeper => include_str!("../templates/zookeeper.sh"),
        NodeRole::Master => include_str!("../templates/master.sh"),
        NodeRole::Query => include_str!("../templates/query.sh"),
        NodeRole::Data => include_str!("../templates/data.sh"),
        NodeRole::Historical => include_str!("../templates/historical.sh"),
        NodeRole::MiddleManager => include_str!("../templates/middle_manager.sh"),
    }
}

fn common_template() -> &'static str {
    include_str!("../templates/common.sh")
}

/// Complete startup script for a node role: the common prelude is spliced
/// into the role template's `{{COMMON_USER_DATA}}` slot before any variable
/// substitution, so placeholder resolution never depends on key order. The
/// coordination-service template is standalone and passes through as is.
pub fn role_script(role: NodeRole) -> String {
    role_template(role).replace("{{COMMON_USER_DATA}}", common_template())
}

/// JSON text for an optional override map; absent maps render as the
/// JSON empty string so the consuming script can tell "no overrides" from
/// an empty object.
fn json_or_empty(map: Option<&PropertyMap>) -> String {
    map.map(|m| Value::Object(m.clone()))
        .unwrap_or_else(|| Value::String(String::new()))
        .to_string()
}

/// Sizing reference for merge-buffer and load-queue maths: the combined data
/// group when present, else the historical group, else the group itself.
fn data_sizing_instance_type<'a>(config: &'a ClusterConfig, group: &'a NodeGroupConfig) -> &'a str {
    let hosting = config.hosting();
    hosting
        .and_then(|h| {
            h.groups_for_role(NodeRole::Data)
                .into_iter()
                .chain(h.groups_for_role(NodeRole::Historical))
                .next()
        })
        .map(|(_, g)| g.instance_type.as_str())
        .unwrap_or(&group.instance_type)
}

/// Assemble the full variable map for one node group.
pub fn bootstrap_variables(
    config: &ClusterConfig,
    role: NodeRole,
    tier: &str,
    group: &NodeGroupConfig,
    endpoints: &ResolvedEndpoints,
) -> BootstrapResult<BTreeMap<String, String>> {
    let instance_info = instance_type_info(&group.instance_type)?;
    let data_info = instance_type_info(data_sizing_instance_type(config, group))?;

    let query_limit = config
        .concurrent_query_limit
        .unwrap_or(DEFAULT_CONCURRENT_QUERY_LIMIT);
    let broker_tiers: Vec<String> = config
        .hosting()
        .map(|h| h.broker_tiers())
        .unwrap_or_default();

    let mut coordinator_config = PropertyMap::new();
    coordinator_config.insert(
        "druid.coordinator.loadqueuepeon.http.batchSize".to_string(),
        json!(tuning::load_queue_batch_size(&data_info)),
    );
    if let Some(overrides) = group.runtime_overrides(ProcessType::Coordinator) {
        for (key, value) in overrides {
            coordinator_config.insert(key.clone(), value.clone());
        }
    }

    let oidc = config.oidc_idp.as_ref();

    let mut vars = BTreeMap::new();
    let mut set = |key: &str, value: String| {
        vars.insert(key.to_string(), value);
    };

    set("DRUID_VERSION", config.druid_version.clone());
    set("DRUID_EXTENSIONS", json!(config.extensions).to_string());
    set("DRUID_COMPONENT", node_tier_name(role, Some(tier)));
    set("DRUID_CLUSTER_NAME", config.cluster_name.clone());
    set("DRUID_METRICS_NAMESPACE", METRICS_NAMESPACE.to_string());
    set("DRUID_BASE_URL", endpoints.base_url.clone());

    set("REGION", endpoints.region.clone());
    set(
        "USE_FIPS_ENDPOINT",
        config.use_fips_endpoint.unwrap_or(false).to_string(),
    );

    set(
        "S3_INSTALLATION_BUCKET",
        endpoints.installation_bucket.clone(),
    );
    set("S3_DATA_BUCKET", endpoints.deep_storage_bucket.clone());
    set(
        "S3_DATA_BUCKET_KEY_ID",
        endpoints.deep_storage_key_id.clone().unwrap_or_default(),
    );
    set(
        "S3_DATA_BUCKET_PREFIX",
        config
            .deep_storage
            .as_ref()
            .and_then(|ds| ds.bucket_prefix.clone())
            .unwrap_or_else(|| DEEP_STORAGE_PREFIX.to_string()),
    );

    set("ZOOKEEPER_IPS", endpoints.zookeeper_connection_string.clone());
    set("RDS_ADDRESS_ENDPOINT", endpoints.metadata_db_endpoint.clone());
    set("RDS_PORT_ENDPOINT", endpoints.metadata_db_port.to_string());
    set("RDS_SECRET_NAME", endpoints.metadata_db_secret_name.clone());
    set("DB_NAME", endpoints.metadata_db_name.clone());
    set(
        "ADMIN_USER_SECRET_NAME",
        endpoints.admin_user_secret_name.clone(),
    );
    set(
        "SYSTEM_USER_SECRET_NAME",
        endpoints.system_user_secret_name.clone(),
    );
    set(
        "TLS_CERTIFICATE_SECRET_NAME",
        endpoints
            .tls_certificate_secret_name
            .clone()
            .unwrap_or_default(),
    );
    set(
        "GRACEFUL_TERMINATION_PARAM_NAME",
        endpoints.graceful_termination_flag.clone(),
    );

    set(
        "OIDC_CLIENT_ID",
        oidc.map(|o| o.client_id.clone()).unwrap_or_default(),
    );
    set(
        "OIDC_DISCOVERY_URI",
        oidc.map(|o| o.discovery_uri.clone()).unwrap_or_default(),
    );
    set(
        "OIDC_GROUP_CLAIM_NAME",
        oidc.and_then(|o| o.group_claim_name.clone())
            .unwrap_or_default(),
    );
    set(
        "OIDC_CUSTOM_SCOPES",
        oidc.and_then(|o| o.custom_scopes.as_ref())
            .map(|scopes| json!(scopes).to_string())
            .unwrap_or_default(),
    );
    set(
        "OIDC_CLIENT_SECRET_NAME",
        endpoints
            .oidc_client_secret_name
            .clone()
            .unwrap_or_default(),
    );

    set("SERVICE_TIER", tier.to_string());
    set(
        "SERVICE_PRIORITY",
        group.service_priority.unwrap_or(0).to_string(),
    );
    set("BROKER_TIERS", json!(broker_tiers).to_string());
    set(
        "NUM_HTTP_CONNECTIONS",
        tuning::http_connection_count(role, query_limit, group.min_nodes).to_string(),
    );
    set(
        "NUM_MERGE_BUFFERS",
        tuning::merge_buffer_count(&data_info).to_string(),
    );
    set("CPU_ARCHITECTURE", instance_info.arch.as_str().to_string());

    set(
        "COMMON_RUNTIME_CONFIG",
        json_or_empty(config.common_runtime_config.as_ref()),
    );
    set(
        "COORDINATOR_RUNTIME_CONFIG",
        Value::Object(coordinator_config).to_string(),
    );
    set(
        "OVERLORD_RUNTIME_CONFIG",
        json_or_empty(group.runtime_overrides(ProcessType::Overlord)),
    );
    set(
        "BROKER_RUNTIME_CONFIG",
        json_or_empty(group.runtime_overrides(ProcessType::Broker)),
    );
    set(
        "ROUTER_RUNTIME_CONFIG",
        json_or_empty(group.runtime_overrides(ProcessType::Router)),
    );
    set(
        "MIDDLEMANAGER_RUNTIME_CONFIG",
        json_or_empty(group.runtime_overrides(ProcessType::MiddleManager)),
    );
    set(
        "HISTORICAL_RUNTIME_CONFIG",
        json_or_empty(group.runtime_overrides(ProcessType::Historical)),
    );
    set(
        "EMITTER_CONFIG",
        config
            .emitter
            .as_ref()
            .and_then(|e| serde_json::to_string(e).ok())
            .unwrap_or_else(|| Value::String(String::new()).to_string()),
    );

    Ok(vars)
}

/// Variable map for one coordination-ensemble member. Members are standalone
/// single-node groups with stable one-based server ids; the full member
/// address list is known before any member's script is rendered.
pub fn zookeeper_variables(
    config: &ClusterConfig,
    group: &NodeGroupConfig,
    endpoints: &ResolvedEndpoints,
    server_id: u32,
    member_ips: &[String],
) -> BootstrapResult<BTreeMap<String, String>> {
    let instance_info = instance_type_info(&group.instance_type)?;

    let servers: Vec<String> = member_ips
        .iter()
        .enumerate()
        .map(|(idx, ip)| format!("server.{}={ip}:2888:3888", idx + 1))
        .collect();

    let mut vars = BTreeMap::new();
    let mut set = |key: &str, value: String| {
        vars.insert(key.to_string(), value);
    };

    set("REGION", endpoints.region.clone());
    set(
        "S3_INSTALLATION_BUCKET",
        endpoints.installation_bucket.clone(),
    );
    set("DRUID_CLUSTER_NAME", config.cluster_name.clone());
    set("ZK_COUNT", member_ips.len().to_string());
    set("ZK_NODE_ID", format!("ZooKeeperNode{server_id}"));
    set("ZK_MY_ID", server_id.to_string());
    set(
        "ZK_VERSION",
        config
            .zookeeper_version
            .clone()
            .unwrap_or_else(|| DEFAULT_ZOOKEEPER_VERSION.to_string()),
    );
    set("ZK_SERVERS", servers.join("\n"));
    set(
        "USE_FIPS_ENDPOINT",
        config.use_fips_endpoint.unwrap_or(false).to_string(),
    );
    set("CPU_ARCHITECTURE", instance_info.arch.as_str().to_string());

    Ok(vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{DEFAULT_TIER, HostingPlatform, NodeGroupMap};
    use serde_json::json;

    fn group(min: u32, instance: &str) -> NodeGroupConfig {
        NodeGroupConfig {
            min_nodes: min,
            instance_type: instance.to_string(),
            ..Default::default()
        }
    }

    fn config() -> ClusterConfig {
        let mut hosting = NodeGroupMap::new();
        hosting.insert("zookeeper", group(3, "m5.large"));
        // r5.2xlarge: 8 cpu
        hosting.insert("data", group(2, "r5.2xlarge"));
        hosting.insert("query", group(3, "m5.xlarge"));
        hosting.insert("master", group(1, "m5.large"));

        ClusterConfig {
            cluster_name: "analytics".to_string(),
            druid_version: "30.0.0".to_string(),
            zookeeper_version: None,
            platform: HostingPlatform::Ec2,
            extensions: vec!["druid-s3-extensions".to_string()],
            ec2_config: Some(hosting),
            eks_config: None,
            metadata_store: None,
            deep_storage: None,
            common_runtime_config: None,
            emitter: None,
            retention_rules: None,
            concurrent_query_limit: Some(100),
            oidc_idp: None,
            internet_facing: None,
            use_fips_endpoint: None,
            retain_data: None,
            availability_zone_count: None,
            tags: None,
            additional_tags: None,
        }
    }

    fn endpoints() -> ResolvedEndpoints {
        ResolvedEndpoints {
            region: "us-east-1".to_string(),
            zookeeper_connection_string: "10.0.0.1:2181,10.0.0.2:2181".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn query_group_splits_the_connection_budget() {
        let cfg = config();
        let query = cfg.hosting().unwrap().get("query").unwrap().clone();
        let vars = bootstrap_variables(&cfg, NodeRole::Query, DEFAULT_TIER, &query, &endpoints())
            .unwrap();

        assert_eq!(vars["NUM_HTTP_CONNECTIONS"], "34");
        assert_eq!(vars["DRUID_COMPONENT"], "query");
        assert_eq!(vars["SERVICE_TIER"], DEFAULT_TIER);
    }

    #[test]
    fn merge_buffers_follow_the_data_group_sizing() {
        let cfg = config();
        let master = cfg.hosting().unwrap().get("master").unwrap().clone();
        let vars = bootstrap_variables(&cfg, NodeRole::Master, DEFAULT_TIER, &master, &endpoints())
            .unwrap();

        // data group is r5.2xlarge (8 cpu): max(2, ceil(8/4)) = 2
        assert_eq!(vars["NUM_MERGE_BUFFERS"], "2");
        assert!(
            vars["COORDINATOR_RUNTIME_CONFIG"]
                .contains("\"druid.coordinator.loadqueuepeon.http.batchSize\":2")
        );
    }

    #[test]
    fn coordinator_overrides_win_over_computed_batch_size() {
        let cfg = config();
        let mut master = cfg.hosting().unwrap().get("master").unwrap().clone();
        let overrides = match json!({"druid.coordinator.loadqueuepeon.http.batchSize": 9}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        master.runtime_config = Some([(ProcessType::Coordinator, overrides)].into());

        let vars = bootstrap_variables(&cfg, NodeRole::Master, DEFAULT_TIER, &master, &endpoints())
            .unwrap();
        assert!(
            vars["COORDINATOR_RUNTIME_CONFIG"]
                .contains("\"druid.coordinator.loadqueuepeon.http.batchSize\":9")
        );
    }

    #[test]
    fn absent_overrides_render_as_json_empty_string() {
        let cfg = config();
        let query = cfg.hosting().unwrap().get("query").unwrap().clone();
        let vars = bootstrap_variables(&cfg, NodeRole::Query, DEFAULT_TIER, &query, &endpoints())
            .unwrap();
        assert_eq!(vars["BROKER_RUNTIME_CONFIG"], "\"\"");
        assert_eq!(vars["OIDC_CLIENT_ID"], "");
    }

    #[test]
    fn zookeeper_member_identity_and_quorum_list() {
        let cfg = config();
        let zk = cfg.hosting().unwrap().get("zookeeper").unwrap().clone();
        let ips = vec![
            "10.0.0.1".to_string(),
            "10.0.0.2".to_string(),
            "10.0.0.3".to_string(),
        ];
        let vars = zookeeper_variables(&cfg, &zk, &endpoints(), 2, &ips).unwrap();

        assert_eq!(vars["ZK_MY_ID"], "2");
        assert_eq!(vars["ZK_NODE_ID"], "ZooKeeperNode2");
        assert_eq!(vars["ZK_COUNT"], "3");
        assert_eq!(
            vars["ZK_SERVERS"],
            "server.1=10.0.0.1:2888:3888\nserver.2=10.0.0.2:2888:3888\nserver.3=10.0.0.3:2888:3888"
        );
        assert_eq!(vars["ZK_VERSION"], "3.8.4");
    }

    #[test]
    fn every_role_script_renders_without_unresolved_placeholders() {
        let cfg = config();
        let data = cfg.hosting().unwrap().get("data").unwrap().clone();
        for role in [
            NodeRole::Master,
            NodeRole::Query,
            NodeRole::Data,
            NodeRole::Historical,
            NodeRole::MiddleManager,
        ] {
            let vars =
                bootstrap_variables(&cfg, role, DEFAULT_TIER, &data, &endpoints()).unwrap();
            let rendered = crate::render(&role_script(role), &vars);
            assert!(
                !rendered.contains("{{"),
                "unresolved placeholder for {role}:\n{rendered}"
            );
        }

        let zk = cfg.hosting().unwrap().get("zookeeper").unwrap().clone();
        let ips = vec!["10.0.0.1".to_string()];
        let vars = zookeeper_variables(&cfg, &zk, &endpoints(), 1, &ips).unwrap();
        let rendered = crate::render(&role_script(NodeRole::Zookeeper), &vars);
        assert!(!rendered.contains("{{"), "unresolved placeholder:\n{rendered}");
    }
}
