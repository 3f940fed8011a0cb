//! Platform constants and per-process default runtime properties.

use serde_json::json;

use crate::config::PropertyMap;

/// Namespace all custom runtime metrics are emitted under.
pub const METRICS_NAMESPACE: &str = "Quarry/Druid";

/// S3 prefix for deep-storage segments when none is configured.
pub const DEEP_STORAGE_PREFIX: &str = "druid/segments";

/// Heartbeat timeout (seconds) for the termination lifecycle hook.
pub const INSTANCE_TERMINATION_TIMEOUT_SECS: u64 = 5400;

/// Minutes to wait for bootstrap success signals during a rolling update.
pub const ROLLING_UPDATE_PAUSE_MINUTES: u64 = 60;

pub const DEFAULT_ROOT_VOLUME_SIZE_GIB: u32 = 20;
pub const DEFAULT_SEGMENT_CACHE_VOLUME_SIZE_GIB: u32 = 300;
pub const DEFAULT_TASK_CACHE_VOLUME_SIZE_GIB: u32 = 100;

pub const DEFAULT_ZOOKEEPER_VERSION: &str = "3.8.4";
pub const DEFAULT_DRUID_VERSION: &str = "30.0.0";

pub const DEFAULT_CONCURRENT_QUERY_LIMIT: u32 = 100;

/// Extensions every cluster gets regardless of operator configuration.
pub const MANDATORY_EXTENSIONS: &[&str] = &[
    "druid-oidc",
    "druid-cloudwatch",
    "druid-basic-security",
    "druid-s3-extensions",
    "postgresql-metadata-storage",
];

/// TLS between cluster members is only supported on the VM platform.
pub const EC2_ONLY_EXTENSIONS: &[&str] = &["simple-client-sslcontext"];

/// Regions where FIPS endpoints are available.
pub const FIPS_ENABLED_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "us-gov-east-1",
    "us-gov-west-1",
    "ca-central-1",
];

/// Reserved runtime-property prefixes the planner computes itself; user
/// overrides matching these are dropped during the merge.
pub const RESERVED_PROPERTY_PREFIXES: &[&str] = &[
    "druid.zk.service.host",
    "druid.zk.paths.base",
    "druid.zk.service.compress",
    "druid.metadata.storage",
    "druid.indexer.logs.type",
    "druid.indexer.logs.dir",
    "druid.emitter",
    "druid.selectors.indexing.serviceName",
    "druid.selectors.coordinator.serviceName",
    "druid.auth",
    "druid.escalator",
    "druid.service",
    "druid.segmentCache.locations",
    "druid.coordinator.asOverlord.enabled",
];

fn props(value: serde_json::Value) -> PropertyMap {
    match value {
        serde_json::Value::Object(map) => map,
        _ => PropertyMap::new(),
    }
}

pub fn router_runtime_properties() -> PropertyMap {
    props(json!({
        "druid.router.http.readTimeout": "PT5M",
        "druid.router.managementProxy.enabled": true,
    }))
}

pub fn broker_runtime_properties() -> PropertyMap {
    props(json!({
        "druid.sql.enable": true,
        "druid.broker.http.numConnections": 50,
        "druid.server.http.numThreads": 60,
        "druid.processing.buffer.sizeBytes": "500MiB",
    }))
}

pub fn coordinator_runtime_properties() -> PropertyMap {
    props(json!({
        "druid.coordinator.startDelay": "PT10S",
        "druid.coordinator.period": "PT5M",
        "druid.manager.config.pollDuration": "PT5M",
        "druid.coordinator.balancer.strategy": "random",
    }))
}

pub fn overlord_runtime_properties() -> PropertyMap {
    props(json!({
        "druid.indexer.queue.startDelay": "PT5S",
        "druid.indexer.runner.type": "remote",
        "druid.indexer.storage.type": "metadata",
        "druid.indexer.storage.recentlyFinishedThreshold": "PT2H",
        "druid.manager.config.pollDuration": "PT10M",
        "druid.indexer.runner.maxZnodeBytes": 15728640,
        "druid.monitoring.monitors": [
            "org.apache.druid.server.metrics.TaskCountStatsMonitor"
        ],
    }))
}

pub fn middle_manager_runtime_properties() -> PropertyMap {
    props(json!({
        "druid.indexer.fork.property.druid.processing.numMergeBuffers": 2,
        "druid.indexer.fork.property.druid.processing.buffer.sizeBytes": 100000000,
        "druid.indexer.fork.property.druid.processing.numThreads": 1,
        "druid.monitoring.monitors": [
            "org.apache.druid.server.metrics.WorkerTaskCountStatsMonitor"
        ],
    }))
}

pub fn historical_runtime_properties() -> PropertyMap {
    props(json!({
        "druid.processing.buffer.sizeBytes": "500MiB",
        "druid.historical.cache.useCache": true,
        "druid.historical.cache.populateCache": true,
        "druid.cache.type": "caffeine",
        "druid.cache.sizeInBytes": "256MiB",
        "druid.monitoring.monitors": [
            "org.apache.druid.client.cache.CacheMonitor",
            "org.apache.druid.server.metrics.QueryCountStatsMonitor"
        ],
    }))
}

pub fn common_runtime_properties() -> PropertyMap {
    props(json!({
        "druid.lookup.enableLookupSyncOnStartup": false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_avoid_reserved_prefixes() {
        for properties in [
            router_runtime_properties(),
            broker_runtime_properties(),
            coordinator_runtime_properties(),
            overlord_runtime_properties(),
            middle_manager_runtime_properties(),
            historical_runtime_properties(),
            common_runtime_properties(),
        ] {
            for key in properties.keys() {
                assert!(
                    !RESERVED_PROPERTY_PREFIXES
                        .iter()
                        .any(|prefix| key.starts_with(prefix)),
                    "default property {key} collides with a reserved prefix"
                );
            }
        }
    }
}
