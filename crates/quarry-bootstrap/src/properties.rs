//! Runtime-property merging.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use quarry_core::constants::{
    RESERVED_PROPERTY_PREFIXES, broker_runtime_properties, common_runtime_properties,
    coordinator_runtime_properties, historical_runtime_properties,
    middle_manager_runtime_properties, overlord_runtime_properties, router_runtime_properties,
};
use quarry_core::{NodeGroupConfig, ProcessType, PropertyMap};

/// One `key=value` runtime property after merging and filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeProperty {
    pub key: String,
    pub value: Value,
}

/// Merge defaults with user overrides (overrides win), drop keys matching
/// the reserved-prefix list, and serialize structured values to JSON
/// strings. Output follows the merged map's insertion order.
///
/// Idempotent: feeding the output of a merge back through with the same
/// overrides yields the same list.
pub fn merge_runtime_properties(
    defaults: &PropertyMap,
    overrides: Option<&PropertyMap>,
) -> Vec<RuntimeProperty> {
    let mut merged = defaults.clone();
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }

    merged
        .into_iter()
        .filter(|(key, _)| {
            !RESERVED_PROPERTY_PREFIXES
                .iter()
                .any(|prefix| key.starts_with(prefix))
        })
        .map(|(key, value)| RuntimeProperty {
            key,
            value: match value {
                Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
                scalar => scalar,
            },
        })
        .collect()
}

/// Built-in defaults for one server process: the cluster-common properties
/// extended with the process-specific table.
pub fn default_properties(process: ProcessType) -> PropertyMap {
    let specific = match process {
        ProcessType::Coordinator => coordinator_runtime_properties(),
        ProcessType::Overlord => overlord_runtime_properties(),
        ProcessType::Broker => broker_runtime_properties(),
        ProcessType::Router => router_runtime_properties(),
        ProcessType::Historical => historical_runtime_properties(),
        ProcessType::MiddleManager => middle_manager_runtime_properties(),
        ProcessType::Zookeeper => PropertyMap::new(),
    };

    let mut properties = common_runtime_properties();
    for (key, value) in specific {
        properties.insert(key, value);
    }
    properties
}

/// Full property set for one process on one node group: built-in defaults
/// with the group's per-process overrides applied on top.
pub fn merged_properties(process: ProcessType, group: &NodeGroupConfig) -> Vec<RuntimeProperty> {
    merge_runtime_properties(&default_properties(process), group.runtime_overrides(process))
}

/// Format merged properties as `key=value` lines for a properties file.
/// String values are written raw, everything else in JSON notation.
pub fn format_properties(properties: &[RuntimeProperty]) -> String {
    let mut out = String::new();
    for property in properties {
        let value = match &property.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        out.push_str(&property.key);
        out.push('=');
        out.push_str(&value);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> PropertyMap {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn overrides_win_and_reserved_keys_are_dropped() {
        let defaults = map(json!({
            "druid.foo": "1",
            "druid.zk.service.host": "x",
        }));
        let overrides = map(json!({ "druid.foo": "2" }));

        let merged = merge_runtime_properties(&defaults, Some(&overrides));
        assert_eq!(
            merged,
            vec![RuntimeProperty {
                key: "druid.foo".to_string(),
                value: json!("2"),
            }]
        );
    }

    #[test]
    fn structured_values_become_json_strings() {
        let defaults = map(json!({
            "druid.monitoring.monitors": ["org.apache.druid.client.cache.CacheMonitor"],
            "druid.sql.enable": true,
            "druid.server.http.numThreads": 60,
        }));

        let merged = merge_runtime_properties(&defaults, None);
        assert_eq!(
            merged[0].value,
            json!("[\"org.apache.druid.client.cache.CacheMonitor\"]")
        );
        assert_eq!(merged[1].value, json!(true));
        assert_eq!(merged[2].value, json!(60));
    }

    #[test]
    fn merge_is_idempotent() {
        let defaults = map(json!({
            "druid.foo": "1",
            "druid.zk.service.host": "x",
            "druid.bar": { "nested": 1 },
        }));
        let overrides = map(json!({ "druid.foo": "2" }));

        let first = merge_runtime_properties(&defaults, Some(&overrides));
        let as_map: PropertyMap = first
            .iter()
            .map(|p| (p.key.clone(), p.value.clone()))
            .collect();
        let second = merge_runtime_properties(&as_map, Some(&overrides));
        assert_eq!(first, second);
    }

    #[test]
    fn output_preserves_insertion_order() {
        let defaults = map(json!({
            "druid.c": 1,
            "druid.a": 2,
            "druid.b": 3,
        }));
        let merged = merge_runtime_properties(&defaults, None);
        let keys: Vec<&str> = merged.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["druid.c", "druid.a", "druid.b"]);
    }

    #[test]
    fn merged_properties_layer_common_process_and_overrides() {
        let overrides = map(json!({ "druid.sql.enable": false }));
        let group = NodeGroupConfig {
            min_nodes: 2,
            instance_type: "m5.xlarge".to_string(),
            runtime_config: Some([(ProcessType::Broker, overrides)].into()),
            ..Default::default()
        };

        let merged = merged_properties(ProcessType::Broker, &group);
        let get = |key: &str| {
            merged
                .iter()
                .find(|p| p.key == key)
                .map(|p| p.value.clone())
        };
        // Common default, process default, and the override winning.
        assert_eq!(get("druid.lookup.enableLookupSyncOnStartup"), Some(json!(false)));
        assert_eq!(get("druid.broker.http.numConnections"), Some(json!(50)));
        assert_eq!(get("druid.sql.enable"), Some(json!(false)));
    }

    #[test]
    fn formats_properties_file_lines() {
        let properties = vec![
            RuntimeProperty {
                key: "druid.sql.enable".to_string(),
                value: json!(true),
            },
            RuntimeProperty {
                key: "druid.processing.buffer.sizeBytes".to_string(),
                value: json!("500MiB"),
            },
        ];
        assert_eq!(
            format_properties(&properties),
            "druid.sql.enable=true\ndruid.processing.buffer.sizeBytes=500MiB\n"
        );
    }
}
