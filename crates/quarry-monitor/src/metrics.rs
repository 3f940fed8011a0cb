//! Metric queries referenced by widgets and alarms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use quarry_core::constants::METRICS_NAMESPACE;

pub const COMPUTE_NAMESPACE: &str = "AWS/EC2";
pub const DATABASE_NAMESPACE: &str = "AWS/RDS";

/// Dimension keys on custom cluster metrics.
pub const DIM_CLUSTER: &str = "Druid.Cluster";
pub const DIM_SERVICE: &str = "Druid.Service";
pub const DIM_ZOOKEEPER_ID: &str = "ZooKeeper.ID";
pub const DIM_GROUP: &str = "AutoScalingGroupName";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Average,
    Sum,
    P99,
}

/// A single metric stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub namespace: String,
    pub name: String,
    pub period_minutes: u32,
    pub statistic: Statistic,
    pub dimensions: BTreeMap<String, String>,
}

/// Either a raw metric or a math expression combining several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MetricQuery {
    Metric(Metric),
    Math {
        expression: String,
        using: BTreeMap<String, Metric>,
    },
}

fn group_dimensions(group_id: &str) -> BTreeMap<String, String> {
    let mut dims = BTreeMap::new();
    dims.insert(DIM_GROUP.to_string(), group_id.to_string());
    dims
}

/// Platform metric (`CPUUtilization`, `NetworkIn`, `NetworkOut`) for one
/// node group.
pub fn compute_metric(group_id: &str, name: &str) -> MetricQuery {
    MetricQuery::Metric(Metric {
        namespace: COMPUTE_NAMESPACE.to_string(),
        name: name.to_string(),
        period_minutes: 1,
        statistic: Statistic::Average,
        dimensions: group_dimensions(group_id),
    })
}

fn usage_ratio(group_id: &str, used: &str, total: &str, statistic: Statistic) -> MetricQuery {
    let metric = |name: &str| Metric {
        namespace: METRICS_NAMESPACE.to_string(),
        name: name.to_string(),
        period_minutes: 1,
        statistic,
        dimensions: group_dimensions(group_id),
    };
    let mut using = BTreeMap::new();
    using.insert("used".to_string(), metric(used));
    using.insert("total".to_string(), metric(total));
    MetricQuery::Math {
        expression: "(used / total) * 100".to_string(),
        using,
    }
}

/// Memory utilisation percentage from the used/total custom metrics.
pub fn memory_usage_metric(group_id: &str) -> MetricQuery {
    usage_ratio(group_id, "mem_used", "mem_total", Statistic::Average)
}

/// Disk utilisation percentage from the used/total custom metrics.
pub fn disk_usage_metric(group_id: &str) -> MetricQuery {
    usage_ratio(group_id, "disk_used", "disk_total", Statistic::Sum)
}

/// Custom cluster metric with `Druid.Cluster` (and optional service)
/// dimensions.
pub fn cluster_metric(
    cluster_name: &str,
    service: Option<&str>,
    name: &str,
    statistic: Statistic,
) -> Metric {
    let mut dimensions = BTreeMap::new();
    dimensions.insert(DIM_CLUSTER.to_string(), cluster_name.to_string());
    if let Some(service) = service {
        dimensions.insert(DIM_SERVICE.to_string(), service.to_string());
    }
    Metric {
        namespace: METRICS_NAMESPACE.to_string(),
        name: name.to_string(),
        period_minutes: 5,
        statistic,
        dimensions,
    }
}
