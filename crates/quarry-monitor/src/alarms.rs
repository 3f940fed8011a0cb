//! Alarm composition.
//!
//! Thresholds are fixed cluster-wide; there is no per-tier override knob.

use serde::{Deserialize, Serialize};

use crate::metrics::{
    DATABASE_NAMESPACE, DIM_ZOOKEEPER_ID, Metric, MetricQuery, Statistic, cluster_metric,
    compute_metric, disk_usage_metric, memory_usage_metric,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    GreaterThan,
    LessThanOrEqual,
}

/// How evaluation treats periods with no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreatMissingData {
    NotBreaching,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub name: String,
    pub metric: MetricQuery,
    pub comparison: Comparison,
    pub threshold: f64,
    pub datapoints_to_alarm: u32,
    pub evaluation_periods: u32,
    pub treat_missing_data: TreatMissingData,
}

/// The common resource-utilisation profile: greater-than 85, three of five
/// periods, absent data never alarms.
fn utilisation_alarm(name: String, metric: MetricQuery) -> Alarm {
    Alarm {
        name,
        metric,
        comparison: Comparison::GreaterThan,
        threshold: 85.0,
        datapoints_to_alarm: 3,
        evaluation_periods: 5,
        treat_missing_data: TreatMissingData::NotBreaching,
    }
}

/// CPU, memory and disk alarms for one node group.
pub fn group_alarms(tier_name: &str, group_id: &str) -> Vec<Alarm> {
    vec![
        utilisation_alarm(
            format!("{tier_name}-cpu-utilisation-alarm"),
            compute_metric(group_id, "CPUUtilization"),
        ),
        utilisation_alarm(
            format!("{tier_name}-memory-utilisation-alarm"),
            memory_usage_metric(group_id),
        ),
        utilisation_alarm(
            format!("{tier_name}-disk-utilisation-alarm"),
            disk_usage_metric(group_id),
        ),
    ]
}

/// Per-member coordination-service alarms: request latency and outstanding
/// request backlog.
pub fn zookeeper_alarms(cluster_name: &str, member_count: u32) -> Vec<Alarm> {
    let mut alarms = Vec::with_capacity(member_count as usize * 2);
    for member in 1..=member_count {
        let member_metric = |name: &str| {
            let mut metric = cluster_metric(cluster_name, Some("ZooKeeper"), name, Statistic::P99);
            metric
                .dimensions
                .insert(DIM_ZOOKEEPER_ID.to_string(), member.to_string());
            MetricQuery::Metric(metric)
        };

        alarms.push(Alarm {
            name: format!("zk_max_latency_alarm_{member}"),
            metric: member_metric("zk_max_latency"),
            comparison: Comparison::GreaterThan,
            threshold: 3000.0,
            datapoints_to_alarm: 3,
            evaluation_periods: 5,
            treat_missing_data: TreatMissingData::Missing,
        });
        alarms.push(Alarm {
            name: format!("zk_outstanding_requests_alarm_{member}"),
            metric: member_metric("zk_outstanding_requests"),
            comparison: Comparison::GreaterThan,
            threshold: 50.0,
            datapoints_to_alarm: 3,
            evaluation_periods: 3,
            treat_missing_data: TreatMissingData::Missing,
        });
    }
    alarms
}

/// CPU alarm on the metadata database cluster.
pub fn metadata_db_alarms(db_identifier: &str) -> Vec<Alarm> {
    let mut dimensions = std::collections::BTreeMap::new();
    dimensions.insert("DBClusterIdentifier".to_string(), db_identifier.to_string());

    vec![Alarm {
        name: "metadata-db-cpu-utilisation-alarm".to_string(),
        metric: MetricQuery::Metric(Metric {
            namespace: DATABASE_NAMESPACE.to_string(),
            name: "CPUUtilization".to_string(),
            period_minutes: 5,
            statistic: Statistic::Average,
            dimensions,
        }),
        comparison: Comparison::GreaterThan,
        threshold: 75.0,
        datapoints_to_alarm: 3,
        evaluation_periods: 5,
        treat_missing_data: TreatMissingData::NotBreaching,
    }]
}

/// Query-service health alarms on the cluster's application metrics.
pub fn query_alarms(cluster_name: &str) -> Vec<Alarm> {
    vec![
        Alarm {
            name: "query-failures-alarm".to_string(),
            metric: MetricQuery::Metric(cluster_metric(
                cluster_name,
                Some("druid/historical"),
                "query/failed/count",
                Statistic::Average,
            )),
            comparison: Comparison::GreaterThan,
            threshold: 5.0,
            datapoints_to_alarm: 3,
            evaluation_periods: 5,
            treat_missing_data: TreatMissingData::NotBreaching,
        },
        Alarm {
            name: "query-time-alarm".to_string(),
            metric: MetricQuery::Metric(cluster_metric(
                cluster_name,
                Some("druid/broker"),
                "query/time",
                Statistic::P99,
            )),
            comparison: Comparison::GreaterThan,
            threshold: 10_000.0,
            datapoints_to_alarm: 3,
            evaluation_periods: 5,
            treat_missing_data: TreatMissingData::NotBreaching,
        },
    ]
}
