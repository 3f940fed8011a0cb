//! Quarry monitor — dashboards and alarms over the planned topology.
//!
//! Composition only: the structures here describe what to watch; shipping
//! them to a telemetry backend is the provisioning engine's concern.

pub mod alarms;
pub mod dashboard;
pub mod metrics;

pub use alarms::{
    Alarm, Comparison, TreatMissingData, group_alarms, metadata_db_alarms, query_alarms,
    zookeeper_alarms,
};
pub use dashboard::{Dashboard, Widget, dashboard, group_widgets};
pub use metrics::{Metric, MetricQuery, Statistic};

use serde::{Deserialize, Serialize};

/// The full monitoring surface for a cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringPlan {
    pub dashboard: Dashboard,
    pub alarms: Vec<Alarm>,
}

/// Compose dashboard and alarms for a cluster. `groups` is `(tier name,
/// group id)` in declaration order; `zookeeper_members` the ensemble size.
pub fn compose(
    cluster_name: &str,
    groups: &[(String, String)],
    zookeeper_members: u32,
    db_identifier: Option<&str>,
) -> MonitoringPlan {
    let mut alarms = zookeeper_alarms(cluster_name, zookeeper_members);
    if let Some(db) = db_identifier {
        alarms.extend(metadata_db_alarms(db));
    }
    alarms.extend(query_alarms(cluster_name));
    for (tier_name, group_id) in groups {
        alarms.extend(group_alarms(tier_name, group_id));
    }

    MonitoringPlan {
        dashboard: dashboard(cluster_name, groups),
        alarms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_covers_every_surface() {
        let groups = vec![
            ("data".to_string(), "data".to_string()),
            ("query".to_string(), "query".to_string()),
        ];
        let plan = compose("analytics", &groups, 3, Some("analytics-metadata"));

        // 6 zookeeper + 1 db + 2 query-service + 3 per group.
        assert_eq!(plan.alarms.len(), 6 + 1 + 2 + groups.len() * 3);
        assert_eq!(plan.dashboard.widgets.len(), groups.len() * 5);
    }

    #[test]
    fn db_alarms_are_skipped_for_external_metadata_stores() {
        let plan = compose("analytics", &[], 1, None);
        assert!(plan.alarms.iter().all(|a| a.name != "metadata-db-cpu-utilisation-alarm"));
    }
}
