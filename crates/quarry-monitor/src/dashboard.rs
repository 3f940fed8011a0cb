//! Operations-dashboard composition: one widget block per node tier.

use serde::{Deserialize, Serialize};

use crate::metrics::{MetricQuery, compute_metric, disk_usage_metric, memory_usage_metric};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Widget {
    Text {
        markdown: String,
    },
    Graph {
        title: String,
        metrics: Vec<MetricQuery>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub name: String,
    pub widgets: Vec<Widget>,
}

/// Widget block for one node group: header, CPU, network, memory, disk.
pub fn group_widgets(tier_name: &str, group_id: &str) -> Vec<Widget> {
    vec![
        Widget::Text {
            markdown: format!("### {tier_name} - {group_id} - Key Performance Indicators"),
        },
        Widget::Graph {
            title: "CPU Utilization (%)".to_string(),
            metrics: vec![compute_metric(group_id, "CPUUtilization")],
        },
        Widget::Graph {
            title: "Network In/Out (bytes)".to_string(),
            metrics: vec![
                compute_metric(group_id, "NetworkIn"),
                compute_metric(group_id, "NetworkOut"),
            ],
        },
        Widget::Graph {
            title: "Memory Utilisation (%)".to_string(),
            metrics: vec![memory_usage_metric(group_id)],
        },
        Widget::Graph {
            title: "Disk Utilisation (%)".to_string(),
            metrics: vec![disk_usage_metric(group_id)],
        },
    ]
}

/// Compose the full dashboard from `(tier name, group id)` pairs in
/// declaration order.
pub fn dashboard(cluster_name: &str, groups: &[(String, String)]) -> Dashboard {
    let widgets = groups
        .iter()
        .flat_map(|(tier_name, group_id)| group_widgets(tier_name, group_id))
        .collect();
    Dashboard {
        name: format!("{cluster_name}-operations"),
        widgets,
    }
}
