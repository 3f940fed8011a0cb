//! Final tag pass over a declared graph.
//!
//! Pure: takes the graph by value, returns it with cluster-wide tags folded
//! into every group. Group-specific tags set during planning win over the
//! cluster-wide ones.

use quarry_core::ClusterConfig;

use crate::graph::ResourceGraph;

pub fn annotate(mut graph: ResourceGraph, config: &ClusterConfig) -> ResourceGraph {
    for group in graph.groups_mut() {
        let mut tags = std::collections::BTreeMap::new();
        tags.insert(
            "Name".to_string(),
            format!("{}_{}", config.cluster_name, group.id),
        );
        tags.insert("Tier".to_string(), group.tier.clone());
        tags.insert(
            "quarry:cluster".to_string(),
            config.cluster_name.clone(),
        );

        for source in [&config.tags, &config.additional_tags] {
            if let Some(user_tags) = source {
                for (key, value) in user_tags {
                    tags.insert(key.clone(), value.clone());
                }
            }
        }

        // Planner-set tags (ensemble member ids) take precedence.
        for (key, value) in std::mem::take(&mut group.tags) {
            tags.insert(key, value);
        }
        group.tags = tags;
    }
    graph
}
