//! Per-availability-zone splitting for the container platform.
//!
//! Zone-aware storage requires one node group per zone with identical
//! capacity. A tier whose node count does not divide evenly across the
//! zones fails the whole plan before anything is declared.

use crate::error::{PlanError, PlanResult};

/// One per-zone slice of a tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzSlice {
    pub az_index: u32,
    pub min_nodes: u32,
    pub max_nodes: u32,
}

/// Split `min_nodes`/`max_nodes` evenly over `az_count` zones.
pub fn split_across_azs(
    group: &str,
    min_nodes: u32,
    max_nodes: u32,
    az_count: u32,
) -> PlanResult<Vec<AzSlice>> {
    if az_count == 0 || min_nodes % az_count != 0 {
        return Err(PlanError::UnevenAzDistribution {
            group: group.to_string(),
            min_nodes,
            az_count,
        });
    }

    let min_per_az = min_nodes / az_count;
    let max_per_az = max_nodes.div_ceil(az_count);
    Ok((0..az_count)
        .map(|az_index| AzSlice {
            az_index,
            min_nodes: min_per_az,
            max_nodes: max_per_az.max(min_per_az),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_across_three_zones() {
        let slices = split_across_azs("data_hot", 6, 9, 3).unwrap();
        assert_eq!(slices.len(), 3);
        assert!(slices.iter().all(|s| s.min_nodes == 2 && s.max_nodes == 3));
        assert_eq!(slices[2].az_index, 2);
    }

    #[test]
    fn uneven_split_fails_before_declaration() {
        assert!(matches!(
            split_across_azs("data_hot", 4, 4, 3),
            Err(PlanError::UnevenAzDistribution {
                min_nodes: 4,
                az_count: 3,
                ..
            })
        ));
    }

    #[test]
    fn zero_zones_is_rejected() {
        assert!(split_across_azs("data", 3, 3, 0).is_err());
    }
}
