//! Tuning values derived from instance sizing.

use quarry_core::NodeRole;

use crate::InstanceTypeInfo;

/// Number of merge buffers for query processing: `max(2, ceil(cpu / 4))`.
pub fn merge_buffer_count(info: &InstanceTypeInfo) -> u32 {
    2.max(info.cpu.div_ceil(4))
}

/// Segment load-queue batch size on the coordinator: `ceil(cpu / 4)`.
pub fn load_queue_batch_size(info: &InstanceTypeInfo) -> u32 {
    info.cpu.div_ceil(4)
}

/// HTTP connection budget for a node group.
///
/// Query nodes split the cluster-wide concurrent query limit across the
/// group's minimum node count; every other role gets the flat limit.
pub fn http_connection_count(role: NodeRole, concurrent_query_limit: u32, min_nodes: u32) -> u32 {
    if role == NodeRole::Query {
        concurrent_query_limit.div_ceil(min_nodes.max(1))
    } else {
        concurrent_query_limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CpuArch;

    fn info(cpu: u32) -> InstanceTypeInfo {
        InstanceTypeInfo {
            cpu,
            memory_mib: 8192,
            arch: CpuArch::Amd64,
        }
    }

    #[test]
    fn merge_buffers_floor_at_two() {
        assert_eq!(merge_buffer_count(&info(2)), 2);
        assert_eq!(merge_buffer_count(&info(4)), 2);
        assert_eq!(merge_buffer_count(&info(16)), 4);
        assert_eq!(merge_buffer_count(&info(17)), 5);
    }

    #[test]
    fn query_nodes_split_the_connection_budget() {
        assert_eq!(http_connection_count(NodeRole::Query, 100, 3), 34);
        assert_eq!(http_connection_count(NodeRole::Query, 100, 0), 100);
        assert_eq!(http_connection_count(NodeRole::Data, 100, 3), 100);
    }

    #[test]
    fn load_queue_batch_scales_with_cpu() {
        assert_eq!(load_queue_batch_size(&info(8)), 2);
        assert_eq!(load_queue_batch_size(&info(9)), 3);
    }
}
