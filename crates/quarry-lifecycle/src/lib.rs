//! Quarry lifecycle — graceful scale-in for autoscaled node groups.
//!
//! Each group gets a termination lifecycle hook, a shutdown automation
//! document and an event rule wiring the two together. The combination
//! drains a node before the platform reclaims it, and fails open when the
//! drain takes longer than the hook's heartbeat.

pub mod automation;
pub mod hook;

pub use automation::{
    AutomationContext, AutomationDocument, TerminationEventRule, shutdown_document,
    termination_event_rule,
};
pub use hook::{HookResult, TerminationHook, termination_hook};

use serde::{Deserialize, Serialize};

use quarry_core::{NodeGroupConfig, NodeRole, service_name};

/// Everything lifecycle-related for one node group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupLifecycle {
    pub hook: TerminationHook,
    pub document: AutomationDocument,
    pub event_rule: TerminationEventRule,
}

/// Compose hook, document and event rule for a planned group.
pub fn attach(
    cluster_name: &str,
    group_id: &str,
    role: NodeRole,
    tier: &str,
    group: &NodeGroupConfig,
    ctx: &AutomationContext,
) -> GroupLifecycle {
    let hook_params = group
        .auto_scaling_policy
        .as_ref()
        .and_then(|p| p.custom_lifecycle_hook_params.as_ref());
    let hook = termination_hook(group_id, hook_params);

    let service = service_name(cluster_name, role, Some(tier));
    let ctx = AutomationContext {
        execution_timeout_secs: hook.heartbeat_timeout_secs,
        ..ctx.clone()
    };
    let document = shutdown_document(&service, role, &ctx);
    let event_rule = termination_event_rule(&service, group_id, &document);

    GroupLifecycle {
        hook,
        document,
        event_rule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::{AutoScalingPolicy, CustomLifecycleHookParams};

    #[test]
    fn attach_composes_all_three_pieces() {
        let group = NodeGroupConfig {
            min_nodes: 2,
            instance_type: "r5.2xlarge".to_string(),
            ..Default::default()
        };
        let ctx = AutomationContext {
            region: "us-east-1".to_string(),
            installation_bucket: "quarry-install".to_string(),
            system_user_secret_arn: "arn:secret".to_string(),
            graceful_termination_flag: "/quarry/flag".to_string(),
            execution_timeout_secs: 0,
        };

        let lifecycle = attach("analytics", "data_hot", NodeRole::Data, "hot", &group, &ctx);
        assert_eq!(lifecycle.hook.group_id, "data_hot");
        assert_eq!(lifecycle.document.name, "analytics_data_hot-host-termination");
        assert_eq!(lifecycle.event_rule.group_id, "data_hot");
    }

    #[test]
    fn hook_timeout_bounds_the_automation() {
        let group = NodeGroupConfig {
            min_nodes: 2,
            instance_type: "r5.2xlarge".to_string(),
            auto_scaling_policy: Some(AutoScalingPolicy {
                custom_lifecycle_hook_params: Some(CustomLifecycleHookParams {
                    default_result: None,
                    heartbeat_timeout: Some(900),
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let ctx = AutomationContext {
            region: "us-east-1".to_string(),
            installation_bucket: "b".to_string(),
            system_user_secret_arn: "arn".to_string(),
            graceful_termination_flag: "flag".to_string(),
            execution_timeout_secs: 0,
        };

        let lifecycle = attach("analytics", "data", NodeRole::Data, "hot", &group, &ctx);
        assert_eq!(lifecycle.hook.heartbeat_timeout_secs, 900);
        assert_eq!(
            lifecycle.document.content["mainSteps"][0]["inputs"]["executionTimeout"],
            "900"
        );
    }
}
