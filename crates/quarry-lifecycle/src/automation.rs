//! Shutdown automation document and the event rule that triggers it.
//!
//! When a group scales in, the platform fires a termination event. The
//! event rule maps it onto the automation document, which runs the node's
//! shutdown script remotely and then signals the lifecycle hook to let the
//! instance go.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use quarry_core::NodeRole;

/// Inputs resolved before the document is composed.
#[derive(Debug, Clone)]
pub struct AutomationContext {
    pub region: String,
    pub installation_bucket: String,
    pub system_user_secret_arn: String,
    pub graceful_termination_flag: String,
    pub execution_timeout_secs: u64,
}

/// A composed automation document, ready to serialize for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationDocument {
    pub name: String,
    pub content: Value,
}

/// Compose the graceful-shutdown document for one node group.
///
/// Two steps: run the shutdown script on the terminating instance (copied
/// fresh from the installation bucket, executed with elevated privilege so
/// it can stop supervised processes), then signal `CONTINUE` back to the
/// lifecycle hook.
pub fn shutdown_document(
    service_name: &str,
    role: NodeRole,
    ctx: &AutomationContext,
) -> AutomationDocument {
    let commands = [
        format!("export AWS_DEFAULT_REGION={}", ctx.region),
        format!(
            "sudo -u druid -E aws s3 cp s3://{}/scripts/terminate_node.sh /home/druid/scripts/",
            ctx.installation_bucket
        ),
        format!(
            "sudo -u root -E bash /home/druid/scripts/terminate_node.sh {} {} {} | tee /home/druid/log/shutdown_automation.log",
            role.as_str(),
            ctx.system_user_secret_arn,
            ctx.graceful_termination_flag
        ),
    ];

    let content = json!({
        "schemaVersion": "0.3",
        "description": "Executes the steps required for graceful instance termination",
        "parameters": {
            "GroupName": { "type": "String", "description": "Node group name" },
            "InstanceId": { "type": "String", "description": "Instance id" },
            "HookName": { "type": "String", "description": "Lifecycle hook name" }
        },
        "mainSteps": [
            {
                "name": "runTerminationScript",
                "action": "runShellScript",
                "inputs": {
                    "instanceIds": ["{{ InstanceId }}"],
                    "commands": commands,
                    "executionTimeout": ctx.execution_timeout_secs.to_string()
                }
            },
            {
                "name": "completeTermination",
                "action": "completeLifecycleAction",
                "inputs": {
                    "hookName": "{{ HookName }}",
                    "instanceId": "{{ InstanceId }}",
                    "groupName": "{{ GroupName }}",
                    "result": "CONTINUE"
                }
            }
        ]
    });

    AutomationDocument {
        name: format!("{service_name}-host-termination"),
        content,
    }
}

/// Event rule scoped to one group, forwarding the termination event's
/// fields into the automation document's parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminationEventRule {
    pub name: String,
    pub group_id: String,
    pub document_name: String,
    pub input_paths: Value,
    pub input_template: String,
}

pub fn termination_event_rule(
    service_name: &str,
    group_id: &str,
    document: &AutomationDocument,
) -> TerminationEventRule {
    TerminationEventRule {
        name: format!("{service_name}-termination-events"),
        group_id: group_id.to_string(),
        document_name: document.name.clone(),
        input_paths: json!({
            "groupname": "$.detail.GroupName",
            "instanceid": "$.detail.InstanceId",
            "hookname": "$.detail.LifecycleHookName"
        }),
        input_template:
            r#"{"InstanceId":[<instanceid>],"GroupName":[<groupname>],"HookName":[<hookname>]}"#
                .to_string(),
    }
}
