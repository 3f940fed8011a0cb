//! Termination lifecycle hooks.

use serde::{Deserialize, Serialize};
use tracing::warn;

use quarry_core::CustomLifecycleHookParams;
use quarry_core::constants::INSTANCE_TERMINATION_TIMEOUT_SECS;

/// Outcome applied when the hook's heartbeat expires before completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HookResult {
    /// Fail open: a stuck shutdown script must not block scale-in.
    #[default]
    Continue,
    Abandon,
}

/// A hook holding instance termination until the shutdown automation
/// completes (or the heartbeat expires).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminationHook {
    pub group_id: String,
    pub heartbeat_timeout_secs: u64,
    pub default_result: HookResult,
}

impl TerminationHook {
    pub fn name(&self) -> String {
        format!("{}-termination-hook", self.group_id)
    }
}

/// Build the termination hook for one group, applying per-tier overrides
/// where the operator supplied them.
pub fn termination_hook(
    group_id: &str,
    overrides: Option<&CustomLifecycleHookParams>,
) -> TerminationHook {
    let heartbeat_timeout_secs = overrides
        .and_then(|o| o.heartbeat_timeout)
        .unwrap_or(INSTANCE_TERMINATION_TIMEOUT_SECS);
    let default_result = match overrides.and_then(|o| o.default_result.as_deref()) {
        None => HookResult::Continue,
        Some("ABANDON") => HookResult::Abandon,
        Some("CONTINUE") => HookResult::Continue,
        Some(other) => {
            warn!(group_id, value = other, "unrecognized hook result, defaulting to CONTINUE");
            HookResult::Continue
        }
    };

    TerminationHook {
        group_id: group_id.to_string(),
        heartbeat_timeout_secs,
        default_result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fail_open() {
        let hook = termination_hook("data_hot", None);
        assert_eq!(hook.heartbeat_timeout_secs, 5400);
        assert_eq!(hook.default_result, HookResult::Continue);
        assert_eq!(hook.name(), "data_hot-termination-hook");
    }

    #[test]
    fn per_tier_overrides_apply() {
        let params = CustomLifecycleHookParams {
            default_result: Some("ABANDON".to_string()),
            heartbeat_timeout: Some(600),
        };
        let hook = termination_hook("query", Some(&params));
        assert_eq!(hook.heartbeat_timeout_secs, 600);
        assert_eq!(hook.default_result, HookResult::Abandon);
    }

    #[test]
    fn unknown_result_falls_back_to_continue() {
        let params = CustomLifecycleHookParams {
            default_result: Some("EXPLODE".to_string()),
            heartbeat_timeout: None,
        };
        assert_eq!(
            termination_hook("query", Some(&params)).default_result,
            HookResult::Continue
        );
    }
}
