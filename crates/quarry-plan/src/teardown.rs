//! Best-effort cleanup of records left behind by external controllers.
//!
//! Load-balancer and DNS records created outside the plan can outlive it
//! and block teardown of the surrounding network. Cleanup here is strictly
//! best-effort: a failed deletion is logged and reported, never propagated
//! as an error that would wedge the teardown.

use tracing::{info, warn};

/// Kind of externally-created record to sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DanglingRecordKind {
    LoadBalancer,
    DnsRecord,
}

/// One record discovered during the sweep.
#[derive(Debug, Clone)]
pub struct DanglingRecord {
    pub kind: DanglingRecordKind,
    pub id: String,
}

/// A cleanup that did not succeed. Carried back to the caller for logging
/// only; teardown continues regardless.
#[derive(Debug, Clone)]
pub struct LoggedFailure {
    pub record: DanglingRecord,
    pub reason: String,
}

/// Delete every discovered record through `delete`, collecting failures
/// instead of stopping at the first one.
pub fn sweep_dangling_records<F>(records: &[DanglingRecord], mut delete: F) -> Vec<LoggedFailure>
where
    F: FnMut(&DanglingRecord) -> Result<(), String>,
{
    let mut failures = Vec::new();
    for record in records {
        match delete(record) {
            Ok(()) => info!(id = %record.id, kind = ?record.kind, "removed dangling record"),
            Err(reason) => {
                warn!(id = %record.id, kind = ?record.kind, %reason, "failed to remove dangling record");
                failures.push(LoggedFailure {
                    record: record.clone(),
                    reason,
                });
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<DanglingRecord> {
        vec![
            DanglingRecord {
                kind: DanglingRecordKind::LoadBalancer,
                id: "alb-1".to_string(),
            },
            DanglingRecord {
                kind: DanglingRecordKind::DnsRecord,
                id: "druid.example.com".to_string(),
            },
        ]
    }

    #[test]
    fn one_failure_does_not_stop_the_sweep() {
        let mut deleted = Vec::new();
        let failures = sweep_dangling_records(&records(), |record| {
            if record.kind == DanglingRecordKind::LoadBalancer {
                Err("still in use".to_string())
            } else {
                deleted.push(record.id.clone());
                Ok(())
            }
        });

        assert_eq!(deleted, ["druid.example.com"]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].record.id, "alb-1");
        assert_eq!(failures[0].reason, "still in use");
    }

    #[test]
    fn clean_sweep_reports_nothing() {
        assert!(sweep_dangling_records(&records(), |_| Ok(())).is_empty());
    }
}
