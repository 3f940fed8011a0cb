//! Quarry plan — the declaration pass.
//!
//! Takes a validated [`quarry_core::ClusterConfig`] and produces a
//! [`ResourceGraph`]: every node group with its rendered bootstrap script,
//! plus the dependency edges fixing the order groups come up in. The graph
//! is handed to a [`ProvisioningEngine`] for materialization; this crate
//! never talks to a cloud itself.

pub mod annotate;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod graph;
pub mod node_groups;
pub mod planner;
pub mod teardown;

pub use annotate::annotate;
pub use engine::ProvisioningEngine;
pub use ensemble::{EnsemblePlan, plan_ensemble};
pub use error::{PlanError, PlanResult};
pub use graph::{
    GroupState, NetworkInterface, ResourceGraph, ResourceGroup, RetentionPolicy, RollingUpdate,
    StorageVolumes,
};
pub use node_groups::{AzSlice, split_across_azs};
pub use planner::plan;
pub use teardown::{DanglingRecord, DanglingRecordKind, LoggedFailure, sweep_dangling_records};
