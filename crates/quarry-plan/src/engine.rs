//! Provisioning-engine seam.
//!
//! The planner only builds the graph; materializing it is somebody else's
//! problem. Engines plug in behind this trait, and everything past it —
//! state diffing, rollout, rollback — is out of scope here.

use crate::graph::ResourceGraph;

pub trait ProvisioningEngine {
    type Error;

    /// Hand the declared graph to the engine.
    fn declare(&mut self, graph: &ResourceGraph) -> Result<(), Self::Error>;

    /// Tear the materialized graph down, honoring the graph's retention
    /// policy for durable resources.
    fn teardown(&mut self, graph: &ResourceGraph) -> Result<(), Self::Error>;
}
