use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no hosting configuration for the selected platform")]
    MissingHosting,

    #[error(
        "node group {group}: {min_nodes} nodes cannot be spread evenly over {az_count} availability zones"
    )]
    UnevenAzDistribution {
        group: String,
        min_nodes: u32,
        az_count: u32,
    },

    #[error("no coordination-service group declared in the hosting configuration")]
    MissingEnsembleGroup,

    #[error("unknown resource group: {0}")]
    UnknownGroup(String),

    #[error(transparent)]
    Bootstrap(#[from] quarry_bootstrap::BootstrapError),
}

pub type PlanResult<T> = Result<T, PlanError>;
