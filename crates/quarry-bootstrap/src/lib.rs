//! Bootstrap generation — per-node startup scripts from templates.
//!
//! Each node role has a checked-in startup template with `{{KEY}}`
//! placeholders. Variables are assembled by merging static role defaults,
//! sizing-derived values, user overrides and identifiers resolved from
//! already-planned resources, later entries winning on conflict.

pub mod properties;
pub mod render;
pub mod variables;

use thiserror::Error;

pub use properties::{
    RuntimeProperty, default_properties, format_properties, merge_runtime_properties,
    merged_properties,
};
pub use render::render;
pub use variables::{ResolvedEndpoints, bootstrap_variables, role_script, zookeeper_variables};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Catalog(#[from] quarry_catalog::CatalogError),
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;
