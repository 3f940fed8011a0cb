//! Instance-descriptor catalog and sizing-derived tuning values.
//!
//! Resolves abstract hardware descriptors (`r5.2xlarge`) into concrete
//! attribute tuples from a static embedded catalog. An unknown descriptor
//! is a hard failure — every derived tuning value depends on it, so there
//! is nothing sensible to fall back to.

pub mod tuning;

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown instance type: {0}")]
    UnknownInstanceType(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// CPU architecture of an instance family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuArch {
    Arm64,
    Amd64,
}

impl CpuArch {
    pub fn as_str(&self) -> &'static str {
        match self {
            CpuArch::Arm64 => "arm64",
            CpuArch::Amd64 => "amd64",
        }
    }
}

/// Concrete attributes for one instance descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceTypeInfo {
    pub cpu: u32,
    pub memory_mib: u64,
    pub arch: CpuArch,
}

static CATALOG: LazyLock<HashMap<String, InstanceTypeInfo>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("../catalog.json")).expect("embedded instance catalog")
});

/// Look up the attribute tuple for an instance descriptor.
pub fn instance_type_info(descriptor: &str) -> CatalogResult<InstanceTypeInfo> {
    CATALOG
        .get(descriptor)
        .copied()
        .ok_or_else(|| CatalogError::UnknownInstanceType(descriptor.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_descriptor() {
        let info = instance_type_info("r5.2xlarge").unwrap();
        assert_eq!(info.cpu, 8);
        assert_eq!(info.memory_mib, 65536);
        assert_eq!(info.arch, CpuArch::Amd64);
    }

    #[test]
    fn graviton_families_are_arm() {
        assert_eq!(instance_type_info("m6g.xlarge").unwrap().arch, CpuArch::Arm64);
    }

    #[test]
    fn unknown_descriptor_is_a_hard_failure() {
        assert!(matches!(
            instance_type_info("z9.mega"),
            Err(CatalogError::UnknownInstanceType(_))
        ));
    }
}
