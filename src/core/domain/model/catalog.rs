//! Domain models for the CloudStack catalog: projects, service offerings and zones.

use serde::{Deserialize, Serialize};

/// A project as returned by `listProjects`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A service offering as returned by `listServiceOfferings`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ServiceOffering {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Number of vCPUs.
    #[serde(default)]
    pub cpunumber: u32,
    /// CPU speed in MHz.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpuspeed: Option<u32>,
    /// Memory in MB.
    #[serde(default)]
    pub memory: u64,
}

/// A zone as returned by `listZones`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Zone {
    pub id: String,
    #[serde(default)]
    pub name: String,
}
