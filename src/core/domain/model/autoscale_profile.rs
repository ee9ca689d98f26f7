//! Domain models for CloudStack autoscale VM profiles.
//!
//! An autoscale VM profile carries the deployment template of a node group
//! (template, offering, zone, extra deploy params). The node group settings
//! themselves live in the profile's resource details.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A profile as returned by the `listAutoScaleVmProfiles` command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct AutoScaleVmProfile {
    /// The profile identifier.
    pub id: String,
    /// Template used to deploy instances.
    #[serde(default)]
    pub templateid: String,
    /// Service offering (size) used to deploy instances.
    #[serde(default)]
    pub serviceofferingid: String,
    /// Zone where instances are deployed.
    #[serde(default)]
    pub zoneid: String,
    /// Owning project, when the profile was created inside one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projectid: Option<String>,
    /// Extra deploy parameters, url-encoded (e.g. `networkids=a,b&rootdisksize=20`).
    #[serde(default)]
    pub otherdeployparams: String,
}

/// A single resource detail (metadata entry).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ResourceDetail {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Folds a list of resource details into a key/value map. Later keys win.
pub fn details_to_metadata(details: &[ResourceDetail]) -> HashMap<String, String> {
    details
        .iter()
        .map(|d| (d.key.clone(), d.value.clone()))
        .collect()
}
