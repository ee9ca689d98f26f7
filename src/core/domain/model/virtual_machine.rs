//! Domain models for CloudStack user VMs.
//!
//! This module defines the VM handle returned by `listVirtualMachines` and the
//! abstract instance status reported to the autoscaler.

use serde::{Deserialize, Serialize};

/// A virtual machine as returned by the `listVirtualMachines` command.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct VirtualMachine {
    /// The VM identifier (UUID).
    pub id: String,
    /// Host name of the VM.
    #[serde(default)]
    pub name: String,
    /// User-facing display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displayname: Option<String>,
    /// Lifecycle state (e.g., "Running", "Stopped").
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoneid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projectid: Option<String>,
    /// Resource tags attached to the VM.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<ResourceTag>,
}

/// A key/value tag attached to a CloudStack resource.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ResourceTag {
    pub key: String,
    pub value: String,
}

impl VirtualMachine {
    /// Maps the CloudStack state onto the abstract instance status.
    pub fn status(&self) -> InstanceStatus {
        InstanceStatus::from_cloudstack_state(&self.state)
    }
}

/// Abstract lifecycle status of an instance, as reported to the autoscaler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceStatus {
    Creating,
    Running,
    Deleting,
    /// The VM is in a state the autoscaler does not know how to handle.
    Error { message: String },
}

impl InstanceStatus {
    /// Maps a CloudStack `VirtualMachine.State` label onto an abstract status.
    ///
    /// The known labels are the ones listed in CloudStack's
    /// `com.cloud.vm.VirtualMachine.State` enum.
    pub fn from_cloudstack_state(state: &str) -> Self {
        match state {
            "Starting" | "Migrating" => InstanceStatus::Creating,
            "Running" => InstanceStatus::Running,
            "Stopping" | "Stopped" | "Destroyed" | "Expunging" | "Shutdowned" => {
                InstanceStatus::Deleting
            }
            other => InstanceStatus::Error {
                message: format!("unexpected vm state: {other}"),
            },
        }
    }
}

/// An instance as exposed to the autoscaler: external id plus status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Provider id, i.e. the group's provider-id prefix followed by the VM id.
    pub id: String,
    pub status: InstanceStatus,
}
