//! The node group definition: an autoscale VM profile plus its metadata.

use crate::core::domain::model::{
    autoscale_profile::AutoScaleVmProfile,
    catalog::{ServiceOffering, Zone},
};
use std::collections::HashMap;

pub(crate) const METADATA_NAME: &str = "nodeGroupName";
pub(crate) const METADATA_MIN: &str = "minNodes";
pub(crate) const METADATA_MAX: &str = "maxNodes";
pub(crate) const METADATA_USERDATA: &str = "userdata";
pub(crate) const METADATA_PROVIDER_ID_PREFIX: &str = "providerIDPrefix";

const METADATA_NODE_LABEL_PREFIX: &str = "label-";
const METADATA_VM_TAG_PREFIX: &str = "tag-";

/// Metadata keys a profile must carry to be considered a node group.
pub(crate) const REQUIRED_METADATA: [&str; 3] = [METADATA_NAME, METADATA_MIN, METADATA_MAX];

/// Tag key binding an instance to its node group.
pub const NODE_GROUP_VM_TAG: &str = METADATA_NAME;

/// A node group definition.
///
/// Wraps the CloudStack autoscale VM profile together with the resource
/// details attached to it and the offering/zone descriptors resolved during
/// discovery. Size bounds, tags, labels and the userdata payload are all read
/// from the metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VmProfile {
    pub(crate) asp: AutoScaleVmProfile,
    pub(crate) metadata: HashMap<String, String>,
    pub(crate) offering: ServiceOffering,
    pub(crate) zone: Zone,
}

impl VmProfile {
    pub fn new(asp: AutoScaleVmProfile, metadata: HashMap<String, String>) -> Self {
        Self {
            asp,
            metadata,
            ..Default::default()
        }
    }

    /// The node group name.
    pub fn id(&self) -> &str {
        self.metadata
            .get(METADATA_NAME)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn asp(&self) -> &AutoScaleVmProfile {
        &self.asp
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn offering(&self) -> &ServiceOffering {
        &self.offering
    }

    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Returns `true` when every required metadata key is present.
    pub fn has_required_metadata(&self) -> bool {
        REQUIRED_METADATA
            .iter()
            .all(|key| self.metadata.contains_key(*key))
    }

    pub fn min_size(&self) -> usize {
        self.size_metadata(METADATA_MIN)
    }

    pub fn max_size(&self) -> usize {
        self.size_metadata(METADATA_MAX)
    }

    fn size_metadata(&self, key: &str) -> usize {
        self.metadata
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// The cloud-init payload, if configured.
    pub fn userdata(&self) -> Option<&str> {
        self.metadata.get(METADATA_USERDATA).map(String::as_str)
    }

    /// Prefix prepended to VM ids to build Kubernetes provider ids.
    pub fn provider_id_prefix(&self) -> &str {
        self.metadata
            .get(METADATA_PROVIDER_ID_PREFIX)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// The project the group lives in, or `""` for the root scope.
    ///
    /// Some CloudStack distributions refuse to create an autoscale profile
    /// inside a project, so `projectid` is also read from the extra deploy
    /// params.
    pub fn project_id(&self) -> String {
        match self.asp.projectid.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.other_param("projectid").unwrap_or_default(),
        }
    }

    /// Root disk size in GB, `0` when unset or unparsable.
    pub fn root_disk_size(&self) -> i64 {
        self.other_param("rootdisksize")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Custom tags to attach to created instances (`tag-` metadata).
    pub fn tags(&self) -> HashMap<String, String> {
        self.prefixed(METADATA_VM_TAG_PREFIX)
    }

    /// Labels expected on the group's nodes (`label-` metadata).
    pub fn labels(&self) -> HashMap<String, String> {
        self.prefixed(METADATA_NODE_LABEL_PREFIX)
    }

    /// Decoded `otherdeployparams` pairs, in declaration order.
    pub fn other_deploy_params(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.asp.otherdeployparams.as_bytes())
            .into_owned()
            .collect()
    }

    fn other_param(&self, key: &str) -> Option<String> {
        self.other_deploy_params()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    fn prefixed(&self, prefix: &str) -> HashMap<String, String> {
        self.metadata
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .map(|stripped| (stripped.to_string(), value.clone()))
            })
            .collect()
    }
}
