//! Template node description used by the autoscaler's scale-up simulation.

use crate::core::domain::model::vm_profile::VmProfile;
use std::collections::BTreeMap;

/// Pod capacity advertised for every template node.
pub const DEFAULT_MAX_PODS: i64 = 110;

pub const LABEL_ARCH: &str = "beta.kubernetes.io/arch";
pub const LABEL_OS: &str = "beta.kubernetes.io/os";
pub const LABEL_INSTANCE_TYPE: &str = "beta.kubernetes.io/instance-type";
pub const LABEL_ZONE_REGION: &str = "failure-domain.beta.kubernetes.io/region";
pub const LABEL_ZONE_FAILURE_DOMAIN: &str = "failure-domain.beta.kubernetes.io/zone";

const DEFAULT_ARCH: &str = "amd64";
const DEFAULT_OS: &str = "linux";

const BYTES_PER_MB: i64 = 1000 * 1000;
const BYTES_PER_GIB: i64 = 1024 * 1024 * 1024;

/// Resource quantities of a node, in base units.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeResources {
    pub pods: i64,
    /// Whole vCPUs.
    pub cpu: i64,
    /// Bytes.
    pub memory: i64,
    /// Bytes, absent when the group has no explicit root disk size.
    pub ephemeral_storage: Option<i64>,
}

/// An empty node as it would look right after joining the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeTemplate {
    pub name: String,
    pub self_link: String,
    pub labels: BTreeMap<String, String>,
    pub capacity: NodeResources,
    pub allocatable: NodeResources,
    pub ready: bool,
}

impl NodeTemplate {
    /// Builds the template node of `profile` under the given node name.
    pub fn build(name: String, profile: &VmProfile) -> Self {
        let offering = profile.offering();
        let root_disk_size = profile.root_disk_size();
        let capacity = NodeResources {
            pods: DEFAULT_MAX_PODS,
            cpu: i64::from(offering.cpunumber),
            // Offerings are sized in MB; the quantity is decimal.
            memory: i64::try_from(offering.memory)
                .unwrap_or(i64::MAX)
                .saturating_mul(BYTES_PER_MB),
            // A size that doesn't fit in bytes is treated as unset.
            ephemeral_storage: (root_disk_size > 0)
                .then(|| root_disk_size.checked_mul(BYTES_PER_GIB))
                .flatten(),
        };

        let mut labels: BTreeMap<String, String> = profile.labels().into_iter().collect();
        labels.extend(generic_labels(profile));

        Self {
            self_link: format!("/api/v1/nodes/{name}"),
            name,
            labels,
            allocatable: capacity.clone(),
            capacity,
            ready: true,
        }
    }
}

fn generic_labels(profile: &VmProfile) -> BTreeMap<String, String> {
    let offering_name = profile.offering().name.clone();
    let zone_name = profile.zone().name.clone();
    BTreeMap::from([
        (LABEL_ARCH.to_string(), DEFAULT_ARCH.to_string()),
        (LABEL_OS.to_string(), DEFAULT_OS.to_string()),
        (LABEL_INSTANCE_TYPE.to_string(), offering_name),
        (LABEL_ZONE_REGION.to_string(), zone_name.clone()),
        (LABEL_ZONE_FAILURE_DOMAIN.to_string(), zone_name),
    ])
}
