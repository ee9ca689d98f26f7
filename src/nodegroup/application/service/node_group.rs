//! A discovered node group and its reconciliation operations.

use crate::{
    core::{
        domain::{
            error::{AutoscalerError, AutoscalerResult},
            model::{
                node_template::NodeTemplate,
                virtual_machine::{Instance, VirtualMachine},
                vm_profile::{NODE_GROUP_VM_TAG, VmProfile},
            },
        },
        infrastructure::cloudstack_client::DiscoveryClient,
    },
    nodegroup::application::{
        request::list_requests::ListVirtualMachinesRequest,
        service::group_scaler::{GroupScaler, random_name},
    },
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Remote capabilities shared by every node group.
#[derive(Clone)]
pub struct GroupContext {
    discovery: Arc<dyn DiscoveryClient>,
    scaler: GroupScaler,
}

impl GroupContext {
    pub fn new(discovery: Arc<dyn DiscoveryClient>, scaler: GroupScaler) -> Self {
        Self { discovery, scaler }
    }

    pub fn discovery(&self) -> &dyn DiscoveryClient {
        self.discovery.as_ref()
    }
}

/// A cluster node handed in for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    pub name: String,
    /// External identity, i.e. the group's provider-id prefix plus the VM id.
    pub provider_id: String,
}

impl NodeRef {
    pub fn new(name: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider_id: provider_id.into(),
        }
    }
}

/// A group definition bound to its live instances.
///
/// The group has no explicit state: its size is the number of bound VMs.
/// Operations on the same group must not run concurrently.
pub struct NodeGroup {
    profile: VmProfile,
    vms: Vec<VirtualMachine>,
    ctx: GroupContext,
}

impl NodeGroup {
    pub fn new(profile: VmProfile, ctx: GroupContext) -> Self {
        Self {
            profile,
            vms: Vec::new(),
            ctx,
        }
    }

    /// Re-reads the bound instances and the offering/zone descriptors.
    pub async fn refresh(&mut self) -> AutoscalerResult<()> {
        let project_id = self.profile.project_id();
        let request = ListVirtualMachinesRequest {
            projectid: (!project_id.is_empty()).then_some(project_id),
            tags: BTreeMap::from([(NODE_GROUP_VM_TAG.to_string(), self.id().to_string())]),
        };
        let vms = self.ctx.discovery.list_virtual_machines(&request).await?;

        let asp = self.profile.asp();
        let offering = self
            .ctx
            .discovery
            .get_service_offering_by_id(&asp.serviceofferingid)
            .await?;
        let zone = self.ctx.discovery.get_zone_by_id(&asp.zoneid).await?;

        debug!(group = self.id(), vms = vms.len(), "refreshed node group");
        self.vms = vms;
        self.profile.offering = offering;
        self.profile.zone = zone;
        Ok(())
    }

    /// The node group name.
    pub fn id(&self) -> &str {
        self.profile.id()
    }

    pub fn profile(&self) -> &VmProfile {
        &self.profile
    }

    pub fn vms(&self) -> &[VirtualMachine] {
        &self.vms
    }

    pub fn min_size(&self) -> usize {
        self.profile.min_size()
    }

    pub fn max_size(&self) -> usize {
        self.profile.max_size()
    }

    pub fn current_size(&self) -> usize {
        self.vms.len()
    }

    /// Returns the group size, first growing the group up to its minimum.
    ///
    /// A failing scale-up is logged and the size actually reached is returned.
    pub async fn target_size(&mut self) -> AutoscalerResult<usize> {
        let current = self.current_size();
        let min = self.min_size();
        if current < min {
            if let Err(e) = self.scale_up(min - current).await {
                error!(group = self.id(), error = %e, "failed to scale-up group to min-size");
            }
        }
        Ok(self.current_size())
    }

    /// Adds `delta` instances, within the group's maximum.
    pub async fn increase_size(&mut self, delta: i64) -> AutoscalerResult<()> {
        if delta <= 0 {
            return Err(AutoscalerError::InvalidDelta(delta));
        }
        let delta = usize::try_from(delta).map_err(|_| AutoscalerError::InvalidDelta(delta))?;
        let current = self.target_size().await?;
        let desired = current.saturating_add(delta);
        if desired > self.max_size() {
            return Err(AutoscalerError::SizeIncreaseTooLarge {
                current,
                desired,
                max: self.max_size(),
            });
        }
        self.scale_up(delta).await
    }

    /// Never shrinks the group; only [`delete_nodes`](Self::delete_nodes)
    /// removes capacity.
    pub async fn decrease_target_size(&mut self, _delta: i64) -> AutoscalerResult<()> {
        Ok(())
    }

    /// Destroys the instances behind `nodes` and unbinds them.
    ///
    /// Stops at the first node that is not part of the group.
    pub async fn delete_nodes(&mut self, nodes: &[NodeRef]) -> AutoscalerResult<()> {
        for node in nodes {
            let index = self.vm_index(node)?;
            let vm_id = self.vms[index].id.clone();
            self.ctx.scaler.provisioner().destroy(&vm_id).await?;
            self.vms.swap_remove(index);
        }
        Ok(())
    }

    /// The bound instances as external ids with their abstract status.
    pub fn nodes(&self) -> Vec<Instance> {
        self.vms
            .iter()
            .map(|vm| Instance {
                id: self.provider_id(&vm.id),
                status: vm.status(),
            })
            .collect()
    }

    /// Describes an empty node of this group under a fresh random name.
    pub fn template_node(&self) -> NodeTemplate {
        let name = random_name(self.id(), &mut rand::thread_rng());
        NodeTemplate::build(name, &self.profile)
    }

    /// Returns `true` if an instance with this external id is bound here.
    pub fn has_node(&self, provider_id: &str) -> bool {
        self.vms.iter().any(|vm| self.provider_id(&vm.id) == provider_id)
    }

    pub fn provider_id(&self, vm_id: &str) -> String {
        format!("{}{}", self.profile.provider_id_prefix(), vm_id)
    }

    pub fn debug(&self) -> String {
        format!("vmProfile: {:?}", self.profile)
    }

    pub fn exist(&self) -> bool {
        true
    }

    pub fn autoprovisioned(&self) -> bool {
        false
    }

    pub fn create(&self) -> AutoscalerResult<NodeGroup> {
        Err(AutoscalerError::NotImplemented)
    }

    pub fn delete(&self) -> AutoscalerResult<()> {
        Err(AutoscalerError::NotImplemented)
    }

    /// Scales up and re-binds the instances, even after a partial failure so
    /// that the instances which did come up are tracked.
    async fn scale_up(&mut self, count: usize) -> AutoscalerResult<()> {
        let scaled = self.ctx.scaler.scale_up(&self.profile, count).await;
        let refreshed = self.refresh().await;
        scaled?;
        refreshed
    }

    fn vm_index(&self, node: &NodeRef) -> AutoscalerResult<usize> {
        let prefix = self.profile.provider_id_prefix();
        let vm_id = node
            .provider_id
            .strip_prefix(prefix)
            .unwrap_or(&node.provider_id);
        self.vms
            .iter()
            .position(|vm| vm.id == vm_id)
            .ok_or_else(|| AutoscalerError::NodeNotFound {
                node: node.name.clone(),
                provider_id: node.provider_id.clone(),
                group: self.id().to_string(),
            })
    }
}

impl std::fmt::Debug for NodeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeGroup")
            .field("profile", &self.profile)
            .field("vms", &self.vms)
            .finish_non_exhaustive()
    }
}
