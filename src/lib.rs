//! Node group engine for CloudStack-backed cluster autoscaling.
//!
//! Node groups are defined through CloudStack autoscale VM profiles whose
//! resource details carry the group settings (`nodeGroupName`, `minNodes`,
//! `maxNodes`, ...). The provider discovers them in the root scope and,
//! optionally, in every project, binds each one to the VMs tagged as its
//! members, and grows or shrinks groups on request.

mod core;
mod nodegroup;

#[cfg(test)]
mod tests;

pub use crate::core::domain::error::{
    AutoscalerError, AutoscalerResult, DeployFailure, ValidationError,
};
pub use crate::core::domain::model::{
    autoscale_profile::{AutoScaleVmProfile, ResourceDetail},
    catalog::{Project, ServiceOffering, Zone},
    node_template::{NodeResources, NodeTemplate},
    virtual_machine::{Instance, InstanceStatus, ResourceTag, VirtualMachine},
    vm_profile::VmProfile,
};
pub use crate::nodegroup::application::request::{
    create_tags_request::CreateTagsRequest,
    deploy_vm_request::DeployVmRequest,
    destroy_vm_request::DestroyVmRequest,
    list_requests::{
        ListAutoScaleVmProfilesRequest, ListResourceDetailsRequest, ListVirtualMachinesRequest,
    },
};
pub use crate::core::domain::value_object::{CloudstackUrl, LabelSelector, RefreshInterval};
pub use crate::core::infrastructure::{
    api_client::ApiClient,
    cloudstack_client::{CloudstackClient, DiscoveryClient, ProjectClient, ScalerClient},
    config::{CloudstackConfig, RateLimitConfig},
};
pub use crate::nodegroup::application::service::node_group::{NodeGroup, NodeRef};

use crate::nodegroup::application::service::{
    group_registry::GroupRegistry, group_scaler::GroupScaler, node_group::GroupContext,
    project_cache::ProjectCache, provisioner::Provisioner,
};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Name under which the provider registers with the autoscaler.
pub const PROVIDER_NAME: &str = "globo-cloudstack";

/// Node label marking GPU nodes.
pub const GPU_LABEL: &str = "cloudstack.apache.org/gpu-node";

/// Cloud provider exposing the discovered CloudStack node groups.
///
/// # Examples
///
/// ```no_run
/// use leeca_autoscaler::{CloudstackProvider, AutoscalerResult};
///
/// #[tokio::main]
/// async fn main() -> AutoscalerResult<()> {
///     let mut provider = CloudstackProvider::builder()
///         .config_file("/etc/cloudstack.json")
///         .await?
///         .discovery_spec("label:cluster=prod")
///         .build()
///         .await?;
///
///     for group in provider.node_groups_mut() {
///         let size = group.target_size().await?;
///         println!("{}: {} nodes", group.id(), size);
///     }
///     Ok(())
/// }
/// ```
pub struct CloudstackProvider {
    registry: GroupRegistry,
    node_groups: Vec<NodeGroup>,
}

/// The three capabilities of a single client, held separately.
struct Clients {
    projects: Arc<dyn ProjectClient>,
    scaler: Arc<dyn ScalerClient>,
    discovery: Arc<dyn DiscoveryClient>,
}

impl Clients {
    fn from_client<C: CloudstackClient + 'static>(client: Arc<C>) -> Self {
        Self {
            projects: client.clone(),
            scaler: client.clone(),
            discovery: client,
        }
    }
}

/// Builder for CloudstackProvider configuration
#[derive(Default)]
pub struct CloudstackProviderBuilder {
    config: Option<CloudstackConfig>,
    discovery_specs: Vec<String>,
    clients: Option<Clients>,
}

impl CloudstackProviderBuilder {
    /// Uses `config` as is, without looking at the environment.
    pub fn config(mut self, config: CloudstackConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Reads the JSON configuration at `path`, then applies the
    /// `CLOUDSTACK_*` environment overrides.
    pub async fn config_file(mut self, path: impl AsRef<Path>) -> AutoscalerResult<Self> {
        let path = path.as_ref();
        let body = tokio::fs::read_to_string(path).await.map_err(|e| {
            ValidationError::Field {
                field: "config".to_string(),
                message: format!("couldn't open configuration {}: {}", path.display(), e),
            }
        })?;
        self.config = Some(CloudstackConfig::load(Some(body.as_bytes()))?);
        Ok(self)
    }

    /// Adds a `label:key=value[,key=value...]` auto-discovery spec.
    pub fn discovery_spec(mut self, spec: impl Into<String>) -> Self {
        self.discovery_specs.push(spec.into());
        self
    }

    pub fn discovery_specs<I, S>(mut self, specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.discovery_specs
            .extend(specs.into_iter().map(Into::into));
        self
    }

    /// Talks to CloudStack through `client` instead of an [`ApiClient`]
    /// built from the configuration.
    pub fn client<C: CloudstackClient + 'static>(mut self, client: Arc<C>) -> Self {
        self.clients = Some(Clients::from_client(client));
        self
    }

    /// Validates the settings, builds the engine and runs a first discovery.
    ///
    /// # Errors
    /// Returns `AutoscalerError::Validation` for an invalid configuration or
    /// discovery spec, and any error of the initial discovery.
    pub async fn build(self) -> AutoscalerResult<CloudstackProvider> {
        let config = match self.config {
            Some(config) => config,
            None => CloudstackConfig::load(None::<&[u8]>)?,
        };
        config.validate()?;

        if self.discovery_specs.is_empty() {
            return Err(ValidationError::Field {
                field: "discovery_specs".to_string(),
                message: "auto discovery configuration is required".to_string(),
            }
            .into());
        }
        let selectors = self
            .discovery_specs
            .iter()
            .map(|spec| LabelSelector::parse(spec))
            .collect::<Result<Vec<_>, _>>()?;

        let clients = match self.clients {
            Some(clients) => clients,
            None => Clients::from_client(Arc::new(ApiClient::new(&config)?)),
        };

        let projects = ProjectCache::new(
            clients.projects,
            config.use_projects,
            config.refresh_interval()?,
        )?;
        let scaler = GroupScaler::new(Provisioner::new(clients.scaler, config.expunge_vms));
        let ctx = GroupContext::new(clients.discovery, scaler);

        let mut provider = CloudstackProvider {
            registry: GroupRegistry::new(projects, selectors, ctx),
            node_groups: Vec::new(),
        };
        provider.refresh().await?;
        Ok(provider)
    }
}

impl CloudstackProvider {
    /// Creates a new builder for CloudstackProvider configuration
    pub fn builder() -> CloudstackProviderBuilder {
        CloudstackProviderBuilder::default()
    }

    pub fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    pub fn node_groups(&self) -> &[NodeGroup] {
        &self.node_groups
    }

    pub fn node_groups_mut(&mut self) -> &mut [NodeGroup] {
        &mut self.node_groups
    }

    /// Finds the group owning the instance with this external id.
    pub fn node_group_for_node(&self, provider_id: &str) -> Option<&NodeGroup> {
        self.node_groups.iter().find(|g| g.has_node(provider_id))
    }

    pub fn node_group_for_node_mut(&mut self, provider_id: &str) -> Option<&mut NodeGroup> {
        self.node_groups.iter_mut().find(|g| g.has_node(provider_id))
    }

    /// Rediscovers every node group.
    ///
    /// On error the previously discovered groups are kept.
    pub async fn refresh(&mut self) -> AutoscalerResult<()> {
        debug!("refreshing node group cache");
        self.node_groups = self.registry.discover().await?;
        Ok(())
    }

    pub fn gpu_label(&self) -> &'static str {
        GPU_LABEL
    }

    pub fn available_machine_types(&self) -> Vec<String> {
        Vec::new()
    }

    pub fn cleanup(&mut self) -> AutoscalerResult<()> {
        Ok(())
    }
}
