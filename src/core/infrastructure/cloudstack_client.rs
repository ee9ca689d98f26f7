//! Capability traits over the CloudStack API and their HTTP implementation.
//!
//! The node group engine only ever talks to CloudStack through these traits,
//! so each service can be handed the narrowest capability it needs and tests
//! can substitute mocks.

use crate::{
    core::domain::{
        error::{AutoscalerError, AutoscalerResult, DeployFailure},
        model::{
            autoscale_profile::{AutoScaleVmProfile, ResourceDetail},
            catalog::{Project, ServiceOffering, Zone},
            virtual_machine::VirtualMachine,
        },
    },
    core::infrastructure::api_client::ApiClient,
    nodegroup::application::{
        request::{
            ApiRequest,
            create_tags_request::CreateTagsRequest,
            deploy_vm_request::DeployVmRequest,
            destroy_vm_request::DestroyVmRequest,
            list_requests::{
                GetServiceOfferingRequest, GetZoneRequest, ListAutoScaleVmProfilesRequest,
                ListProjectsRequest, ListResourceDetailsRequest, ListVirtualMachinesRequest,
            },
        },
        response::list_responses::{
            ListAutoScaleVmProfilesResponse, ListProjectsResponse, ListResourceDetailsResponse,
            ListServiceOfferingsResponse, ListVirtualMachinesResponse, ListZonesResponse,
        },
    },
};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Lists the projects visible to the account.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProjectClient: Send + Sync {
    async fn list_projects(&self) -> AutoscalerResult<Vec<Project>>;
}

/// Mutating operations used to grow and shrink node groups.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ScalerClient: Send + Sync {
    /// Deploys a VM and waits for the async job to finish.
    ///
    /// On failure the returned `DeployFailure` carries the VM id whenever
    /// CloudStack already handed one out.
    async fn deploy_virtual_machine(
        &self,
        request: &DeployVmRequest,
    ) -> Result<VirtualMachine, DeployFailure>;

    async fn destroy_virtual_machine(&self, request: &DestroyVmRequest) -> AutoscalerResult<()>;

    async fn create_tags(&self, request: &CreateTagsRequest) -> AutoscalerResult<()>;
}

/// Read-only operations used to discover node groups and their instances.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DiscoveryClient: Send + Sync {
    async fn list_autoscale_vm_profiles(
        &self,
        request: &ListAutoScaleVmProfilesRequest,
    ) -> AutoscalerResult<Vec<AutoScaleVmProfile>>;

    async fn list_resource_details(
        &self,
        request: &ListResourceDetailsRequest,
    ) -> AutoscalerResult<Vec<ResourceDetail>>;

    async fn list_virtual_machines(
        &self,
        request: &ListVirtualMachinesRequest,
    ) -> AutoscalerResult<Vec<VirtualMachine>>;

    async fn get_service_offering_by_id(&self, id: &str) -> AutoscalerResult<ServiceOffering>;

    async fn get_zone_by_id(&self, id: &str) -> AutoscalerResult<Zone>;
}

/// Every capability at once, as needed by the provider facade.
pub trait CloudstackClient: ProjectClient + ScalerClient + DiscoveryClient {}

impl<T> CloudstackClient for T where T: ProjectClient + ScalerClient + DiscoveryClient {}

impl ApiClient {
    async fn call<R, T>(&self, request: &R) -> AutoscalerResult<T>
    where
        R: ApiRequest + Sync,
        T: DeserializeOwned,
    {
        self.get(R::COMMAND, request.to_query()).await
    }

    /// Starts an async command and waits for its result.
    async fn call_async<R>(&self, request: &R) -> AutoscalerResult<serde_json::Value>
    where
        R: ApiRequest + Sync,
    {
        let job = self.start_async(R::COMMAND, request.to_query()).await?;
        self.wait_for_job(&job.jobid).await
    }
}

#[async_trait]
impl ProjectClient for ApiClient {
    async fn list_projects(&self) -> AutoscalerResult<Vec<Project>> {
        let response: ListProjectsResponse = self.call(&ListProjectsRequest).await?;
        Ok(response.projects)
    }
}

#[async_trait]
impl ScalerClient for ApiClient {
    async fn deploy_virtual_machine(
        &self,
        request: &DeployVmRequest,
    ) -> Result<VirtualMachine, DeployFailure> {
        let job = self
            .start_async(DeployVmRequest::COMMAND, request.to_query())
            .await?;
        debug!(vm_id = ?job.id, job_id = %job.jobid, "deploy job started");

        let with_vm = |error: AutoscalerError| DeployFailure {
            vm_id: job.id.clone(),
            error,
        };
        let result = self.wait_for_job(&job.jobid).await.map_err(with_vm)?;
        let vm = result.get("virtualmachine").cloned().ok_or_else(|| {
            with_vm(AutoscalerError::AsyncJob(
                "deploy job result has no virtualmachine".to_string(),
            ))
        })?;
        serde_json::from_value(vm).map_err(|e| {
            with_vm(AutoscalerError::Connection(format!(
                "Failed to parse deployed VM: {}",
                e
            )))
        })
    }

    async fn destroy_virtual_machine(&self, request: &DestroyVmRequest) -> AutoscalerResult<()> {
        self.call_async(request).await?;
        Ok(())
    }

    async fn create_tags(&self, request: &CreateTagsRequest) -> AutoscalerResult<()> {
        self.call_async(request).await?;
        Ok(())
    }
}

#[async_trait]
impl DiscoveryClient for ApiClient {
    async fn list_autoscale_vm_profiles(
        &self,
        request: &ListAutoScaleVmProfilesRequest,
    ) -> AutoscalerResult<Vec<AutoScaleVmProfile>> {
        let response: ListAutoScaleVmProfilesResponse = self.call(request).await?;
        Ok(response.profiles)
    }

    async fn list_resource_details(
        &self,
        request: &ListResourceDetailsRequest,
    ) -> AutoscalerResult<Vec<ResourceDetail>> {
        let response: ListResourceDetailsResponse = self.call(request).await?;
        Ok(response.details)
    }

    async fn list_virtual_machines(
        &self,
        request: &ListVirtualMachinesRequest,
    ) -> AutoscalerResult<Vec<VirtualMachine>> {
        let response: ListVirtualMachinesResponse = self.call(request).await?;
        Ok(response.virtual_machines)
    }

    async fn get_service_offering_by_id(&self, id: &str) -> AutoscalerResult<ServiceOffering> {
        let request = GetServiceOfferingRequest { id: id.to_string() };
        let response: ListServiceOfferingsResponse = self.call(&request).await?;
        first_match(response.offerings, "service offering", id)
    }

    async fn get_zone_by_id(&self, id: &str) -> AutoscalerResult<Zone> {
        let request = GetZoneRequest { id: id.to_string() };
        let response: ListZonesResponse = self.call(&request).await?;
        first_match(response.zones, "zone", id)
    }
}

fn first_match<T>(items: Vec<T>, kind: &'static str, id: &str) -> AutoscalerResult<T> {
    items.into_iter().next().ok_or_else(|| AutoscalerError::NoMatch {
        kind,
        id: id.to_string(),
    })
}

// Every capability on one mock, for code that takes a whole client.
#[cfg(test)]
mockall::mock! {
    pub Cloudstack {}

    #[async_trait]
    impl ProjectClient for Cloudstack {
        async fn list_projects(&self) -> AutoscalerResult<Vec<Project>>;
    }

    #[async_trait]
    impl ScalerClient for Cloudstack {
        async fn deploy_virtual_machine(
            &self,
            request: &DeployVmRequest,
        ) -> Result<VirtualMachine, DeployFailure>;
        async fn destroy_virtual_machine(&self, request: &DestroyVmRequest) -> AutoscalerResult<()>;
        async fn create_tags(&self, request: &CreateTagsRequest) -> AutoscalerResult<()>;
    }

    #[async_trait]
    impl DiscoveryClient for Cloudstack {
        async fn list_autoscale_vm_profiles(
            &self,
            request: &ListAutoScaleVmProfilesRequest,
        ) -> AutoscalerResult<Vec<AutoScaleVmProfile>>;
        async fn list_resource_details(
            &self,
            request: &ListResourceDetailsRequest,
        ) -> AutoscalerResult<Vec<ResourceDetail>>;
        async fn list_virtual_machines(
            &self,
            request: &ListVirtualMachinesRequest,
        ) -> AutoscalerResult<Vec<VirtualMachine>>;
        async fn get_service_offering_by_id(&self, id: &str) -> AutoscalerResult<ServiceOffering>;
        async fn get_zone_by_id(&self, id: &str) -> AutoscalerResult<Zone>;
    }
}
