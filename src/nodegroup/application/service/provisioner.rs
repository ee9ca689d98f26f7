use crate::{
    core::{
        domain::error::{AutoscalerError, AutoscalerResult, DeployFailure},
        infrastructure::cloudstack_client::ScalerClient,
    },
    nodegroup::application::request::{
        create_tags_request::CreateTagsRequest, deploy_vm_request::DeployVmRequest,
        destroy_vm_request::DestroyVmRequest,
    },
};
use std::sync::Arc;
use tracing::{info, warn};

/// Creates and destroys single instances.
///
/// `create` is a two step protocol (deploy, then tag) with compensation: a
/// half-finished instance is destroyed again, and a failing destroy is folded
/// into the returned error together with the error that triggered it.
#[derive(Clone)]
pub struct Provisioner {
    client: Arc<dyn ScalerClient>,
    expunge: bool,
}

impl Provisioner {
    pub fn new(client: Arc<dyn ScalerClient>, expunge: bool) -> Self {
        Self { client, expunge }
    }

    /// Deploys an instance and tags it, returning the new VM id.
    pub async fn create(
        &self,
        deploy: &DeployVmRequest,
        tags: &CreateTagsRequest,
    ) -> AutoscalerResult<String> {
        let vm = match self.client.deploy_virtual_machine(deploy).await {
            Ok(vm) => vm,
            Err(DeployFailure {
                vm_id: Some(vm_id),
                error,
            }) if !vm_id.is_empty() => {
                return match self.destroy(&vm_id).await {
                    Ok(()) => Err(error),
                    Err(destroy) => Err(AutoscalerError::CreateCleanup {
                        destroy: Box::new(destroy),
                        original: Box::new(error),
                    }),
                };
            }
            Err(failure) => return Err(failure.error),
        };

        let tags = tags.clone().for_vm(&vm.id);
        if let Err(error) = self.client.create_tags(&tags).await {
            return match self.destroy(&vm.id).await {
                Ok(()) => Err(error),
                Err(destroy) => Err(AutoscalerError::TagCleanup {
                    destroy: Box::new(destroy),
                    original: Box::new(error),
                }),
            };
        }

        info!(vm_id = %vm.id, name = ?deploy.name, "created cloudstack VM");
        Ok(vm.id)
    }

    /// Destroys an instance. An instance that is already gone counts as
    /// destroyed.
    pub async fn destroy(&self, vm_id: &str) -> AutoscalerResult<()> {
        let request = DestroyVmRequest {
            id: vm_id.to_string(),
            expunge: self.expunge,
        };
        match self.client.destroy_virtual_machine(&request).await {
            Ok(()) => {
                info!(vm_id, expunge = self.expunge, "destroyed cloudstack VM");
                Ok(())
            }
            Err(e) if e.is_not_found(vm_id) => {
                warn!(vm_id, "tried to destroy cloudstack VM but it wasn't found, error ignored");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
