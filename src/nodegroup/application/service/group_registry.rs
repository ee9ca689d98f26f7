//! Discovery of node groups across the root scope and every project.

use crate::{
    core::domain::{
        error::{AutoscalerError, AutoscalerResult},
        model::{autoscale_profile::details_to_metadata, vm_profile::VmProfile},
        value_object::label_selector::{LabelSelector, matches_any},
    },
    nodegroup::application::{
        request::list_requests::{ListAutoScaleVmProfilesRequest, ListResourceDetailsRequest},
        service::{
            node_group::{GroupContext, NodeGroup},
            project_cache::{ProjectCache, ProjectVisitor},
        },
    },
};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Finds the node groups defined through autoscale VM profiles.
///
/// A profile defines a group when its resource details carry the required
/// metadata and match one of the configured selectors.
pub struct GroupRegistry {
    projects: ProjectCache,
    selectors: Vec<LabelSelector>,
    ctx: GroupContext,
}

impl GroupRegistry {
    pub fn new(projects: ProjectCache, selectors: Vec<LabelSelector>, ctx: GroupContext) -> Self {
        Self {
            projects,
            selectors,
            ctx,
        }
    }

    /// Runs a full discovery pass.
    ///
    /// Either every group resolves and the whole set is returned, or the
    /// first error is returned and nothing is.
    pub async fn discover(&mut self) -> AutoscalerResult<Vec<NodeGroup>> {
        let mut pass = DiscoveryPass {
            selectors: &self.selectors,
            ctx: &self.ctx,
            registered: HashMap::new(),
            groups: Vec::new(),
        };
        self.projects.for_each(&mut pass).await?;
        debug!(groups = pass.groups.len(), "discovered node groups");
        Ok(pass.groups)
    }
}

struct DiscoveryPass<'a> {
    selectors: &'a [LabelSelector],
    ctx: &'a GroupContext,
    /// Group name to the id of the profile that defined it.
    registered: HashMap<String, String>,
    groups: Vec<NodeGroup>,
}

#[async_trait]
impl ProjectVisitor for DiscoveryPass<'_> {
    async fn visit(&mut self, project_id: &str) -> AutoscalerResult<()> {
        let discovery = self.ctx.discovery();
        let profiles = discovery
            .list_autoscale_vm_profiles(&ListAutoScaleVmProfilesRequest::in_project(project_id))
            .await?;

        for asp in profiles {
            let details = discovery
                .list_resource_details(&ListResourceDetailsRequest::for_profile(&asp.id))
                .await?;
            let profile = VmProfile::new(asp, details_to_metadata(&details));
            if !profile.has_required_metadata() || !matches_any(profile.metadata(), self.selectors)
            {
                debug!(profile = %profile.asp().id, project_id, "skipping autoscale VM profile");
                continue;
            }

            let name = profile.id().to_string();
            let profile_id = profile.asp().id.clone();
            if let Some(existing_id) = self.registered.get(&name) {
                return Err(AutoscalerError::DuplicateNodeGroup {
                    name,
                    id: profile_id,
                    existing_id: existing_id.clone(),
                });
            }
            self.registered.insert(name, profile_id);

            let mut group = NodeGroup::new(profile, self.ctx.clone());
            group.refresh().await?;
            self.groups.push(group);
        }
        Ok(())
    }
}
