use crate::{
    core::domain::model::vm_profile::{NODE_GROUP_VM_TAG, VmProfile},
    nodegroup::application::request::{ApiRequest, QueryParams, encode_map},
};
use std::collections::BTreeMap;

/// CloudStack resource type of user VMs.
pub const RESOURCE_TYPE_VIRTUAL_MACHINE: &str = "UserVm";

/// Parameters of a `createTags` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateTagsRequest {
    pub resource_ids: Vec<String>,
    pub resource_type: String,
    pub tags: BTreeMap<String, String>,
}

impl CreateTagsRequest {
    /// Builds the tags of a node group instance: the custom `tag-` metadata
    /// plus the membership tag. The resource id is set once the VM exists.
    pub fn for_profile(profile: &VmProfile) -> Self {
        let mut tags: BTreeMap<String, String> = profile.tags().into_iter().collect();
        tags.insert(NODE_GROUP_VM_TAG.to_string(), profile.id().to_string());
        Self {
            tags,
            ..Default::default()
        }
    }

    /// Targets the given virtual machine.
    pub fn for_vm(mut self, vm_id: &str) -> Self {
        self.resource_ids = vec![vm_id.to_string()];
        self.resource_type = RESOURCE_TYPE_VIRTUAL_MACHINE.to_string();
        self
    }
}

impl ApiRequest for CreateTagsRequest {
    const COMMAND: &'static str = "createTags";

    fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::from([
            ("resourceids".to_string(), self.resource_ids.join(",")),
            ("resourcetype".to_string(), self.resource_type.clone()),
        ]);
        encode_map(&mut query, "tags", &self.tags);
        query
    }
}
