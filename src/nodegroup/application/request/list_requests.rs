//! Parameters of the read-only `list*` commands.

use crate::nodegroup::application::request::{ApiRequest, QueryParams, encode_map};
use std::collections::BTreeMap;

/// CloudStack resource type of autoscale VM profiles.
pub const RESOURCE_TYPE_AUTOSCALE_VM_PROFILE: &str = "AutoScaleVmProfile";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListProjectsRequest;

impl ApiRequest for ListProjectsRequest {
    const COMMAND: &'static str = "listProjects";

    fn to_query(&self) -> QueryParams {
        QueryParams::new()
    }
}

/// `listAutoScaleVmProfiles`, optionally scoped to a project.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListAutoScaleVmProfilesRequest {
    pub projectid: Option<String>,
}

impl ListAutoScaleVmProfilesRequest {
    /// Scopes the listing to `project_id`; the empty id means the root scope.
    pub fn in_project(project_id: &str) -> Self {
        Self {
            projectid: (!project_id.is_empty()).then(|| project_id.to_string()),
        }
    }
}

impl ApiRequest for ListAutoScaleVmProfilesRequest {
    const COMMAND: &'static str = "listAutoScaleVmProfiles";

    fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        if let Some(projectid) = &self.projectid {
            query.insert("projectid".to_string(), projectid.clone());
        }
        query
    }
}

/// `listResourceDetails` of a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListResourceDetailsRequest {
    pub resource_type: String,
    pub resource_id: String,
}

impl ListResourceDetailsRequest {
    pub fn for_profile(profile_id: &str) -> Self {
        Self {
            resource_type: RESOURCE_TYPE_AUTOSCALE_VM_PROFILE.to_string(),
            resource_id: profile_id.to_string(),
        }
    }
}

impl ApiRequest for ListResourceDetailsRequest {
    const COMMAND: &'static str = "listResourceDetails";

    fn to_query(&self) -> QueryParams {
        QueryParams::from([
            ("resourcetype".to_string(), self.resource_type.clone()),
            ("resourceid".to_string(), self.resource_id.clone()),
        ])
    }
}

/// `listVirtualMachines` filtered by tags, optionally scoped to a project.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListVirtualMachinesRequest {
    pub projectid: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl ApiRequest for ListVirtualMachinesRequest {
    const COMMAND: &'static str = "listVirtualMachines";

    fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        if let Some(projectid) = &self.projectid {
            query.insert("projectid".to_string(), projectid.clone());
        }
        encode_map(&mut query, "tags", &self.tags);
        query
    }
}

/// `listServiceOfferings` narrowed to a single id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetServiceOfferingRequest {
    pub id: String,
}

impl ApiRequest for GetServiceOfferingRequest {
    const COMMAND: &'static str = "listServiceOfferings";

    fn to_query(&self) -> QueryParams {
        QueryParams::from([("id".to_string(), self.id.clone())])
    }
}

/// `listZones` narrowed to a single id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetZoneRequest {
    pub id: String,
}

impl ApiRequest for GetZoneRequest {
    const COMMAND: &'static str = "listZones";

    fn to_query(&self) -> QueryParams {
        QueryParams::from([("id".to_string(), self.id.clone())])
    }
}
