//! Bodies of the `list*` responses, as found inside the CloudStack envelope.
//!
//! CloudStack omits the item array entirely when nothing matched, so every
//! list defaults to empty.

use crate::core::domain::model::{
    autoscale_profile::{AutoScaleVmProfile, ResourceDetail},
    catalog::{Project, ServiceOffering, Zone},
    virtual_machine::VirtualMachine,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ListProjectsResponse {
    #[serde(default, rename = "project")]
    pub projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
pub struct ListAutoScaleVmProfilesResponse {
    #[serde(default, rename = "autoscalevmprofile")]
    pub profiles: Vec<AutoScaleVmProfile>,
}

#[derive(Debug, Deserialize)]
pub struct ListResourceDetailsResponse {
    #[serde(default, rename = "resourcedetail")]
    pub details: Vec<ResourceDetail>,
}

#[derive(Debug, Deserialize)]
pub struct ListVirtualMachinesResponse {
    #[serde(default, rename = "virtualmachine")]
    pub virtual_machines: Vec<VirtualMachine>,
}

#[derive(Debug, Deserialize)]
pub struct ListServiceOfferingsResponse {
    #[serde(default, rename = "serviceoffering")]
    pub offerings: Vec<ServiceOffering>,
}

#[derive(Debug, Deserialize)]
pub struct ListZonesResponse {
    #[serde(default, rename = "zone")]
    pub zones: Vec<Zone>,
}
