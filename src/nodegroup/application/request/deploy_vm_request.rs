use crate::{
    core::domain::model::vm_profile::VmProfile,
    nodegroup::application::request::{ApiRequest, QueryParams},
};
use std::collections::HashSet;

/// Parameters of a `deployVirtualMachine` call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeployVmRequest {
    pub serviceofferingid: String,
    pub zoneid: String,
    pub templateid: String,
    pub projectid: Option<String>,
    pub name: Option<String>,
    pub userdata: Option<String>,
    pub account: Option<String>,
    pub affinitygroupids: Vec<String>,
    pub affinitygroupnames: Vec<String>,
    pub diskofferingid: Option<String>,
    pub displayname: Option<String>,
    pub hypervisor: Option<String>,
    pub keyboard: Option<String>,
    pub keypair: Option<String>,
    pub networkids: Vec<String>,
    pub rootdisksize: Option<i64>,
    pub securitygroupids: Vec<String>,
    pub securitygroupnames: Vec<String>,
    pub size: Option<i64>,
}

impl DeployVmRequest {
    /// Builds the deploy parameters of a node group instance.
    ///
    /// Extra parameters come from the profile's `otherdeployparams`; the
    /// `userdata` metadata entry, when present, takes precedence over the one
    /// found there.
    pub fn from_profile(profile: &VmProfile) -> Self {
        let asp = profile.asp();
        let project_id = profile.project_id();
        let mut request = Self {
            serviceofferingid: asp.serviceofferingid.clone(),
            zoneid: asp.zoneid.clone(),
            templateid: asp.templateid.clone(),
            projectid: (!project_id.is_empty()).then_some(project_id),
            ..Default::default()
        };
        // A repeated key keeps its first value.
        let mut seen = HashSet::new();
        for (key, value) in profile.other_deploy_params() {
            if seen.insert(key.clone()) {
                request.set_other_param(&key, value);
            }
        }
        if let Some(userdata) = profile.userdata() {
            request.userdata = Some(userdata.to_string());
        }
        request
    }

    /// Sets the instance name.
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    fn set_other_param(&mut self, key: &str, value: String) {
        let list = |v: &str| v.split(',').map(str::to_string).collect::<Vec<_>>();
        match key {
            "account" => self.account = Some(value),
            "affinitygroupids" => self.affinitygroupids = list(&value),
            "affinitygroupnames" => self.affinitygroupnames = list(&value),
            "diskofferingid" => self.diskofferingid = Some(value),
            "displayname" => self.displayname = Some(value),
            "hypervisor" => self.hypervisor = Some(value),
            "keyboard" => self.keyboard = Some(value),
            "keypair" => self.keypair = Some(value),
            "networkids" => self.networkids = list(&value),
            "rootdisksize" => self.rootdisksize = value.parse().ok(),
            "securitygroupids" => self.securitygroupids = list(&value),
            "securitygroupnames" => self.securitygroupnames = list(&value),
            "size" => self.size = value.parse().ok(),
            "userdata" => self.userdata = Some(value),
            _ => {}
        }
    }
}

impl ApiRequest for DeployVmRequest {
    const COMMAND: &'static str = "deployVirtualMachine";

    fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query.insert("serviceofferingid".to_string(), self.serviceofferingid.clone());
        query.insert("zoneid".to_string(), self.zoneid.clone());
        query.insert("templateid".to_string(), self.templateid.clone());

        let optional = [
            ("projectid", &self.projectid),
            ("name", &self.name),
            ("userdata", &self.userdata),
            ("account", &self.account),
            ("diskofferingid", &self.diskofferingid),
            ("displayname", &self.displayname),
            ("hypervisor", &self.hypervisor),
            ("keyboard", &self.keyboard),
            ("keypair", &self.keypair),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                query.insert(key.to_string(), value.clone());
            }
        }

        let lists = [
            ("affinitygroupids", &self.affinitygroupids),
            ("affinitygroupnames", &self.affinitygroupnames),
            ("networkids", &self.networkids),
            ("securitygroupids", &self.securitygroupids),
            ("securitygroupnames", &self.securitygroupnames),
        ];
        for (key, values) in lists {
            if !values.is_empty() {
                query.insert(key.to_string(), values.join(","));
            }
        }

        if let Some(size) = self.rootdisksize {
            query.insert("rootdisksize".to_string(), size.to_string());
        }
        if let Some(size) = self.size {
            query.insert("size".to_string(), size.to_string());
        }
        query
    }
}
