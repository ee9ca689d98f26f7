pub mod create_tags_request;
pub mod deploy_vm_request;
pub mod destroy_vm_request;
pub mod list_requests;

use std::collections::BTreeMap;

/// Query parameters of a CloudStack command, sorted by key as the request
/// signature requires.
pub type QueryParams = BTreeMap<String, String>;

/// A CloudStack API command with its parameters.
pub trait ApiRequest {
    /// The command name, e.g. `deployVirtualMachine`.
    const COMMAND: &'static str;

    /// Encodes the request as query parameters (without `command`).
    fn to_query(&self) -> QueryParams;
}

/// Encodes a key/value map the way CloudStack expects map parameters:
/// `name[0].key=k`, `name[0].value=v`, ...
pub(crate) fn encode_map(query: &mut QueryParams, name: &str, map: &BTreeMap<String, String>) {
    for (i, (key, value)) in map.iter().enumerate() {
        query.insert(format!("{name}[{i}].key"), key.clone());
        query.insert(format!("{name}[{i}].value"), value.clone());
    }
}
