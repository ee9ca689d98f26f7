use crate::nodegroup::application::request::{ApiRequest, QueryParams};

/// Parameters of a `destroyVirtualMachine` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyVmRequest {
    pub id: String,
    /// Remove the VM right away instead of leaving it in `Destroyed` state.
    pub expunge: bool,
}

impl ApiRequest for DestroyVmRequest {
    const COMMAND: &'static str = "destroyVirtualMachine";

    fn to_query(&self) -> QueryParams {
        QueryParams::from([
            ("id".to_string(), self.id.clone()),
            ("expunge".to_string(), self.expunge.to_string()),
        ])
    }
}
