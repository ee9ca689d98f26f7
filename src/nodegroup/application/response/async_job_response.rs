use serde::Deserialize;

/// Immediate answer to an asynchronous command.
#[derive(Debug, Deserialize)]
pub struct AsyncJobResponse {
    /// Id of the entity the job acts on (e.g. the VM being deployed).
    #[serde(default)]
    pub id: Option<String>,
    pub jobid: String,
}

/// Body of a `queryAsyncJobResult` response.
#[derive(Debug, Deserialize)]
pub struct QueryAsyncJobResultResponse {
    /// `0` pending, `1` succeeded, `2` failed.
    pub jobstatus: u8,
    #[serde(default)]
    pub jobresult: Option<serde_json::Value>,
}

pub(crate) const JOB_STATUS_PENDING: u8 = 0;
pub(crate) const JOB_STATUS_SUCCEEDED: u8 = 1;
