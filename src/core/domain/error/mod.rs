use thiserror::Error;

/// Substring CloudStack puts in the error text when an entity id is unknown.
const NOT_FOUND_PATTERN_PREFIX: &str = "Invalid parameter id value=";
const NOT_FOUND_PATTERN_SUFFIX: &str =
    " due to incorrect long value format, or entity does not exist";

/// The main error type for node group operations.
///
/// This enum represents all possible errors that can occur while talking
/// to CloudStack, discovering node groups and provisioning instances.
/// Compensation failures keep both the triggering error and the cleanup
/// error so operators can see each of them.
#[derive(Error, Debug)]
pub enum AutoscalerError {
    /// Represents errors that occur while reaching the API endpoint
    ///
    /// # Fields
    /// * `0` - A description of what went wrong on the transport
    #[error("Connection error: {0}")]
    Connection(String),

    /// An error envelope returned by the CloudStack API
    ///
    /// # Fields
    /// * `code` - The CloudStack `errorcode` (usually mirrors the HTTP status)
    /// * `message` - The CloudStack `errortext`
    #[error("CloudStack API error {code}: {message}")]
    Api { code: u16, message: String },

    /// An asynchronous job failed or did not finish in time
    #[error("Async job error: {0}")]
    AsyncJob(String),

    /// A lookup by id returned no entity
    #[error("No match found for {kind}: {id}")]
    NoMatch { kind: &'static str, id: String },

    /// Represents validation failures with detailed context
    #[error("Validation error: {source}")]
    Validation { source: ValidationError },

    /// A create call failed and the follow-up destroy failed as well
    #[error("unable to destroy cloudstack VM after error creating: {destroy} - original error: {original}")]
    CreateCleanup {
        destroy: Box<AutoscalerError>,
        original: Box<AutoscalerError>,
    },

    /// Tagging a fresh instance failed and the rollback destroy failed as well
    #[error("unable to destroy cloudstack VM after tagging error: {destroy} - original error: {original}")]
    TagCleanup {
        destroy: Box<AutoscalerError>,
        original: Box<AutoscalerError>,
    },

    /// One or more units of a scale-up batch failed
    ///
    /// # Fields
    /// * `0` - The message of every failed unit, in completion order
    #[error("error creating VMs: {}", .0.join(" - "))]
    ScaleUp(Vec<String>),

    /// Two group definitions resolved to the same node group name
    #[error("more than one AutoScaleVMProfile with the nodeGroupName {name:?}, ids: {id} and {existing_id}")]
    DuplicateNodeGroup {
        name: String,
        id: String,
        existing_id: String,
    },

    /// A node handed in for deletion is not bound to the group
    #[error("node ({node}, {provider_id}) not found in nodeGroup {group}")]
    NodeNotFound {
        node: String,
        provider_id: String,
        group: String,
    },

    #[error("delta must be positive, have: {0}")]
    InvalidDelta(i64),

    #[error("size increase is too large. current: {current} desired: {desired} max: {max}")]
    SizeIncreaseTooLarge {
        current: usize,
        desired: usize,
        max: usize,
    },

    #[error("Not implemented")]
    NotImplemented,
}

impl AutoscalerError {
    /// Returns `true` when CloudStack reports that entity `id` does not exist.
    ///
    /// CloudStack has no dedicated error code for this case, so the error text
    /// is matched instead.
    pub fn is_not_found(&self, id: &str) -> bool {
        let pattern = format!("{NOT_FOUND_PATTERN_PREFIX}{id}{NOT_FOUND_PATTERN_SUFFIX}");
        self.to_string().contains(&pattern)
    }
}

impl From<ValidationError> for AutoscalerError {
    fn from(error: ValidationError) -> Self {
        AutoscalerError::Validation { source: error }
    }
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// A failed `deployVirtualMachine` call.
///
/// CloudStack deploys asynchronously, so a client-side failure (typically a
/// timeout while waiting for the job) may still leave an instance behind.
/// `vm_id` carries that identifier when the API handed it out.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct DeployFailure {
    pub vm_id: Option<String>,
    pub error: AutoscalerError,
}

impl DeployFailure {
    /// A failure that left nothing behind on the remote side.
    pub fn without_vm(error: AutoscalerError) -> Self {
        Self { vm_id: None, error }
    }
}

impl From<AutoscalerError> for DeployFailure {
    fn from(error: AutoscalerError) -> Self {
        Self::without_vm(error)
    }
}

/// Type alias for Results that may fail with an AutoscalerError
pub type AutoscalerResult<T> = Result<T, AutoscalerError>;
