//! Configuration of the CloudStack connection and node group engine.
//!
//! The configuration is read from an optional JSON document and then
//! overridden by `CLOUDSTACK_*` environment variables.

use crate::core::domain::{
    error::{AutoscalerError, AutoscalerResult, ValidationError},
    value_object::{cloudstack_url::CloudstackUrl, refresh_interval::RefreshInterval},
};
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

/// How often the project list is re-read when none is configured.
pub const DEFAULT_PROJECT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

const DEFAULT_ASYNC_TIMEOUT_SECS: u64 = 300;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Client-side rate limit applied to every API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

/// Connection and behaviour settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CloudstackConfig {
    /// Key associated with the user account.
    pub api_key: String,
    /// Secret associated with the user account.
    pub api_secret: String,
    /// Skip TLS certificate verification.
    #[serde(rename = "insecure")]
    pub insecure_skip_verify: bool,
    /// Look for node groups inside every project too.
    pub use_projects: bool,
    /// Go-style duration (e.g. `30m`) controlling how long the project list is cached.
    pub project_refresh_interval: String,
    /// Set the expunge flag when destroying VMs.
    pub expunge_vms: bool,
    /// CloudStack API endpoint.
    pub url: String,
    /// Upper bound on the wait for an asynchronous job.
    pub async_timeout_secs: u64,
    /// Delay between two async job polls.
    pub poll_interval_ms: u64,
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for CloudstackConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            insecure_skip_verify: false,
            use_projects: false,
            project_refresh_interval: String::new(),
            expunge_vms: false,
            url: String::new(),
            async_timeout_secs: DEFAULT_ASYNC_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            rate_limit: None,
        }
    }
}

impl CloudstackConfig {
    /// Loads the configuration from `reader` (if any) and the process environment.
    ///
    /// # Errors
    /// Returns `AutoscalerError::Validation` if the document cannot be read or parsed.
    pub fn load<R: Read>(reader: Option<R>) -> AutoscalerResult<Self> {
        let config = Self::from_reader(reader)?;
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Parses the JSON document without looking at the environment.
    pub fn from_reader<R: Read>(reader: Option<R>) -> AutoscalerResult<Self> {
        let Some(mut reader) = reader else {
            return Ok(Self::default());
        };
        let mut body = String::new();
        reader.read_to_string(&mut body).map_err(|e| {
            ValidationError::Format(format!("unable to read configuration: {}", e))
        })?;
        serde_json::from_str(&body).map_err(|e| {
            AutoscalerError::from(ValidationError::Format(format!(
                "unexpected configuration format: {}",
                e
            )))
        })
    }

    /// Applies `CLOUDSTACK_*` overrides read through `lookup`.
    ///
    /// Unparsable booleans fall back to `false`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |v: String| v.parse::<bool>().unwrap_or(false);
        if let Some(v) = lookup("CLOUDSTACK_API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = lookup("CLOUDSTACK_API_SECRET") {
            self.api_secret = v;
        }
        if let Some(v) = lookup("CLOUDSTACK_INSECURE") {
            self.insecure_skip_verify = flag(v);
        }
        if let Some(v) = lookup("CLOUDSTACK_USE_PROJECTS") {
            self.use_projects = flag(v);
        }
        if let Some(v) = lookup("CLOUDSTACK_PROJECT_REFRESH_INTERVAL") {
            self.project_refresh_interval = v;
        }
        if let Some(v) = lookup("CLOUDSTACK_EXPUNGE_VMS") {
            self.expunge_vms = flag(v);
        }
        if let Some(v) = lookup("CLOUDSTACK_URL") {
            self.url = v;
        }
        self
    }

    /// Checks the mandatory connection settings.
    ///
    /// # Errors
    /// Returns `AutoscalerError::Validation` naming the first missing or invalid field.
    pub fn validate(&self) -> AutoscalerResult<()> {
        if self.api_key.is_empty() {
            return Err(required("api_key", "api key is required"));
        }
        if self.api_secret.is_empty() {
            return Err(required("api_secret", "api secret is required"));
        }
        if self.url.is_empty() {
            return Err(required("url", "URL is required"));
        }
        self.endpoint()?;
        self.refresh_interval()?;
        if let Some(rl) = self.rate_limit {
            if rl.requests_per_second == 0 || rl.burst_size == 0 {
                return Err(ValidationError::ConstraintViolation(
                    "rate limit values must be greater than zero".to_string(),
                )
                .into());
            }
        }
        Ok(())
    }

    /// The validated API endpoint.
    pub fn endpoint(&self) -> AutoscalerResult<CloudstackUrl> {
        Ok(CloudstackUrl::parse(&self.url)?)
    }

    /// The project cache TTL.
    pub fn refresh_interval(&self) -> AutoscalerResult<Duration> {
        if self.project_refresh_interval.is_empty() {
            return Ok(DEFAULT_PROJECT_REFRESH_INTERVAL);
        }
        Ok(RefreshInterval::parse(&self.project_refresh_interval)?.get())
    }

    pub fn async_timeout(&self) -> Duration {
        Duration::from_secs(self.async_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn required(field: &str, message: &str) -> AutoscalerError {
    ValidationError::Field {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}
