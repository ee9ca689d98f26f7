use crate::core::domain::error::ValidationError;
use url::Url;

/// Maximum URL length accepted (RFC 7230 practical limit).
const MAX_URL_LENGTH: usize = 2083;

/// A validated CloudStack API endpoint, e.g. `https://cloud.example.com/client/api`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudstackUrl(Url);

impl CloudstackUrl {
    /// Creates a new URL without validation.
    pub(crate) fn new_unchecked(url: Url) -> Self {
        Self(url)
    }

    /// Parses and validates an endpoint URL.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate_url(raw)?;
        let url = Url::parse(raw)
            .map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;
        Ok(Self::new_unchecked(url))
    }

    /// Returns the underlying URL.
    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

/// Validates an endpoint URL.
pub(crate) fn validate_url(raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::Field {
            field: "url".to_string(),
            message: "URL is required".to_string(),
        });
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(ValidationError::Format(format!(
            "URL exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        )));
    }
    let url =
        Url::parse(raw).map_err(|e| ValidationError::Format(format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ValidationError::ConstraintViolation(format!(
            "Invalid scheme {scheme}. Must be one of: http, https"
        ))),
    }
}
