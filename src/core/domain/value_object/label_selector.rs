use crate::core::domain::error::ValidationError;
use std::collections::{BTreeMap, HashMap};

/// The only discoverer kind understood by the auto-discovery specs.
const LABEL_DISCOVERER: &str = "label";

/// A validated auto-discovery selector.
///
/// A selector is an AND of key/value pairs that a group definition's metadata
/// must carry. A list of selectors is OR'ed: a definition is accepted when it
/// matches any one of them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSelector {
    selector: BTreeMap<String, String>,
}

impl LabelSelector {
    /// Creates a new selector without validation.
    pub(crate) fn new_unchecked(selector: BTreeMap<String, String>) -> Self {
        Self { selector }
    }

    /// Parses and validates a `label:key=value[,key=value...]` spec.
    pub fn parse(spec: &str) -> Result<Self, ValidationError> {
        validate_label_selector(spec)?;
        let (_, pairs) = spec.split_once(':').unwrap_or_default();
        let selector = pairs
            .split(',')
            .filter_map(|kv| kv.split_once('='))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(Self::new_unchecked(selector))
    }

    /// Returns the wanted key/value pairs.
    #[must_use]
    pub fn selector(&self) -> &BTreeMap<String, String> {
        &self.selector
    }

    /// Checks whether `metadata` satisfies every pair of this selector.
    ///
    /// An empty wanted value only requires the key to be present.
    #[must_use]
    pub fn matches(&self, metadata: &HashMap<String, String>) -> bool {
        self.selector.iter().all(|(key, wanted)| {
            metadata
                .get(key)
                .is_some_and(|existing| wanted.is_empty() || existing == wanted)
        })
    }
}

/// Returns `true` if `metadata` matches at least one of `selectors`.
pub fn matches_any(metadata: &HashMap<String, String>, selectors: &[LabelSelector]) -> bool {
    selectors.iter().any(|s| s.matches(metadata))
}

/// Validates the format of an auto-discovery spec.
pub(crate) fn validate_label_selector(spec: &str) -> Result<(), ValidationError> {
    let tokens: Vec<&str> = spec.split(':').collect();
    if tokens.len() != 2 {
        return Err(ValidationError::Format(format!(
            "spec \"{spec}\" should be discoverer:key=value,key=value"
        )));
    }
    if tokens[0] != LABEL_DISCOVERER {
        return Err(ValidationError::ConstraintViolation(format!(
            "unsupported discoverer specified: {}",
            tokens[0]
        )));
    }
    for arg in tokens[1].split(',') {
        let kv: Vec<&str> = arg.split('=').collect();
        if kv.len() != 2 {
            return Err(ValidationError::Format(format!(
                "invalid key=value pair {arg}"
            )));
        }
        if kv[0].is_empty() || kv[1].is_empty() {
            return Err(ValidationError::Format(
                "empty value not allowed in key=value tag pairs".to_string(),
            ));
        }
    }
    Ok(())
}
