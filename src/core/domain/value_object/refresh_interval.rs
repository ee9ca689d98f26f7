use crate::core::domain::error::ValidationError;
use std::time::Duration;

/// A validated, strictly positive refresh interval.
///
/// Intervals are written the way Go's `time.ParseDuration` reads them: a
/// sequence of decimal numbers with a unit suffix, e.g. `30m`, `24h`,
/// `1h30m` or `1.5s`. Valid units are `ns`, `us` (or `µs`), `ms`, `s`, `m`
/// and `h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshInterval(Duration);

impl RefreshInterval {
    /// Creates a new interval without validation.
    pub(crate) fn new_unchecked(interval: Duration) -> Self {
        Self(interval)
    }

    /// Parses and validates an interval string.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let (negative, interval) = parse_duration(raw)?;
        if negative || interval.is_zero() {
            return Err(ValidationError::ConstraintViolation(
                "max projects age cannot be <= 0".to_string(),
            ));
        }
        Ok(Self::new_unchecked(interval))
    }

    /// Returns the interval as a `Duration`.
    #[must_use]
    pub fn get(&self) -> Duration {
        self.0
    }
}

fn unit_nanos(unit: &str) -> Option<f64> {
    match unit {
        "ns" => Some(1.0),
        "us" | "µs" => Some(1e3),
        "ms" => Some(1e6),
        "s" => Some(1e9),
        "m" => Some(60.0 * 1e9),
        "h" => Some(3600.0 * 1e9),
        _ => None,
    }
}

/// Parses a Go-style duration string into its sign (`true` when negative)
/// and magnitude.
pub(crate) fn parse_duration(raw: &str) -> Result<(bool, Duration), ValidationError> {
    let invalid = || ValidationError::Format(format!("invalid duration \"{raw}\""));
    let (negative, body) = match raw.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if body.is_empty() {
        return Err(invalid());
    }
    if body == "0" {
        return Ok((negative, Duration::ZERO));
    }

    let mut nanos = 0f64;
    let mut rest = body;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| ValidationError::Format(format!("missing unit in duration \"{raw}\"")))?;
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        let scale = unit_nanos(unit).ok_or_else(|| {
            ValidationError::Format(format!("unknown unit \"{unit}\" in duration \"{raw}\""))
        })?;
        nanos += value * scale;
        rest = &rest[unit_len..];
    }
    Ok((negative, Duration::from_nanos(nanos.round() as u64)))
}
