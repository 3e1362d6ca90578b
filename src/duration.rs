//! # Duration Strings
//!
//! Parsing and formatting of the compact duration strings ("30s", "5m", "1h")
//! the declarative layer uses for poll and retry settings.

use regex::Regex;
use std::time::Duration;
use thiserror::Error;

/// Failure to parse a compact duration string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("duration string cannot be empty")]
    Empty,

    #[error("invalid duration format '{0}'. Expected format: <number><unit> (e.g., '30s', '5m', '1h')")]
    Format(String),

    #[error("duration '{0}' must be greater than zero")]
    Zero(String),

    #[error("failed to compile duration regex: {0}")]
    Regex(String),
}

/// Parse a compact duration string into a `Duration`.
///
/// Supports formats: "30s", "1m", "5m", "1h", "2h", "1d". Zero durations are
/// rejected; a zero poll interval or retry delay would busy-loop against the
/// remote API.
pub fn parse_compact(duration_str: &str) -> Result<Duration, DurationParseError> {
    let trimmed = duration_str.trim();

    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    // Matches: <number><unit> where unit is s, m, h or d (case insensitive)
    let duration_regex = Regex::new(r"^(?P<number>\d+)(?P<unit>[smhd])$")
        .map_err(|e| DurationParseError::Regex(e.to_string()))?;

    let lowered = trimmed.to_lowercase();
    let captures = duration_regex
        .captures(&lowered)
        .ok_or_else(|| DurationParseError::Format(trimmed.to_string()))?;

    let number: u64 = captures["number"]
        .parse()
        .map_err(|_| DurationParseError::Format(trimmed.to_string()))?;

    if number == 0 {
        return Err(DurationParseError::Zero(trimmed.to_string()));
    }

    let seconds = match &captures["unit"] {
        "s" => number,
        "m" => number * 60,
        "h" => number * 3600,
        "d" => number * 86400,
        _ => return Err(DurationParseError::Format(trimmed.to_string())),
    };

    Ok(Duration::from_secs(seconds))
}

/// Render a duration in the most compact unit that divides it evenly
#[must_use]
pub fn format_compact(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs > 0 && secs % 86400 == 0 {
        format!("{}d", secs / 86400)
    } else if secs > 0 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs > 0 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

/// Serde adapter for duration fields in declarative specs
///
/// Use with `#[serde(with = "crate::duration::compact")]`.
pub mod compact {
    use super::{format_compact, parse_compact};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_compact(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_compact(&raw).map_err(serde::de::Error::custom)
    }
}
