//! Human readable durations
//!
//! Accepts a sequence of `<number><unit>` parts such as `168h`, `30m`,
//! `1h30m` or `45s`. Supported units are `d`, `h`, `m`, `s` and `ms`.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Parse a duration string like `1h30m`
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        bail!("empty duration");
    }

    let mut total = Duration::ZERO;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            bail!("invalid duration '{}': expected a number", input);
        }
        let value: u64 = rest[..digits]
            .parse()
            .with_context(|| format!("invalid duration '{}'", input))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "d" => seconds(value, 24 * 60 * 60, input)?,
            "h" => seconds(value, 60 * 60, input)?,
            "m" => seconds(value, 60, input)?,
            "s" => Duration::from_secs(value),
            "ms" => Duration::from_millis(value),
            "" => bail!("invalid duration '{}': missing unit", input),
            other => bail!("invalid duration '{}': unknown unit '{}'", input, other),
        };
        total = total
            .checked_add(part)
            .with_context(|| format!("duration '{}' is too large", input))?;
    }

    Ok(total)
}

fn seconds(value: u64, unit_secs: u64, input: &str) -> Result<Duration> {
    value
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .with_context(|| format!("duration '{}' is too large", input))
}

/// Format a duration the way `parse_duration` reads it
pub fn format_duration(duration: Duration) -> String {
    let mut secs = duration.as_secs();
    if secs == 0 {
        return format!("{}ms", duration.subsec_millis());
    }

    let mut out = String::new();
    for (unit, size) in [("h", 3600), ("m", 60), ("s", 1)] {
        if secs >= size {
            out.push_str(&format!("{}{}", secs / size, unit));
            secs %= size;
        }
    }
    out
}

/// Serde adapter for `Duration` fields stored as strings
pub mod serde_duration {
    use super::*;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
