//! Duration parsing for human-readable config values like "30s", "2m".

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{de, Deserialize, Deserializer};

/// Parse a duration string like "1d", "2h", "30m", "45s".
///
/// The input is case-insensitive and whitespace is trimmed.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();
    let (num, unit) = if s.ends_with('d') {
        (s.trim_end_matches('d'), "d")
    } else if s.ends_with('h') {
        (s.trim_end_matches('h'), "h")
    } else if s.ends_with('m') {
        (s.trim_end_matches('m'), "m")
    } else if s.ends_with('s') {
        (s.trim_end_matches('s'), "s")
    } else {
        anyhow::bail!("Duration must end with d, h, m, or s");
    };

    let num: u64 = num.parse().with_context(|| "Invalid number in duration")?;

    let secs = match unit {
        "d" => num
            .checked_mul(24 * 60 * 60)
            .context("Duration is too large")?,
        "h" => num.checked_mul(60 * 60).context("Duration is too large")?,
        "m" => num.checked_mul(60).context("Duration is too large")?,
        "s" => num,
        _ => unreachable!(),
    };

    Ok(Duration::from_secs(secs))
}

/// Serde deserializer for duration strings.
///
/// Use with `#[serde(deserialize_with = "deserialize_duration")]`.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(de::Error::custom)
}
