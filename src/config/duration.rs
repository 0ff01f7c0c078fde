// src/config/duration.rs

use std::time::Duration;

use crate::errors::{CalcdagError, Result};

/// Parse a duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
///
/// `field` names the config key in the error message.
pub fn parse_duration(field: &str, s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(CalcdagError::ConfigError(format!(
            "{field}: empty duration string"
        )));
    }

    let idx = s.chars().position(|c| !c.is_ascii_digit()).ok_or_else(|| {
        CalcdagError::ConfigError(format!("{field}: duration '{s}' is missing a unit suffix"))
    })?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part.parse().map_err(|e| {
        CalcdagError::ConfigError(format!(
            "{field}: invalid duration number '{num_part}': {e}"
        ))
    })?;

    let secs_per_unit: u64 = match unit_part.trim().to_lowercase().as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        unit => {
            return Err(CalcdagError::ConfigError(format!(
                "{field}: unsupported duration unit '{unit}'; expected ms, s, m, or h"
            )));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| CalcdagError::ConfigError(format!("{field}: duration '{s}' is too large")))
}
