// src/config/validate.rs

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CalcdagError, Result};

/// Upper bound for every configured duration.
const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CalcdagError;

    fn try_from(raw: RawConfigFile) -> Result<Self> {
        let section = raw.orchestrator;

        if section.worker_count == 0 {
            return Err(CalcdagError::ConfigError(
                "[orchestrator].worker_count must be >= 1 (got 0)".to_string(),
            ));
        }

        if section.queue_capacity == 0 {
            return Err(CalcdagError::ConfigError(
                "[orchestrator].queue_capacity must be >= 1 (got 0)".to_string(),
            ));
        }

        let operation_duration = parse_duration(
            "[orchestrator].operation_duration",
            &section.operation_duration,
        )?;
        let poll_interval = parse_duration("[orchestrator].poll_interval", &section.poll_interval)?;

        for (key, value) in [
            ("operation_duration", operation_duration),
            ("poll_interval", poll_interval),
        ] {
            if value > MAX_DURATION {
                return Err(CalcdagError::ConfigError(format!(
                    "[orchestrator].{key} must be at most 24h"
                )));
            }
        }

        if poll_interval.is_zero() {
            return Err(CalcdagError::ConfigError(
                "[orchestrator].poll_interval must be greater than zero".to_string(),
            ));
        }

        Ok(ConfigFile::new_unchecked(
            section.worker_count,
            operation_duration,
            poll_interval,
            section.queue_capacity,
        ))
    }
}
