// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the unvalidated `RawConfigFile`.
///
/// Only TOML deserialization happens here. Use [`load_and_validate`] to get
/// a [`ConfigFile`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// Like [`load_from_path`], but a missing file at the *default* path yields
/// the built-in defaults. A missing file anywhere else is an error.
pub fn load_raw_or_default(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    if path == default_config_path() && !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return Ok(RawConfigFile::default());
    }
    load_from_path(path)
}

/// [`load_raw_or_default`] followed by validation.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    ConfigFile::try_from(load_raw_or_default(path)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::errors::CalcdagError;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_partial_section_and_fills_defaults() {
        let file = write_config(
            r#"
            [orchestrator]
            worker_count = 2
            operation_duration = "0ms"
            "#,
        );

        let cfg = load_and_validate(file.path()).unwrap();
        assert_eq!(cfg.worker_count(), 2);
        assert!(cfg.operation_duration().is_zero());
        assert_eq!(cfg.poll_interval(), Duration::from_secs(5));
        assert_eq!(cfg.queue_capacity(), 64);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let file = write_config("[orchestrator]\nworkers = 2\n");
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(err, CalcdagError::TomlError(_)), "got {err}");
    }

    #[test]
    fn invalid_values_fail_validation() {
        let file = write_config("[orchestrator]\nworker_count = 0\n");
        let err = load_and_validate(file.path()).unwrap_err();
        assert!(matches!(err, CalcdagError::ConfigError(_)), "got {err}");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_or_default(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CalcdagError::IoError(_)), "got {err}");
    }
}

/// `Calcdag.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Calcdag.toml")
}
