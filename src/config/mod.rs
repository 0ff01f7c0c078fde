// src/config/mod.rs

//! Configuration loading and validation for calcdag.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: turning a `RawConfigFile` into a checked `ConfigFile`.
//! - `duration.rs`: `"250ms"` / `"5s"` style duration strings.

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{
    default_config_path, load_and_validate, load_from_path, load_or_default, load_raw_or_default,
};
pub use model::{ConfigFile, OrchestratorSection, RawConfigFile};
