// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::OperationId;

#[derive(Error, Debug)]
pub enum CalcdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Expression error: {0}")]
    ParseError(String),

    #[error("Operation not found: {0}")]
    OperationNotFound(OperationId),

    /// The backing store can no longer be trusted. Fatal for the orchestrator.
    #[error("Operation store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CalcdagError {
    /// Whether this error should bring the whole orchestrator down.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CalcdagError::OperationNotFound(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CalcdagError>;
