// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only configuration-class failures surface as [`PhaserunError`]; git
//! problems, task failures and metrics parse errors are contained at the
//! task/phase level and never abort a run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhaserunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Unknown task id: {0}")]
    UnknownTask(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PhaserunError>;
