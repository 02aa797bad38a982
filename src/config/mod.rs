// src/config/mod.rs

//! Configuration loading, validation and resolution for phaserun.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate ids, phases and globs (`validate.rs`).
//! - Resolve defaults into engine-ready task specs (`resolve.rs`).

pub mod loader;
pub mod model;
pub mod resolve;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_from_str};
pub use model::{ConfigFile, ConfigSection, DefaultSection, RawConfigFile, TaskConfig};
pub use resolve::resolve_tasks;
