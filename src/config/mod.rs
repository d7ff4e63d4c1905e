// src/config/mod.rs

//! Configuration loading and validation for bundlewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it into a [`ConfigFile`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, default_config_path, load_for_project, load_from_path};
pub use model::{
    BuildSection, ConfigFile, DeploySection, DeploySettings, RawConfigFile, ServerSection,
};
