// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::types::BuildTool;

/// File name looked up in the project directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "Bundlewatch.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_for_project`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load and validate the configuration for the project in `project_dir`.
///
/// - Reads `config_path`, or `<project_dir>/Bundlewatch.toml` if it exists;
///   a missing default file just means "all defaults".
/// - Detects the build tool from `pom.xml` / `build.gradle` when the config
///   does not name one.
/// - Resolves relative `deploy_dir` / `output_dir` against `project_dir`.
pub fn load_for_project(project_dir: &Path, config_path: Option<&Path>) -> Result<ConfigFile> {
    let mut raw = match config_path {
        Some(path) => load_from_path(path)?,
        None => {
            let default = default_config_path(project_dir);
            if default.is_file() {
                load_from_path(&default)?
            } else {
                debug!(path = %default.display(), "no config file; using defaults");
                RawConfigFile::default()
            }
        }
    };

    if raw.build.tool.is_none() {
        let detected = BuildTool::detect(project_dir);
        info!(?detected, "build tool not configured; detected from project");
        raw.build.tool = detected;
    }

    raw.deploy.deploy_dir = raw.deploy.deploy_dir.map(|p| absolutize(project_dir, p));
    raw.deploy.output_dir = raw.deploy.output_dir.map(|p| absolutize(project_dir, p));

    ConfigFile::try_from(raw)
}

pub fn default_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(DEFAULT_CONFIG_FILE)
}

fn absolutize(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
