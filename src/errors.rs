// src/errors.rs

//! Crate-wide error type and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    /// The build tool could not be started at all (missing executable,
    /// permission denied, ...).
    #[error("failed to spawn `{command}`: {source}")]
    SpawnFailure {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A drain task failed while reading one of the child's streams.
    #[error("failed to capture {stream} of `{command}`: {message}")]
    StreamCapture {
        command: String,
        stream: String,
        message: String,
    },

    /// The build tool exited non-zero, or never printed its success marker.
    #[error(
        "build failed in {project:?} (exit code {exit_code}): {reason}\ncommand: {command}\n--- output ---\n{output}"
    )]
    BuildFailure {
        project: PathBuf,
        command: String,
        exit_code: i32,
        reason: String,
        output: String,
    },

    /// Required deploy configuration is missing or points nowhere.
    #[error("deploy precondition failed: {0}")]
    DeployPrecondition(String),

    #[error("failed to copy artifact {artifact:?}: {source}")]
    ArtifactCopy {
        artifact: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot reach management endpoint {endpoint}: {message}")]
    Connectivity { endpoint: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BundleError {
    /// Process exit status to report for this error.
    ///
    /// Build failures surface the build tool's own exit code when it is a
    /// usable non-zero value; everything else maps to `1`.
    pub fn exit_code(&self) -> i32 {
        match self {
            BundleError::BuildFailure { exit_code, .. } if *exit_code > 0 => *exit_code,
            _ => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BundleError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn build_failure(exit_code: i32) -> BundleError {
        BundleError::BuildFailure {
            project: PathBuf::from("/tmp/app"),
            command: "./mvnw clean package".to_string(),
            exit_code,
            reason: "exit code was non-zero".to_string(),
            output: "[ERROR] boom\n".to_string(),
        }
    }

    #[test]
    fn build_failure_exit_code_is_propagated() {
        assert_eq!(build_failure(3).exit_code(), 3);
    }

    #[test]
    fn sentinel_or_zero_exit_code_maps_to_one() {
        assert_eq!(build_failure(-1).exit_code(), 1);
        // Exit 0 without the success marker is still a failure.
        assert_eq!(build_failure(0).exit_code(), 1);
        assert_eq!(BundleError::ConfigError("x".into()).exit_code(), 1);
    }

    #[test]
    fn build_failure_message_carries_diagnostics() {
        let msg = build_failure(2).to_string();
        assert!(msg.contains("/tmp/app"));
        assert!(msg.contains("./mvnw clean package"));
        assert!(msg.contains("[ERROR] boom"));
    }
}
