// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::deploy::ManagementEndpoint;
use crate::exec::GoalSequence;
use crate::types::BuildTool;

/// Configuration exactly as read from `Bundlewatch.toml`.
///
/// ```toml
/// [build]
/// tool = "maven"
/// goals = ["clean", "package"]
/// watch_goals = ["fizzed-watcher:run"]
///
/// [deploy]
/// deploy_dir = "/opt/server/deploy"
/// artifacts = ["*.jar", "*.war"]
///
/// [server]
/// host = "localhost"
/// port = 8101
/// ```
///
/// Every section is optional. Use [`ConfigFile::try_from`] to get a
/// validated configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub deploy: DeploySection,

    /// Management endpoint; when present it is checked before `deploy`
    /// and `watch` start.
    #[serde(default)]
    pub server: Option<ServerSection>,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// `"maven"` or `"gradle"`. Detected from the project when omitted.
    #[serde(default)]
    pub tool: Option<BuildTool>,

    /// Goals for `build` and the first build of `watch`.
    #[serde(default)]
    pub goals: Option<Vec<String>>,

    /// Goals for the long-running build started by `watch`.
    #[serde(default)]
    pub watch_goals: Option<Vec<String>>,

    /// Overrides the tool's own success marker.
    #[serde(default)]
    pub success_marker: Option<String>,

    /// Echo build output to the console.
    #[serde(default = "default_tee")]
    pub tee: bool,
}

fn default_tee() -> bool {
    true
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            tool: None,
            goals: None,
            watch_goals: None,
            success_marker: None,
            tee: default_tee(),
        }
    }
}

/// `[deploy]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploySection {
    /// Server directory scanned for new bundles.
    #[serde(default)]
    pub deploy_dir: Option<PathBuf>,

    /// Build output directory; defaults to the tool's convention.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// File-name globs selecting the artifacts to deploy.
    #[serde(default = "default_artifacts")]
    pub artifacts: Vec<String>,

    /// Skip artifacts whose content did not change since the last deploy.
    #[serde(default)]
    pub skip_unchanged: bool,
}

fn default_artifacts() -> Vec<String> {
    vec!["*.jar".to_string(), "*.war".to_string()]
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            deploy_dir: None,
            output_dir: None,
            artifacts: default_artifacts(),
            skip_unchanged: false,
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    pub port: u16,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    2000
}

/// Validated configuration. Constructed via `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub tool: BuildTool,
    pub goals: GoalSequence,
    pub watch_goals: GoalSequence,
    pub success_marker: String,
    pub tee: bool,
    pub deploy: DeploySettings,
    pub server: Option<ManagementEndpoint>,
}

#[derive(Debug, Clone)]
pub struct DeploySettings {
    pub deploy_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub artifacts: Vec<String>,
    pub skip_unchanged: bool,
}

impl ServerSection {
    pub fn endpoint(&self) -> ManagementEndpoint {
        ManagementEndpoint::new(self.host.clone(), self.port)
            .with_timeout(Duration::from_millis(self.connect_timeout_ms))
    }
}
