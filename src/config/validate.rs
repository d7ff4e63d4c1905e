// src/config/validate.rs

use crate::config::model::{ConfigFile, DeploySettings, RawConfigFile};
use crate::errors::{BundleError, Result};
use crate::exec::GoalSequence;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BundleError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let tool = raw.build.tool.unwrap_or_default();

        let goals = goal_sequence("goals", raw.build.goals, tool.default_goals())?;
        let watch_goals =
            goal_sequence("watch_goals", raw.build.watch_goals, tool.default_watch_goals())?;

        let success_marker = match raw.build.success_marker {
            Some(m) if m.trim().is_empty() => {
                return Err(BundleError::ConfigError(
                    "[build].success_marker must not be empty".to_string(),
                ));
            }
            Some(m) => m,
            None => tool.success_marker().to_string(),
        };

        validate_artifacts(&raw.deploy.artifacts)?;

        let server = match raw.server {
            Some(server) => {
                if server.port == 0 {
                    return Err(BundleError::ConfigError(
                        "[server].port must be between 1 and 65535 (got 0)".to_string(),
                    ));
                }
                if server.host.trim().is_empty() {
                    return Err(BundleError::ConfigError(
                        "[server].host must not be empty".to_string(),
                    ));
                }
                Some(server.endpoint())
            }
            None => None,
        };

        Ok(ConfigFile {
            tool,
            goals,
            watch_goals,
            success_marker,
            tee: raw.build.tee,
            deploy: DeploySettings {
                deploy_dir: raw.deploy.deploy_dir,
                output_dir: raw.deploy.output_dir,
                artifacts: raw.deploy.artifacts,
                skip_unchanged: raw.deploy.skip_unchanged,
            },
            server,
        })
    }
}

fn goal_sequence(
    key: &str,
    configured: Option<Vec<String>>,
    default: &[&str],
) -> Result<GoalSequence> {
    match configured {
        Some(goals) => GoalSequence::new(goals)
            .map_err(|e| BundleError::ConfigError(format!("[build].{key}: {e}"))),
        None => GoalSequence::new(default.iter().copied()),
    }
}

fn validate_artifacts(patterns: &[String]) -> Result<()> {
    if patterns.is_empty() {
        return Err(BundleError::ConfigError(
            "[deploy].artifacts must list at least one pattern".to_string(),
        ));
    }
    if let Some(p) = patterns.iter().find(|p| p.trim().is_empty()) {
        return Err(BundleError::ConfigError(format!(
            "[deploy].artifacts contains a blank pattern: {p:?}"
        )));
    }
    Ok(())
}
