// src/exec/executor.rs

use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::errors::{BundleError, Result};
use crate::exec::drain::{DrainOptions, ProcessResult, start_drain};
use crate::exec::goals::GoalSequence;
use crate::exec::outcome::BuildOutcome;
use crate::exec::resolver::{CommandLine, ExecutableResolution};
use crate::exec::spawner::{SpawnedProcess, spawn_process};
use crate::types::{BuildTool, Platform};

/// Runs build-tool goals for a single project directory.
///
/// The executable is resolved once, at construction. Each call to
/// [`run`](Self::run) or [`build`](Self::build) supervises exactly one child
/// process; concurrent calls against the same directory must be serialised
/// by the caller.
#[derive(Debug, Clone)]
pub struct BuildExecutor {
    base_dir: PathBuf,
    tool: BuildTool,
    resolution: ExecutableResolution,
    success_marker: String,
    tee: bool,
}

/// A successful build: the captured process output plus its classification.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub result: ProcessResult,
    pub outcome: BuildOutcome,
}

impl BuildExecutor {
    pub fn new(base_dir: impl Into<PathBuf>, tool: BuildTool) -> Result<Self> {
        Self::with_platform(base_dir, tool, Platform::current())
    }

    pub fn with_platform(
        base_dir: impl Into<PathBuf>,
        tool: BuildTool,
        platform: Platform,
    ) -> Result<Self> {
        let base_dir = base_dir.into();
        if !base_dir.is_dir() {
            return Err(BundleError::ConfigError(format!(
                "project directory {:?} does not exist",
                base_dir
            )));
        }

        let resolution = ExecutableResolution::resolve(&base_dir, tool, platform);

        Ok(Self {
            base_dir,
            tool,
            resolution,
            success_marker: tool.success_marker().to_string(),
            tee: false,
        })
    }

    /// Echo build output to the console while capturing it.
    pub fn tee(mut self, tee: bool) -> Self {
        self.tee = tee;
        self
    }

    /// Override the tool's default success marker.
    pub fn success_marker(mut self, marker: impl Into<String>) -> Self {
        self.success_marker = marker.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn tool(&self) -> BuildTool {
        self.tool
    }

    pub fn resolution(&self) -> &ExecutableResolution {
        &self.resolution
    }

    pub fn marker(&self) -> &str {
        &self.success_marker
    }

    pub fn is_tee(&self) -> bool {
        self.tee
    }

    pub fn command_line(&self, goals: &GoalSequence) -> CommandLine {
        self.resolution.command_line(goals)
    }

    /// Start `goals` without waiting for them, for callers that manage the
    /// process lifetime themselves (e.g. the watch loop).
    pub fn spawn(&self, goals: &GoalSequence) -> Result<SpawnedProcess> {
        spawn_process(&self.command_line(goals), &self.base_dir)
    }

    /// Run `goals` to completion and return everything the process printed.
    ///
    /// Only fails if the process could not be started; a failing build is
    /// still an `Ok` result here. Use [`build`](Self::build) for classified
    /// results.
    pub async fn run(&self, goals: &GoalSequence) -> Result<ProcessResult> {
        let process = self.spawn(goals)?;
        let handle = start_drain(process, DrainOptions { tee: self.tee });
        handle.wait().await
    }

    /// Run `goals` and require the build to succeed.
    ///
    /// On failure the error carries the project path, the exact command line
    /// and the combined stdout+stderr of the build.
    pub async fn build(&self, goals: &GoalSequence) -> Result<BuildReport> {
        let result = self.run(goals).await?;
        let outcome = BuildOutcome::classify(&result, &self.success_marker);

        if !outcome.success() {
            error!(
                project = %self.base_dir.display(),
                cmd = %result.command(),
                exit_code = outcome.exit_code,
                marker_found = outcome.marker_found,
                "build failed"
            );
            return Err(BundleError::BuildFailure {
                project: self.base_dir.clone(),
                command: result.command().to_string(),
                exit_code: outcome.exit_code,
                reason: outcome.describe(),
                output: result.combined_output(),
            });
        }

        info!(
            project = %self.base_dir.display(),
            goals = %goals,
            "build succeeded"
        );

        Ok(BuildReport { result, outcome })
    }
}
