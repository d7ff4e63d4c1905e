// src/exec/resolver.rs

//! Executable resolution: wrapper script vs. globally installed tool.

use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::exec::goals::GoalSequence;
use crate::types::{BuildTool, Platform};

/// Outcome of resolving which build tool executable to run for a project.
///
/// Computed once per executor and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableResolution {
    executable: String,
    platform: Platform,
    is_wrapper: bool,
}

impl ExecutableResolution {
    /// Resolve the executable for `tool` in `base_dir`.
    ///
    /// Prefers the project-local wrapper when it exists and its canonical
    /// path can be resolved; otherwise falls back to the global command.
    /// The canonical path never carries a `\\?\` verbatim prefix, which
    /// `cmd.exe` cannot run. Never fails.
    pub fn resolve(base_dir: &Path, tool: BuildTool, platform: Platform) -> Self {
        let wrapper = base_dir.join(tool.wrapper_name(platform));

        if wrapper.is_file() {
            match dunce::canonicalize(&wrapper) {
                Ok(path) => {
                    debug!(wrapper = %path.display(), "using project-local build wrapper");
                    return Self {
                        executable: path.to_string_lossy().into_owned(),
                        platform,
                        is_wrapper: true,
                    };
                }
                Err(e) => {
                    warn!(
                        wrapper = %wrapper.display(),
                        error = %e,
                        "wrapper script present but its path could not be resolved"
                    );
                }
            }
        }

        let fallback = tool.fallback_command(platform);
        warn!(
            project = %base_dir.display(),
            fallback,
            "no {} wrapper found; falling back to globally installed `{}`",
            tool.wrapper_name(platform),
            fallback
        );

        Self {
            executable: fallback.to_string(),
            platform,
            is_wrapper: false,
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn is_wrapper(&self) -> bool {
        self.is_wrapper
    }

    /// Whether the invocation must be prefixed with `cmd.exe /c`.
    pub fn needs_shell(&self) -> bool {
        self.platform.needs_shell()
    }

    /// Full command line for running `goals` with this executable.
    pub fn command_line(&self, goals: &GoalSequence) -> CommandLine {
        let mut args = Vec::new();
        let program = if self.needs_shell() {
            args.push("/c".to_string());
            args.push(self.executable.clone());
            "cmd.exe".to_string()
        } else {
            self.executable.clone()
        };
        args.extend(goals.iter().map(str::to_string));

        CommandLine { program, args }
    }
}

/// A program plus its arguments, ready to hand to the spawner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new<P: Into<String>>(program: P, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
