// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `bundlewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bundlewatch",
    version,
    about = "Build application bundles with Maven/Gradle and (re)deploy them to a server.",
    long_about = None
)]
pub struct CliArgs {
    /// Project directory containing `pom.xml` / `build.gradle`.
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub project: PathBuf,

    /// Path to the config file (TOML).
    ///
    /// Default: `Bundlewatch.toml` in the project directory, if present.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUNDLEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Do not echo build tool output while it runs.
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the build tool once.
    Build {
        /// Goals to run instead of the configured ones.
        goals: Vec<String>,

        /// Print the resolved command line without running it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Build, then copy the artifacts into the deploy directory.
    Deploy {
        /// Deploy the artifacts already present without building first.
        #[arg(long)]
        skip_build: bool,
    },

    /// Build and deploy, then redeploy on every successful incremental build.
    Watch,

    /// Check that the configured management endpoint is reachable.
    Check,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_with_goals() {
        let args = CliArgs::try_parse_from([
            "bundlewatch",
            "--project",
            "app",
            "build",
            "clean",
            "install",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.project, PathBuf::from("app"));
        match args.command {
            Command::Build { goals, dry_run } => {
                assert_eq!(goals, vec!["clean", "install"]);
                assert!(dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from(["bundlewatch", "watch", "--quiet", "--log-level", "debug"])
            .unwrap();
        assert!(args.quiet);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(matches!(args.command, Command::Watch));
    }
}
