// src/lib.rs

pub mod cli;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::Path;

use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, load_for_project};
use crate::deploy::{ArtifactLocator, Deployer, LocalCopyDeployer};
use crate::errors::{BundleError, Result};
use crate::exec::{BuildExecutor, GoalSequence};
use crate::watch::{StopReason, WatchLoop, WatchOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the build executor
/// - the deployer and management-endpoint preflight
/// - the watch loop and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let project = std::fs::canonicalize(&args.project).map_err(|e| {
        BundleError::ConfigError(format!("project directory {:?}: {e}", args.project))
    })?;
    let cfg = load_for_project(&project, args.config.as_deref())?;

    let executor = BuildExecutor::new(&project, cfg.tool)?
        .success_marker(cfg.success_marker.clone())
        .tee(cfg.tee && !args.quiet);

    match args.command {
        Command::Build { goals, dry_run } => {
            let goals = if goals.is_empty() {
                cfg.goals.clone()
            } else {
                GoalSequence::new(goals)?
            };

            if dry_run {
                print_dry_run(&cfg, &executor, &goals);
                return Ok(());
            }

            executor.build(&goals).await?;
            Ok(())
        }

        Command::Deploy { skip_build } => {
            preflight(&cfg).await?;
            let mut deployer = local_deployer(&cfg, &project)?;

            if !skip_build {
                executor.build(&cfg.goals).await?;
            }

            let report = deployer.deploy().await?.into_result()?;
            info!(deployed = report.deployed.len(), "deploy finished");
            Ok(())
        }

        Command::Watch => {
            preflight(&cfg).await?;
            let deployer = local_deployer(&cfg, &project)?;

            let (stop_tx, stop_rx) = oneshot::channel::<()>();
            tokio::spawn(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                    return;
                }
                let _ = stop_tx.send(());
            });

            let session = WatchLoop::new(
                executor,
                WatchOptions {
                    goals: cfg.goals.clone(),
                    watch_goals: cfg.watch_goals.clone(),
                },
            );
            let summary = session.run(deployer, stop_rx).await?;

            info!(
                redeploys = summary.redeploys.deploys(),
                failed = summary.redeploys.failed,
                "watch finished"
            );
            if let StopReason::ProcessExited { exit_code } = summary.stop_reason {
                if exit_code != 0 {
                    warn!(exit_code, "watch build process exited with an error");
                }
            }
            Ok(())
        }

        Command::Check => match &cfg.server {
            Some(endpoint) => {
                endpoint.preflight().await?;
                println!("{endpoint} is reachable");
                Ok(())
            }
            None => Err(BundleError::DeployPrecondition(
                "no [server] section configured; nothing to check".to_string(),
            )),
        },
    }
}

/// Refuse to start a deploy/watch session if the configured management
/// endpoint is down.
async fn preflight(cfg: &ConfigFile) -> Result<()> {
    match &cfg.server {
        Some(endpoint) => endpoint.preflight().await,
        None => Ok(()),
    }
}

fn local_deployer(cfg: &ConfigFile, project: &Path) -> Result<LocalCopyDeployer> {
    let deploy_dir = cfg.deploy.deploy_dir.clone().ok_or_else(|| {
        BundleError::DeployPrecondition("[deploy].deploy_dir is not set".to_string())
    })?;

    let locator = match &cfg.deploy.output_dir {
        Some(dir) => ArtifactLocator::new(dir.clone(), cfg.deploy.artifacts.clone()),
        None => ArtifactLocator::for_tool(project, cfg.tool, cfg.deploy.artifacts.clone()),
    };

    Ok(LocalCopyDeployer::new(locator, deploy_dir)?.skip_unchanged(cfg.deploy.skip_unchanged))
}

/// Print what `build` would run, without running it.
fn print_dry_run(cfg: &ConfigFile, executor: &BuildExecutor, goals: &GoalSequence) {
    let resolution = executor.resolution();
    println!("bundlewatch dry-run");
    println!("  project = {}", executor.base_dir().display());
    println!("  tool = {:?}", cfg.tool);
    println!(
        "  executable = {} ({})",
        resolution.executable(),
        if resolution.is_wrapper() {
            "project wrapper"
        } else {
            "global fallback"
        }
    );
    println!("  success_marker = {:?}", executor.marker());
    println!("  command = {}", executor.command_line(goals));
    println!("  watch_command = {}", executor.command_line(&cfg.watch_goals));
    if let Some(dir) = &cfg.deploy.deploy_dir {
        println!("  deploy_dir = {}", dir.display());
    }
    if let Some(endpoint) = &cfg.server {
        println!("  server = {endpoint}");
    }
}
