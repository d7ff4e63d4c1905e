// src/deploy/mod.rs

//! Artifact hand-off to an application server.
//!
//! The build executor never deploys anything itself; callers resolve the
//! produced artifacts and pass them to a [`Deployer`]:
//!
//! - [`artifacts`] finds build outputs under the tool's output directory.
//! - [`local`] copies them into a server's deploy-scan directory.
//! - [`remote`] checks a management endpoint and hands artifacts to an
//!   external installer.
//! - [`hash`] remembers artifact content hashes so unchanged files can be
//!   skipped on redeploy.

pub mod artifacts;
pub mod hash;
pub mod local;
pub mod remote;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::errors::{BundleError, Result};

pub use artifacts::{ArtifactLocator, locate_artifacts};
pub use hash::ArtifactHashes;
pub use local::{LocalCopyDeployer, copy_artifacts};
pub use remote::{BundleInstaller, ManagementEndpoint, RemoteDeployer};

/// Something that can push the current build output to a server.
///
/// Production code uses [`LocalCopyDeployer`] or [`RemoteDeployer`]; tests
/// can provide their own implementation that just records calls.
pub trait Deployer: Send {
    fn deploy(&mut self) -> Pin<Box<dyn Future<Output = Result<DeployReport>> + Send + '_>>;
}

/// Per-artifact results of one deploy.
///
/// Failures are collected rather than aborting the batch.
#[derive(Debug, Default)]
pub struct DeployReport {
    pub deployed: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<BundleError>,
}

impl DeployReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn a report with failures into an error summarising them.
    pub fn into_result(self) -> Result<DeployReport> {
        if self.is_success() {
            return Ok(self);
        }
        let details: Vec<String> = self.failures.iter().map(|e| e.to_string()).collect();
        Err(BundleError::Other(anyhow::anyhow!(
            "{} artifact(s) failed to deploy ({} deployed):\n  {}",
            self.failures.len(),
            self.deployed.len(),
            details.join("\n  ")
        )))
    }
}
