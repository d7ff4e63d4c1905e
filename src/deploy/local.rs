// src/deploy/local.rs

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::{error, info};

use crate::deploy::artifacts::ArtifactLocator;
use crate::deploy::hash::ArtifactHashes;
use crate::deploy::{DeployReport, Deployer};
use crate::errors::{BundleError, Result};

/// Copy each artifact into `deploy_dir`, keeping its file name.
///
/// A failed copy is recorded in the report and the remaining artifacts are
/// still copied.
pub async fn copy_artifacts(artifacts: &[PathBuf], deploy_dir: &Path) -> DeployReport {
    let mut report = DeployReport::default();

    for artifact in artifacts {
        match copy_one(artifact, deploy_dir).await {
            Ok(dest) => {
                info!(artifact = %artifact.display(), dest = %dest.display(), "artifact copied");
                report.deployed.push(dest);
            }
            Err(e) => {
                error!(artifact = %artifact.display(), error = %e, "artifact copy failed");
                report.failures.push(e);
            }
        }
    }

    report
}

async fn copy_one(artifact: &Path, deploy_dir: &Path) -> Result<PathBuf> {
    let name = artifact
        .file_name()
        .ok_or_else(|| BundleError::ArtifactCopy {
            artifact: artifact.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
        })?;
    let dest = deploy_dir.join(name);

    tokio::fs::copy(artifact, &dest)
        .await
        .map_err(|source| BundleError::ArtifactCopy {
            artifact: artifact.to_path_buf(),
            source,
        })?;

    Ok(dest)
}

/// Deploys by dropping artifacts into a server's deploy-scan directory.
#[derive(Debug)]
pub struct LocalCopyDeployer {
    locator: ArtifactLocator,
    deploy_dir: PathBuf,
    skip_unchanged: bool,
    hashes: ArtifactHashes,
}

impl LocalCopyDeployer {
    /// Fails if `deploy_dir` is not an existing directory.
    pub fn new(locator: ArtifactLocator, deploy_dir: impl Into<PathBuf>) -> Result<Self> {
        let deploy_dir = deploy_dir.into();
        ensure_deploy_dir(&deploy_dir)?;
        Ok(Self {
            locator,
            deploy_dir,
            skip_unchanged: false,
            hashes: ArtifactHashes::new(),
        })
    }

    /// Only copy artifacts whose content changed since the last deploy.
    pub fn skip_unchanged(mut self, skip: bool) -> Self {
        self.skip_unchanged = skip;
        self
    }

    pub fn deploy_dir(&self) -> &Path {
        &self.deploy_dir
    }

    async fn deploy_inner(&mut self) -> Result<DeployReport> {
        // The directory may have vanished since construction.
        ensure_deploy_dir(&self.deploy_dir)?;
        let artifacts = self.locator.locate()?;

        if !self.skip_unchanged {
            return Ok(copy_artifacts(&artifacts, &self.deploy_dir).await);
        }

        let mut to_copy = Vec::new();
        let mut fresh_hashes = Vec::new();
        let mut skipped = Vec::new();
        for artifact in artifacts {
            let (changed, hash) = self.hashes.check(&artifact)?;
            if changed {
                fresh_hashes.push((artifact.clone(), hash));
                to_copy.push(artifact);
            } else {
                info!(artifact = %artifact.display(), "artifact unchanged; skipping");
                skipped.push(artifact);
            }
        }

        let mut report = copy_artifacts(&to_copy, &self.deploy_dir).await;
        report.skipped = skipped;

        let failed: Vec<PathBuf> = report
            .failures
            .iter()
            .filter_map(|e| match e {
                BundleError::ArtifactCopy { artifact, .. } => Some(artifact.clone()),
                _ => None,
            })
            .collect();
        for (artifact, hash) in fresh_hashes {
            if !failed.contains(&artifact) {
                self.hashes.record(&artifact, hash);
            }
        }

        Ok(report)
    }
}

impl Deployer for LocalCopyDeployer {
    fn deploy(&mut self) -> Pin<Box<dyn Future<Output = Result<DeployReport>> + Send + '_>> {
        Box::pin(self.deploy_inner())
    }
}

fn ensure_deploy_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(BundleError::DeployPrecondition(format!(
            "deploy directory {:?} does not exist",
            dir
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn locator(dir: &Path) -> ArtifactLocator {
        ArtifactLocator::new(dir, vec!["*.jar".to_string()])
    }

    #[tokio::test]
    async fn one_failed_copy_does_not_stop_the_batch() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        let first = src.path().join("first.jar");
        let second = src.path().join("second.jar");
        let third = src.path().join("third.jar");
        fs::write(&first, b"1").unwrap();
        fs::write(&third, b"3").unwrap();
        // `second` is never created, so copying it fails.

        let report = copy_artifacts(&[first, second.clone(), third], dest.path()).await;

        assert_eq!(report.deployed.len(), 2);
        assert!(dest.path().join("first.jar").is_file());
        assert!(dest.path().join("third.jar").is_file());
        assert!(!dest.path().join("second.jar").exists());

        assert_eq!(report.failures.len(), 1);
        match &report.failures[0] {
            BundleError::ArtifactCopy { artifact, .. } => assert_eq!(artifact, &second),
            other => panic!("unexpected failure {other:?}"),
        }
        assert!(report.into_result().is_err());
    }

    #[test]
    fn missing_deploy_dir_is_precondition_failure() {
        let src = tempfile::tempdir().unwrap();
        let res = LocalCopyDeployer::new(locator(src.path()), src.path().join("nope"));
        assert!(matches!(res, Err(BundleError::DeployPrecondition(_))));
    }

    #[tokio::test]
    async fn skip_unchanged_copies_only_modified_artifacts() {
        let src = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.jar"), b"a1").unwrap();
        fs::write(src.path().join("b.jar"), b"b1").unwrap();

        let mut deployer = LocalCopyDeployer::new(locator(src.path()), dest.path())
            .unwrap()
            .skip_unchanged(true);

        let first = deployer.deploy().await.unwrap();
        assert_eq!(first.deployed.len(), 2);
        assert!(first.skipped.is_empty());

        fs::write(src.path().join("b.jar"), b"b2").unwrap();
        let second = deployer.deploy().await.unwrap();
        assert_eq!(second.deployed, vec![dest.path().join("b.jar")]);
        assert_eq!(second.skipped, vec![src.path().join("a.jar")]);
        assert_eq!(fs::read(dest.path().join("b.jar")).unwrap(), b"b2");
    }
}
