// src/deploy/remote.rs

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{error, info};

use crate::deploy::artifacts::ArtifactLocator;
use crate::deploy::{DeployReport, Deployer};
use crate::errors::{BundleError, Result};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Host/port of an application server's management channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementEndpoint {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
}

impl ManagementEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Check that the endpoint accepts TCP connections.
    ///
    /// Not retried: a failure here means the session should not start.
    pub async fn preflight(&self) -> Result<()> {
        let addr = (self.host.as_str(), self.port);
        match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => {
                info!(endpoint = %self, "management endpoint reachable");
                Ok(())
            }
            Ok(Err(e)) => Err(BundleError::Connectivity {
                endpoint: self.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(BundleError::Connectivity {
                endpoint: self.to_string(),
                message: format!("timed out after {:?}", self.connect_timeout),
            }),
        }
    }
}

impl fmt::Display for ManagementEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Installs or updates one bundle on a remote server.
///
/// The install protocol lives outside bundlewatch; implementations wrap
/// whatever management client the server speaks.
pub trait BundleInstaller: Send {
    fn install<'a>(
        &'a mut self,
        endpoint: &'a ManagementEndpoint,
        artifact: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Deploys by handing each artifact to a [`BundleInstaller`] after checking
/// that the management endpoint is reachable.
pub struct RemoteDeployer<I: BundleInstaller> {
    locator: ArtifactLocator,
    endpoint: ManagementEndpoint,
    installer: I,
}

impl<I: BundleInstaller> fmt::Debug for RemoteDeployer<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDeployer")
            .field("locator", &self.locator)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl<I: BundleInstaller> RemoteDeployer<I> {
    pub fn new(locator: ArtifactLocator, endpoint: ManagementEndpoint, installer: I) -> Self {
        Self {
            locator,
            endpoint,
            installer,
        }
    }

    async fn deploy_inner(&mut self) -> Result<DeployReport> {
        self.endpoint.preflight().await?;
        let artifacts = self.locator.locate()?;

        let mut report = DeployReport::default();
        for artifact in artifacts {
            match self.installer.install(&self.endpoint, &artifact).await {
                Ok(()) => {
                    info!(artifact = %artifact.display(), endpoint = %self.endpoint, "bundle installed");
                    report.deployed.push(artifact);
                }
                Err(e) => {
                    error!(artifact = %artifact.display(), error = %e, "bundle install failed");
                    report.failures.push(e);
                }
            }
        }
        Ok(report)
    }
}

impl<I: BundleInstaller> Deployer for RemoteDeployer<I> {
    fn deploy(&mut self) -> Pin<Box<dyn Future<Output = Result<DeployReport>> + Send + '_>> {
        Box::pin(self.deploy_inner())
    }
}
