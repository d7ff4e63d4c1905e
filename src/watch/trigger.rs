// src/watch/trigger.rs

//! Marker-driven redeploys for a long-running build process.
//!
//! [`watch_output`] splits the work into two Tokio tasks:
//!
//! - the *reader* consumes the build's stdout line by line and, for each
//!   line containing the success marker, records a deploy request; it never
//!   waits on a deploy, so the child's pipe keeps draining;
//! - the *deploy worker* runs deploys one at a time, in request order.
//!   Requests that pile up while a deploy is running collapse into a single
//!   follow-up deploy.
//!
//! Pending requests are a counter, not a queue: a stuck deploy never makes
//! the backlog grow.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::io::{AsyncRead, BufReader};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::deploy::Deployer;
use crate::exec::drain::{CaptureSource, Echo, next_line_lossy};

/// How long to wait for the reader to hit EOF once the process is gone.
const READER_GRACE: Duration = Duration::from_secs(5);

/// Counters for one watch session's redeploys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployStats {
    /// Success markers seen in the output.
    pub requested: usize,
    /// Deploys that returned without error.
    pub succeeded: usize,
    /// Deploys that failed or reported per-artifact failures.
    pub failed: usize,
    /// Requests folded into another pending deploy.
    pub coalesced: usize,
}

impl DeployStats {
    pub fn deploys(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Deploy requests shared between the reader and the worker.
#[derive(Debug, Default)]
struct DeployRequests {
    pending: AtomicUsize,
    closed: AtomicBool,
    wake: Notify,
}

impl DeployRequests {
    /// Wait for a request and take exactly one. `false` once the reader is
    /// gone and nothing is pending.
    async fn next(&self) -> bool {
        loop {
            let woken = self.wake.notified();
            // Single consumer: nobody else can decrement between load and sub.
            if self.pending.load(Ordering::SeqCst) > 0 {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                return true;
            }
            if self.closed.load(Ordering::SeqCst) {
                return false;
            }
            woken.await;
        }
    }

    /// Take every pending request at once.
    fn take_all(&self) -> usize {
        self.pending.swap(0, Ordering::SeqCst)
    }
}

/// Reader side of [`DeployRequests`]. Dropping it (including by aborting the
/// reader task) closes the requests.
#[derive(Debug)]
struct RequestSender(Arc<DeployRequests>);

impl RequestSender {
    fn request(&self) {
        self.0.pending.fetch_add(1, Ordering::SeqCst);
        self.0.wake.notify_one();
    }
}

impl Drop for RequestSender {
    fn drop(&mut self) {
        self.0.closed.store(true, Ordering::SeqCst);
        self.0.wake.notify_one();
    }
}

/// Running reader/worker pair returned by [`watch_output`].
#[derive(Debug)]
pub struct TriggerHandle {
    reader: JoinHandle<()>,
    worker: JoinHandle<DeployStats>,
}

impl TriggerHandle {
    /// Wait for the stream to end (bounded by a grace period), then for any
    /// queued deploys to finish.
    pub async fn finish(mut self) -> DeployStats {
        match tokio::time::timeout(READER_GRACE, &mut self.reader).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "watch output reader ended abnormally"),
            Err(_) => {
                warn!("watch output still open after process exit; abandoning reader");
                self.reader.abort();
            }
        }
        join_worker(self.worker).await
    }

    /// Stop reading immediately and wait for the deploy in flight (plus at
    /// most one pending deploy) to finish.
    pub async fn stop(self) -> DeployStats {
        self.reader.abort();
        join_worker(self.worker).await
    }
}

async fn join_worker(worker: JoinHandle<DeployStats>) -> DeployStats {
    match worker.await {
        Ok(stats) => stats,
        Err(e) => {
            warn!(error = %e, "deploy worker ended abnormally");
            DeployStats::default()
        }
    }
}

/// Watch `stream` for lines containing `marker` and run `deployer` once per
/// marker, never concurrently.
///
/// Deploy errors are logged and do not stop the watch; only the end of the
/// stream does.
pub fn watch_output<R, D>(stream: R, marker: String, deployer: D, tee: bool) -> TriggerHandle
where
    R: AsyncRead + Unpin + Send + 'static,
    D: Deployer + 'static,
{
    let requests = Arc::new(DeployRequests::default());
    let sender = RequestSender(Arc::clone(&requests));
    let echo = Echo::console(CaptureSource::Stdout, tee);

    let reader = tokio::spawn(async move { read_markers(stream, &marker, echo, sender).await });
    let worker = tokio::spawn(deploy_worker(requests, deployer));

    TriggerHandle { reader, worker }
}

async fn read_markers<R>(stream: R, marker: &str, mut echo: Echo, requests: RequestSender)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        match next_line_lossy(&mut reader, &mut buf).await {
            Ok(Some(line)) => {
                trace!("watch stdout: {}", line);
                echo.line(&line);
                if line.contains(marker) {
                    debug!("success marker seen; requesting deploy");
                    requests.request();
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "reading watch output failed");
                break;
            }
        }
    }

    debug!("watch output reader ended");
}

async fn deploy_worker<D: Deployer>(requests: Arc<DeployRequests>, mut deployer: D) -> DeployStats {
    let mut stats = DeployStats::default();

    while requests.next().await {
        stats.requested += 1;
        run_deploy(&mut deployer, &mut stats).await;

        // Everything that arrived during the deploy becomes one more run.
        loop {
            let pending = requests.take_all();
            if pending == 0 {
                break;
            }
            stats.requested += pending;
            stats.coalesced += pending - 1;
            if pending > 1 {
                info!(coalesced = pending - 1, "coalesced redeploy requests");
            }
            run_deploy(&mut deployer, &mut stats).await;
        }
    }

    stats
}

async fn run_deploy<D: Deployer>(deployer: &mut D, stats: &mut DeployStats) {
    match deployer.deploy().await {
        Ok(report) if report.is_success() => {
            stats.succeeded += 1;
            info!(
                deployed = report.deployed.len(),
                skipped = report.skipped.len(),
                "redeploy finished"
            );
        }
        Ok(report) => {
            stats.failed += 1;
            for failure in &report.failures {
                error!(error = %failure, "redeploy partially failed");
            }
        }
        Err(e) => {
            stats.failed += 1;
            error!(error = %e, "redeploy failed");
        }
    }
}
