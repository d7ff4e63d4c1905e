// src/watch/session.rs

use std::fmt;

use tokio::io::{AsyncRead, BufReader};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::deploy::{DeployReport, Deployer};
use crate::errors::{BundleError, Result};
use crate::exec::drain::{CaptureSource, EXIT_CODE_UNAVAILABLE, Echo, next_line_lossy};
use crate::exec::{BuildExecutor, GoalSequence};
use crate::watch::trigger::{DeployStats, watch_output};

/// Lifecycle of one watch session.
///
/// `Idle → Building → Deploying → Watching → (Deploying → Watching)* → Stopped`
///
/// The repeated `Deploying` phases run on the deploy worker while the
/// session itself stays in `Watching`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Building,
    Deploying,
    Watching,
    Stopped,
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WatchState::Idle => "idle",
            WatchState::Building => "building",
            WatchState::Deploying => "deploying",
            WatchState::Watching => "watching",
            WatchState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Why the watching phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The long-running build exited on its own (or was killed externally).
    ProcessExited { exit_code: i32 },
    /// The caller fired the stop signal; the child was killed.
    StopRequested,
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Goals for the initial full build (e.g. `clean package`).
    pub goals: GoalSequence,
    /// Goals for the long-running incremental build.
    pub watch_goals: GoalSequence,
}

/// What happened during a watch session that ran to `Stopped`.
#[derive(Debug, Clone)]
pub struct WatchSummary {
    pub stop_reason: StopReason,
    pub initial_deployed: usize,
    pub redeploys: DeployStats,
    pub history: Vec<WatchState>,
}

/// Build once, deploy, then keep a continuous build running and redeploy on
/// every successful rebuild.
#[derive(Debug)]
pub struct WatchLoop {
    executor: BuildExecutor,
    options: WatchOptions,
    state: WatchState,
    history: Vec<WatchState>,
}

impl WatchLoop {
    pub fn new(executor: BuildExecutor, options: WatchOptions) -> Self {
        Self {
            executor,
            options,
            state: WatchState::Idle,
            history: vec![WatchState::Idle],
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    fn transition(&mut self, next: WatchState) {
        info!(from = %self.state, to = %next, "watch session state change");
        self.state = next;
        self.history.push(next);
    }

    fn fail(&mut self, err: BundleError) -> BundleError {
        self.transition(WatchState::Stopped);
        err
    }

    /// Run the whole session.
    ///
    /// Returns an error if the initial build or deploy fails, or if the
    /// watch process cannot be started. Once watching, only the child
    /// exiting or `stop` firing ends the session; deploy failures are logged
    /// and watching continues. If `stop`'s sender is dropped without sending,
    /// the session simply runs until the child exits.
    pub async fn run<D>(
        mut self,
        mut deployer: D,
        mut stop: oneshot::Receiver<()>,
    ) -> Result<WatchSummary>
    where
        D: Deployer + 'static,
    {
        self.transition(WatchState::Building);
        if let Err(e) = self.executor.build(&self.options.goals).await {
            return Err(self.fail(e));
        }

        self.transition(WatchState::Deploying);
        let initial = match deployer.deploy().await.and_then(DeployReport::into_result) {
            Ok(report) => report,
            Err(e) => return Err(self.fail(e)),
        };
        info!(deployed = initial.deployed.len(), "initial deploy finished");

        let process = match self.executor.spawn(&self.options.watch_goals) {
            Ok(p) => p,
            Err(e) => return Err(self.fail(e)),
        };
        self.transition(WatchState::Watching);

        let command = process.command().to_string();
        let (mut child, stdout, stderr) = process.into_parts();
        let tee = self.executor.is_tee();

        // The watch process may run for hours: stderr is logged, not kept.
        let stderr_task =
            stderr.map(|s| tokio::spawn(log_stream(s, Echo::console(CaptureSource::Stderr, tee))));

        let Some(stdout) = stdout else {
            stop_stderr_logger(stderr_task);
            return Err(self.fail(BundleError::StreamCapture {
                command,
                stream: CaptureSource::Stdout.to_string(),
                message: "stdout not captured".to_string(),
            }));
        };
        let trigger = watch_output(stdout, self.executor.marker().to_string(), deployer, tee);

        let mut stop_closed = false;
        let stop_reason = loop {
            tokio::select! {
                status = child.wait() => {
                    let exit_code = match status {
                        Ok(s) => s.code().unwrap_or(EXIT_CODE_UNAVAILABLE),
                        Err(e) => {
                            warn!(cmd = %command, error = %e, "waiting for watch process failed");
                            EXIT_CODE_UNAVAILABLE
                        }
                    };
                    info!(cmd = %command, exit_code, "watch process exited");
                    break StopReason::ProcessExited { exit_code };
                }
                res = &mut stop, if !stop_closed => {
                    match res {
                        Ok(()) => {
                            info!(cmd = %command, "stop requested; killing watch process");
                            if let Err(e) = child.kill().await {
                                warn!(cmd = %command, error = %e, "failed to kill watch process");
                            }
                            break StopReason::StopRequested;
                        }
                        Err(_) => {
                            debug!("stop channel closed without a stop request");
                            stop_closed = true;
                        }
                    }
                }
            }
        };

        let redeploys = match stop_reason {
            StopReason::StopRequested => trigger.stop().await,
            StopReason::ProcessExited { .. } => trigger.finish().await,
        };
        stop_stderr_logger(stderr_task);

        self.transition(WatchState::Stopped);
        info!(
            redeploys = redeploys.deploys(),
            failed = redeploys.failed,
            coalesced = redeploys.coalesced,
            "watch session ended"
        );

        Ok(WatchSummary {
            stop_reason,
            initial_deployed: initial.deployed.len(),
            redeploys,
            history: self.history,
        })
    }
}

async fn log_stream<R>(stream: R, mut echo: Echo)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        match next_line_lossy(&mut reader, &mut buf).await {
            Ok(Some(line)) => {
                debug!("watch stderr: {}", line);
                echo.line(&line);
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "reading watch process stderr failed");
                break;
            }
        }
    }
}

fn stop_stderr_logger(task: Option<JoinHandle<()>>) {
    if let Some(task) = task {
        task.abort();
    }
}
