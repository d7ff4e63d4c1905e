// tests/watch_session.rs
//
// Full watch sessions against a fixture project: build, deploy, then
// redeploy on each success marker of the long-running "watch" goal.
#![cfg(unix)]

mod common;
use crate::common::{FixtureProject, goals, init_tracing, with_timeout};

use std::time::Duration;

use bundlewatch::errors::BundleError;
use bundlewatch::exec::BuildExecutor;
use bundlewatch::types::BuildTool;
use bundlewatch::watch::{StopReason, WatchLoop, WatchOptions, WatchState};
use bundlewatch_test_utils::fake_deployer::RecordingDeployer;
use tokio::sync::oneshot;

fn session(project: &FixtureProject, build: &str, watch: &str) -> WatchLoop {
    let executor = BuildExecutor::new(project.path(), BuildTool::Maven).unwrap();
    let session = WatchLoop::new(
        executor,
        WatchOptions {
            goals: goals(build),
            watch_goals: goals(watch),
        },
    );
    assert_eq!(session.state(), WatchState::Idle);
    session
}

#[tokio::test]
async fn redeploys_once_per_success_marker_until_process_exits() {
    init_tracing();
    let project = FixtureProject::known_good();
    let deployer = RecordingDeployer::new();
    let probe = deployer.clone();

    let (_stop_tx, stop_rx) = oneshot::channel();
    let summary = with_timeout(session(&project, "clean package", "watch").run(deployer, stop_rx))
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::ProcessExited { exit_code: 0 });
    assert_eq!(summary.redeploys.deploys(), 2);
    // Initial deploy plus one per marker.
    assert_eq!(probe.call_count(), 3);
    assert!(!probe.log().lock().unwrap().overlapped);
    assert!(project.artifact_path().is_file());
    assert_eq!(
        summary.history,
        vec![
            WatchState::Idle,
            WatchState::Building,
            WatchState::Deploying,
            WatchState::Watching,
            WatchState::Stopped,
        ]
    );
}

#[tokio::test]
async fn failed_initial_build_stops_without_deploying() {
    init_tracing();
    let project = FixtureProject::known_good();
    let deployer = RecordingDeployer::new();
    let probe = deployer.clone();

    let (_stop_tx, stop_rx) = oneshot::channel();
    let res = with_timeout(session(&project, "clean fail", "watch").run(deployer, stop_rx)).await;

    assert!(matches!(res, Err(BundleError::BuildFailure { .. })));
    assert_eq!(probe.call_count(), 0);
}

#[tokio::test]
async fn failed_initial_deploy_never_starts_watching() {
    init_tracing();
    let project = FixtureProject::known_good();
    let deployer = RecordingDeployer::new().failing_on(&[1]);
    let probe = deployer.clone();

    let (_stop_tx, stop_rx) = oneshot::channel();
    let res = with_timeout(session(&project, "package", "watch").run(deployer, stop_rx)).await;

    assert!(matches!(res, Err(BundleError::DeployPrecondition(_))));
    assert_eq!(probe.call_count(), 1);
}

#[tokio::test]
async fn redeploy_failure_keeps_watching() {
    init_tracing();
    let project = FixtureProject::known_good();
    // Call 1 is the initial deploy; call 2 is the first redeploy.
    let deployer = RecordingDeployer::new().failing_on(&[2]);
    let probe = deployer.clone();

    let (_stop_tx, stop_rx) = oneshot::channel();
    let summary = with_timeout(session(&project, "package", "watch").run(deployer, stop_rx))
        .await
        .unwrap();

    assert_eq!(summary.redeploys.failed, 1);
    assert_eq!(summary.redeploys.succeeded, 1);
    assert_eq!(probe.call_count(), 3);
}

#[tokio::test]
async fn stop_signal_kills_the_watch_process() {
    init_tracing();
    let project = FixtureProject::known_good();
    let deployer = RecordingDeployer::new();

    let (stop_tx, stop_rx) = oneshot::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = stop_tx.send(());
    });

    let summary = with_timeout(session(&project, "package", "forever").run(deployer, stop_rx))
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::StopRequested);
    assert_eq!(summary.redeploys.deploys(), 0);
    assert_eq!(summary.history.last(), Some(&WatchState::Stopped));
}

#[tokio::test]
async fn dropped_stop_sender_waits_for_process_exit() {
    init_tracing();
    let project = FixtureProject::known_good();
    let deployer = RecordingDeployer::new();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    drop(stop_tx);

    let summary = with_timeout(session(&project, "package", "watch").run(deployer, stop_rx))
        .await
        .unwrap();

    assert_eq!(summary.stop_reason, StopReason::ProcessExited { exit_code: 0 });
    assert_eq!(summary.redeploys.deploys(), 2);
}
