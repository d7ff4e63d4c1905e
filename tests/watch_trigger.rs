// tests/watch_trigger.rs
//
// Marker-driven redeploys against a simulated build output stream.

mod common;
use crate::common::{init_tracing, with_timeout};

use std::time::Duration;

use bundlewatch::watch::watch_output;
use bundlewatch_test_utils::fake_deployer::RecordingDeployer;
use tokio::io::AsyncWriteExt;

const MARKER: &str = "BUILD SUCCESS";

#[tokio::test]
async fn two_markers_trigger_two_sequential_deploys() {
    init_tracing();

    let (mut writer, reader) = tokio::io::duplex(4096);
    let deployer = RecordingDeployer::new().with_delay(Duration::from_millis(100));
    let probe = deployer.clone();

    let handle = watch_output(reader, MARKER.to_string(), deployer, false);

    writer
        .write_all(b"[INFO] Scanning for projects...\n[INFO] Compiling 3 source files\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(probe.call_count(), 0, "no deploy before the first marker");

    writer.write_all(b"[INFO] BUILD SUCCESS\n").await.unwrap();
    writer
        .write_all(b"[INFO] Changes detected - recompiling\n[INFO] BUILD SUCCESS\n")
        .await
        .unwrap();
    drop(writer);

    let stats = with_timeout(handle.finish()).await;

    assert_eq!(stats.requested, 2);
    assert_eq!(stats.deploys(), 2);
    assert_eq!(stats.succeeded, 2);
    assert_eq!(stats.coalesced, 0);

    let log = probe.log();
    let log = log.lock().unwrap();
    assert_eq!(log.calls, vec![1, 2]);
    assert!(!log.overlapped, "deploys must never run concurrently");
}

#[tokio::test]
async fn markers_during_a_deploy_coalesce_into_one_pending_run() {
    init_tracing();

    let (mut writer, reader) = tokio::io::duplex(4096);
    let deployer = RecordingDeployer::new().with_delay(Duration::from_millis(300));
    let probe = deployer.clone();

    let handle = watch_output(reader, MARKER.to_string(), deployer, false);

    writer.write_all(b"BUILD SUCCESS #1\n").await.unwrap();
    // Let the first deploy start.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(probe.call_count(), 1);

    writer
        .write_all(b"BUILD SUCCESS #2\nBUILD SUCCESS #3\n")
        .await
        .unwrap();
    drop(writer);

    let stats = with_timeout(handle.finish()).await;

    assert_eq!(stats.requested, 3);
    assert_eq!(stats.deploys(), 2);
    assert_eq!(stats.coalesced, 1);
    assert!(!probe.log().lock().unwrap().overlapped);
}

#[tokio::test]
async fn failing_deploy_does_not_end_the_watch() {
    init_tracing();

    let input: &'static [u8] = b"BUILD SUCCESS\nnoise\nBUILD SUCCESS\n";
    let deployer = RecordingDeployer::new().failing_on(&[1]);
    let probe = deployer.clone();

    let handle = watch_output(input, MARKER.to_string(), deployer, false);
    let stats = with_timeout(handle.finish()).await;

    assert_eq!(probe.call_count(), 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.succeeded, 1);
}

#[tokio::test]
async fn stream_without_markers_never_deploys() {
    init_tracing();

    let input: &'static [u8] = b"[INFO] BUILD FAILURE\n[ERROR] compilation error\n";
    let deployer = RecordingDeployer::new();
    let probe = deployer.clone();

    let stats = with_timeout(watch_output(input, MARKER.to_string(), deployer, false).finish()).await;

    assert_eq!(stats.requested, 0);
    assert_eq!(probe.call_count(), 0);
}

#[tokio::test]
async fn stop_returns_while_stream_is_still_open() {
    init_tracing();

    let (mut writer, reader) = tokio::io::duplex(4096);
    let deployer = RecordingDeployer::new();
    let probe = deployer.clone();

    let handle = watch_output(reader, MARKER.to_string(), deployer, false);
    writer.write_all(b"BUILD SUCCESS\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // `writer` stays open: only `stop` can end this.
    let stats = with_timeout(handle.stop()).await;
    assert_eq!(stats.deploys(), 1);
    assert_eq!(probe.call_count(), 1);
    drop(writer);
}
