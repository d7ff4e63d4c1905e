use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bundlewatch::deploy::{DeployReport, Deployer};
use bundlewatch::errors::{BundleError, Result};

/// What the fake deployer observed.
#[derive(Debug, Default)]
pub struct DeployLog {
    /// 1-based call numbers, in the order the deploys started.
    pub calls: Vec<usize>,
    /// Set if a deploy started while another was still running.
    pub overlapped: bool,
}

/// A deployer that:
/// - records each call (and whether calls overlapped)
/// - optionally sleeps to simulate a slow copy
/// - optionally fails selected calls.
#[derive(Clone)]
pub struct RecordingDeployer {
    log: Arc<Mutex<DeployLog>>,
    in_flight: Arc<AtomicBool>,
    delay: Duration,
    fail_calls: Vec<usize>,
}

impl RecordingDeployer {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(DeployLog::default())),
            in_flight: Arc::new(AtomicBool::new(false)),
            delay: Duration::ZERO,
            fail_calls: Vec::new(),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make the given 1-based calls return an error.
    pub fn failing_on(mut self, calls: &[usize]) -> Self {
        self.fail_calls = calls.to_vec();
        self
    }

    pub fn log(&self) -> Arc<Mutex<DeployLog>> {
        Arc::clone(&self.log)
    }

    pub fn call_count(&self) -> usize {
        self.log.lock().unwrap().calls.len()
    }
}

impl Default for RecordingDeployer {
    fn default() -> Self {
        Self::new()
    }
}

impl Deployer for RecordingDeployer {
    fn deploy(&mut self) -> Pin<Box<dyn Future<Output = Result<DeployReport>> + Send + '_>> {
        Box::pin(async move {
            if self.in_flight.swap(true, Ordering::SeqCst) {
                self.log.lock().unwrap().overlapped = true;
            }

            let call = {
                let mut log = self.log.lock().unwrap();
                let n = log.calls.len() + 1;
                log.calls.push(n);
                n
            };

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            self.in_flight.store(false, Ordering::SeqCst);

            if self.fail_calls.contains(&call) {
                return Err(BundleError::DeployPrecondition(format!(
                    "simulated failure on call {call}"
                )));
            }
            Ok(DeployReport::default())
        })
    }
}
