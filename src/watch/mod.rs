// src/watch/mod.rs

//! Watch mode: build, deploy, then redeploy on every successful rebuild of a
//! long-running build process.
//!
//! - [`session`] owns the state machine (`WatchLoop`) and the child process.
//! - [`trigger`] turns success markers in the child's stdout into serialized,
//!   coalesced deploys.

pub mod session;
pub mod trigger;

pub use session::{StopReason, WatchLoop, WatchOptions, WatchState, WatchSummary};
pub use trigger::{DeployStats, TriggerHandle, watch_output};
