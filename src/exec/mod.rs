// src/exec/mod.rs

//! Build-tool process execution.
//!
//! Bottom-up:
//! - [`resolver`] picks the executable (wrapper script or global command) and
//!   builds the platform-specific command line.
//! - [`goals`] holds the ordered goal list passed to one invocation.
//! - [`spawner`] starts the child with piped output.
//! - [`drain`] captures stdout/stderr/exit code concurrently and exposes a
//!   single join barrier.
//! - [`outcome`] classifies a finished process as a successful build or not.
//! - [`executor`] ties the above together into `run` / `build`.

pub mod drain;
pub mod executor;
pub mod goals;
pub mod outcome;
pub mod resolver;
pub mod spawner;

pub use drain::{
    CaptureFailure, CaptureSource, DrainHandle, DrainOptions, EXIT_CODE_UNAVAILABLE, ProcessResult,
    start_drain,
};
pub use executor::{BuildExecutor, BuildReport};
pub use goals::GoalSequence;
pub use outcome::BuildOutcome;
pub use resolver::{CommandLine, ExecutableResolution};
pub use spawner::{SpawnedProcess, spawn_process};
