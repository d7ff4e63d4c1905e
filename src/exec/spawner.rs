// src/exec/spawner.rs

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::info;

use crate::errors::{BundleError, Result};
use crate::exec::resolver::CommandLine;

/// A freshly started child with both output pipes still attached.
#[derive(Debug)]
pub struct SpawnedProcess {
    command: String,
    child: Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl SpawnedProcess {
    /// Rendered command line, for diagnostics.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Split into the child handle and its two output pipes.
    pub fn into_parts(self) -> (Child, Option<ChildStdout>, Option<ChildStderr>) {
        (self.child, self.stdout, self.stderr)
    }
}

/// Start exactly one child process running `command` inside `working_dir`.
///
/// stdout and stderr are piped; stdin is closed. The child is killed if its
/// handle is dropped, so an abandoned session never leaves an orphan behind.
pub fn spawn_process(command: &CommandLine, working_dir: &Path) -> Result<SpawnedProcess> {
    let rendered = command.to_string();

    info!(cmd = %rendered, cwd = %working_dir.display(), "starting build tool process");

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| BundleError::SpawnFailure {
        command: rendered.clone(),
        source,
    })?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    Ok(SpawnedProcess {
        command: rendered,
        child,
        stdout,
        stderr,
    })
}
