// src/exec/drain.rs

//! Concurrent draining of a child's stdout/stderr plus exit-code capture.
//!
//! Three independent Tokio tasks run per process:
//! - one reads stdout to EOF,
//! - one reads stderr to EOF,
//! - one waits for the exit status.
//!
//! Each task owns exactly one piece of the eventual [`ProcessResult`]. A
//! supervisor task joins all three and only then publishes the result, so a
//! caller can never observe a partially captured buffer.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::errors::{BundleError, Result};
use crate::exec::spawner::SpawnedProcess;

/// Exit code recorded until (or unless) the real one is known.
pub const EXIT_CODE_UNAVAILABLE: i32 = -1;

/// Which capture task a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    Stdout,
    Stderr,
    ExitStatus,
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureSource::Stdout => "stdout",
            CaptureSource::Stderr => "stderr",
            CaptureSource::ExitStatus => "exit status",
        };
        f.write_str(name)
    }
}

/// A single capture task that did not finish cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFailure {
    pub source: CaptureSource,
    pub message: String,
}

/// Everything captured from one finished child process.
#[derive(Debug, Clone)]
pub struct ProcessResult {
    command: String,
    exit_code: i32,
    stdout: String,
    stderr: String,
    failures: Vec<CaptureFailure>,
}

impl ProcessResult {
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Exit code of the child, or [`EXIT_CODE_UNAVAILABLE`] if it was killed
    /// by a signal or its status could not be read.
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn failures(&self) -> &[CaptureFailure] {
        &self.failures
    }

    /// stdout followed by stderr.
    pub fn combined_output(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len());
        out.push_str(&self.stdout);
        out.push_str(&self.stderr);
        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DrainOptions {
    /// Echo every captured line to our own stdout/stderr as it arrives.
    pub tee: bool,
}

/// In-flight capture of a child process.
///
/// [`is_done`](Self::is_done) flips to `true` once all three capture tasks
/// have finished and stays `true`.
#[derive(Debug)]
pub struct DrainHandle {
    command: String,
    done: Arc<AtomicBool>,
    join: JoinHandle<ProcessResult>,
}

impl DrainHandle {
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Wait for the join barrier and return the finished result.
    pub async fn wait(self) -> Result<ProcessResult> {
        let command = self.command;
        self.join.await.map_err(|e| BundleError::StreamCapture {
            command,
            stream: "capture supervisor".to_string(),
            message: e.to_string(),
        })
    }
}

/// Start the three capture tasks for `process` and return a handle to the
/// joined result.
pub fn start_drain(process: SpawnedProcess, options: DrainOptions) -> DrainHandle {
    let command = process.command().to_string();
    let (child, stdout, stderr) = process.into_parts();

    let done = Arc::new(AtomicBool::new(false));
    let done_flag = Arc::clone(&done);
    let supervisor_command = command.clone();

    let join = tokio::spawn(async move {
        let stdout_task = tokio::spawn(drain_stream(
            stdout,
            CaptureSource::Stdout,
            Echo::console(CaptureSource::Stdout, options.tee),
        ));
        let stderr_task = tokio::spawn(drain_stream(
            stderr,
            CaptureSource::Stderr,
            Echo::console(CaptureSource::Stderr, options.tee),
        ));
        let exit_task = tokio::spawn(wait_for_exit(child));

        let (out_res, err_res, exit_res) = tokio::join!(stdout_task, stderr_task, exit_task);

        let mut failures = Vec::new();

        let stdout = collect_stream(out_res, CaptureSource::Stdout, &mut failures);
        let stderr = collect_stream(err_res, CaptureSource::Stderr, &mut failures);

        let exit_code = match exit_res {
            Ok(Ok(code)) => code,
            Ok(Err(failure)) => {
                failures.push(failure);
                EXIT_CODE_UNAVAILABLE
            }
            Err(join_err) => {
                failures.push(CaptureFailure {
                    source: CaptureSource::ExitStatus,
                    message: join_err.to_string(),
                });
                EXIT_CODE_UNAVAILABLE
            }
        };

        for failure in &failures {
            warn!(
                cmd = %supervisor_command,
                stream = %failure.source,
                error = %failure.message,
                "output capture incomplete"
            );
        }

        let result = ProcessResult {
            command: supervisor_command,
            exit_code,
            stdout,
            stderr,
            failures,
        };

        done_flag.store(true, Ordering::Release);
        debug!(cmd = %result.command, exit_code, "process capture finished");
        result
    });

    DrainHandle {
        command,
        done,
        join,
    }
}

fn collect_stream(
    res: std::result::Result<(String, Option<CaptureFailure>), tokio::task::JoinError>,
    source: CaptureSource,
    failures: &mut Vec<CaptureFailure>,
) -> String {
    match res {
        Ok((buf, failure)) => {
            failures.extend(failure);
            buf
        }
        Err(join_err) => {
            failures.push(CaptureFailure {
                source,
                message: join_err.to_string(),
            });
            String::new()
        }
    }
}

/// Console echo of one captured stream.
///
/// The first failed write (e.g. a closed pipe on our own stdout) turns the
/// echo off for the rest of the stream. Capture is never affected.
pub(crate) struct Echo {
    source: CaptureSource,
    sink: Option<Box<dyn Write + Send>>,
}

impl Echo {
    /// Echo to our stdout, or stderr for [`CaptureSource::Stderr`], when
    /// `enabled`.
    pub(crate) fn console(source: CaptureSource, enabled: bool) -> Self {
        let sink: Option<Box<dyn Write + Send>> = match (enabled, source) {
            (false, _) => None,
            (true, CaptureSource::Stderr) => Some(Box::new(std::io::stderr())),
            (true, _) => Some(Box::new(std::io::stdout())),
        };
        Self { source, sink }
    }

    #[cfg(test)]
    pub(crate) fn to_sink(source: CaptureSource, sink: Box<dyn Write + Send>) -> Self {
        Self {
            source,
            sink: Some(sink),
        }
    }

    pub(crate) fn line(&mut self, line: &str) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(sink, "{line}").and_then(|()| sink.flush()) {
            warn!(stream = %self.source, error = %e, "console echo failed; echo disabled");
            self.sink = None;
        }
    }
}

/// Read `stream` line by line until EOF, accumulating every line followed by
/// `\n`. Non-UTF-8 bytes are replaced rather than aborting the read.
///
/// A read error stops this stream only; what was read so far is kept.
pub(crate) async fn drain_stream<R>(
    stream: Option<R>,
    source: CaptureSource,
    mut echo: Echo,
) -> (String, Option<CaptureFailure>)
where
    R: AsyncRead + Unpin,
{
    let mut captured = String::new();
    let Some(stream) = stream else {
        return (captured, None);
    };

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        match next_line_lossy(&mut reader, &mut buf).await {
            Ok(None) => break,
            Ok(Some(line)) => {
                trace!(stream = %source, "{}", line);
                echo.line(&line);
                captured.push_str(&line);
                captured.push('\n');
            }
            Err(e) => {
                return (
                    captured,
                    Some(CaptureFailure {
                        source,
                        message: e.to_string(),
                    }),
                );
            }
        }
    }

    (captured, None)
}

/// Read one line without its terminator, replacing invalid UTF-8.
/// `Ok(None)` means EOF.
pub(crate) async fn next_line_lossy<R>(
    reader: &mut BufReader<R>,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

async fn wait_for_exit(mut child: Child) -> std::result::Result<i32, CaptureFailure> {
    match child.wait().await {
        Ok(status) => Ok(status.code().unwrap_or(EXIT_CODE_UNAVAILABLE)),
        Err(e) => Err(CaptureFailure {
            source: CaptureSource::ExitStatus,
            message: e.to_string(),
        }),
    }
}
