// src/exec/outcome.rs

use crate::exec::drain::ProcessResult;

/// Success classification of a finished build.
///
/// A build only counts as successful when the process exited with `0`
/// **and** its captured output contains the tool's success marker. Neither condition
/// is enough on its own: some tools exit `0` after skipping a module, and a
/// later goal in the same invocation can fail after an earlier one already
/// logged success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOutcome {
    pub exit_code: i32,
    pub marker_found: bool,
}

impl BuildOutcome {
    pub fn classify(result: &ProcessResult, marker: &str) -> Self {
        Self::from_parts(result.exit_code(), &result.combined_output(), marker)
    }

    pub fn from_parts(exit_code: i32, output: &str, marker: &str) -> Self {
        Self {
            exit_code,
            marker_found: !marker.is_empty() && output.contains(marker),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.marker_found
    }

    /// Short reason suitable for an error message.
    pub fn describe(&self) -> String {
        match (self.exit_code == 0, self.marker_found) {
            (true, true) => "build succeeded".to_string(),
            (true, false) => "exit code 0 but success marker missing from output".to_string(),
            (false, true) => format!(
                "exit code {} (a success marker was logged before a later goal failed)",
                self.exit_code
            ),
            (false, false) => format!("exit code {}", self.exit_code),
        }
    }
}
