// src/exec/goals.rs

use std::fmt;
use std::str::FromStr;

use crate::errors::{BundleError, Result};

/// Ordered, non-empty list of build-tool goals (`clean`, `package`, ...).
///
/// The goals are passed to a single build-tool invocation, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalSequence {
    goals: Vec<String>,
}

impl GoalSequence {
    pub fn new<I, S>(goals: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let goals: Vec<String> = goals.into_iter().map(Into::into).collect();

        if goals.is_empty() {
            return Err(BundleError::ConfigError(
                "goal sequence must contain at least one goal".to_string(),
            ));
        }
        if let Some(pos) = goals.iter().position(|g| g.trim().is_empty()) {
            return Err(BundleError::ConfigError(format!(
                "goal #{} in sequence is blank",
                pos + 1
            )));
        }

        Ok(Self { goals })
    }

    pub fn goals(&self) -> &[String] {
        &self.goals
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.goals.iter().map(String::as_str)
    }
}

impl FromStr for GoalSequence {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self> {
        GoalSequence::new(s.split_whitespace())
    }
}

impl fmt::Display for GoalSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.goals.join(" "))
    }
}
