#![allow(dead_code)]

pub use bundlewatch_test_utils::fixtures::FixtureProject;
pub use bundlewatch_test_utils::{init_tracing, with_timeout};

use bundlewatch::exec::GoalSequence;

pub fn goals(s: &str) -> GoalSequence {
    s.parse().expect("valid goal sequence")
}
