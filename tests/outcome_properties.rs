// tests/outcome_properties.rs

use bundlewatch::exec::BuildOutcome;
use proptest::prelude::*;

const MARKER: &str = "BUILD SUCCESS";

// Log lines that can never contain the marker on their own.
fn log_line() -> impl Strategy<Value = String> {
    "[a-z \\[\\]:.]{0,40}"
}

proptest! {
    #[test]
    fn nonzero_exit_is_never_success(
        code in prop_oneof![i32::MIN..0, 1..i32::MAX],
        before in proptest::collection::vec(log_line(), 0..10),
        marker_present in any::<bool>(),
        after in proptest::collection::vec(log_line(), 0..10),
    ) {
        let mut log = before.join("\n");
        if marker_present {
            log.push_str("\n[INFO] BUILD SUCCESS\n");
        }
        log.push_str(&after.join("\n"));

        let outcome = BuildOutcome::from_parts(code, &log, MARKER);
        prop_assert!(!outcome.success());
        prop_assert_eq!(outcome.marker_found, marker_present);
    }

    #[test]
    fn zero_exit_succeeds_iff_marker_present(
        before in proptest::collection::vec(log_line(), 0..10),
        marker_present in any::<bool>(),
        after in proptest::collection::vec(log_line(), 0..10),
    ) {
        let mut log = before.join("\n");
        if marker_present {
            log.push_str("\n[INFO] BUILD SUCCESS\n");
        }
        log.push_str(&after.join("\n"));

        let outcome = BuildOutcome::from_parts(0, &log, MARKER);
        prop_assert_eq!(outcome.success(), marker_present);
    }
}
