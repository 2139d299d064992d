//! Severity classification by days since checkout.

use crate::models::{Severity, Thresholds};

/// Classify elapsed days against the configured thresholds.
///
/// Exactly `warning_days` is a warning (due back tomorrow), anything at or
/// past `overdue_days` is overdue, everything else is `None`. Values below
/// the warning threshold are labelled, not filtered.
pub fn classify(days_elapsed: i64, thresholds: Thresholds) -> Severity {
    if days_elapsed >= thresholds.overdue_days {
        Severity::Overdue
    } else if days_elapsed == thresholds.warning_days {
        Severity::Warning
    } else {
        Severity::None
    }
}
