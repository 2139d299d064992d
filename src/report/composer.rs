//! Reminder message composition.
//!
//! This module renders one SMS body per party from the item ids in its
//! bucket and the bucket's representative elapsed days.

use crate::analysis::classify;
use crate::models::{Severity, Thresholds};

/// Default organization named in the message preamble.
pub const DEFAULT_ORGANIZATION: &str = "BBB Sorting";

/// Renders reminder messages for a fixed organization and threshold pair.
#[derive(Debug, Clone)]
pub struct Composer {
    organization: String,
    thresholds: Thresholds,
}

impl Composer {
    pub fn new(organization: impl Into<String>, thresholds: Thresholds) -> Self {
        Self {
            organization: organization.into(),
            thresholds,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Compose the message for a party's items.
    ///
    /// Returns an empty string when `days_elapsed` does not classify as a
    /// warning or overdue; the caller must not dispatch in that case. Item
    /// ids are listed in lexicographic order.
    pub fn compose<I, S>(&self, item_ids: I, days_elapsed: i64) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items: Vec<String> = item_ids
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        items.sort();
        items.dedup();

        if items.is_empty() {
            return String::new();
        }

        let list = items.join(", ");
        let plural = items.len() > 1;

        let reminder = match (classify(days_elapsed, self.thresholds), plural) {
            (Severity::None, _) => return String::new(),
            (Severity::Warning, false) => {
                format!("the following SKU is due back tomorrow: {}", list)
            }
            (Severity::Warning, true) => {
                format!("the following SKUs are due back tomorrow: {}", list)
            }
            (Severity::Overdue, false) => format!(
                "the following SKU is now overdue. Please return this SKU ASAP: {}",
                list
            ),
            (Severity::Overdue, true) => format!(
                "the following SKUs are now overdue. Please return these SKUs ASAP: {}",
                list
            ),
        };

        format!(
            "Automated message from {}. Please contact your manager if you have further questions. Just a friendly reminder that {}",
            self.organization, reminder
        )
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(DEFAULT_ORGANIZATION, Thresholds::default())
    }
}
