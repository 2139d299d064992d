//! Data models for the overdue scanner.
//!
//! This module contains the per-scan data structures: raw rows from the
//! record store, the aggregated per-party buckets, severity levels and
//! the scan result handed back to the caller.

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One checked-out item as returned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdueRow {
    /// Contact phone number of the responsible party.
    pub phone: String,
    /// Identifier of the checked-out item (SKU).
    pub item_id: String,
    /// Username of the responsible party (sorter).
    pub party_id: String,
    /// Whole days since the item was checked out.
    pub days_elapsed: i64,
}

/// Identity a notification is addressed to.
///
/// Two rows with the same party but a different phone are distinct recipients.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartyKey {
    pub party_id: String,
    pub phone: String,
}

impl PartyKey {
    pub fn new(party_id: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            party_id: party_id.into(),
            phone: phone.into(),
        }
    }
}

impl fmt::Display for PartyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.party_id, self.phone)
    }
}

/// Items held by one party, keyed by item id, valued by days elapsed.
pub type ItemBucket = HashMap<String, i64>;

/// Warning and overdue thresholds, in days since checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub warning_days: i64,
    pub overdue_days: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_days: 6,
            overdue_days: 8,
        }
    }
}

impl Thresholds {
    /// Check that the thresholds describe a usable window.
    pub fn validate(&self) -> Result<(), String> {
        if self.warning_days < 1 {
            return Err("Warning days must be at least 1".to_string());
        }
        if self.overdue_days <= self.warning_days {
            return Err(format!(
                "Overdue days ({}) must be greater than warning days ({})",
                self.overdue_days, self.warning_days
            ));
        }
        Ok(())
    }
}

/// How overdue a party's items are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// No contact warranted.
    None,
    /// Due back tomorrow.
    Warning,
    /// Past due, return ASAP.
    Overdue,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::None => write!(f, "None"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Overdue => write!(f, "Overdue"),
        }
    }
}

/// A composed message ready for the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub recipient_phone: String,
    pub body: String,
}

/// Outcome of one scan.
#[derive(Debug, Default, Serialize)]
pub struct ScanResult {
    /// Parties whose primary and escalation messages were both delivered.
    pub notified: usize,
    /// Rows that could not be decoded.
    pub skipped: usize,
    /// Parties with qualifying items but no message warranted.
    pub silent: usize,
    /// Number of party buckets built by the aggregator.
    pub parties: usize,
    /// Fatal or per-party errors, in the order they occurred.
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<ScanError>,
}

impl ScanResult {
    /// Result of a scan that aborted before aggregation.
    pub fn fatal(error: ScanError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Returns true if the scan aborted.
    pub fn is_fatal(&self) -> bool {
        self.errors.iter().any(|e| matches!(e, ScanError::Fatal(_)))
    }

    /// Count of per-party send failures.
    pub fn send_failures(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e, ScanError::Send { .. }))
            .count()
    }
}

fn serialize_errors<S>(errors: &[ScanError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(errors.iter().map(|e| e.to_string()))
}
