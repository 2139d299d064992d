//! Row aggregation.
//!
//! This module groups raw record-store rows into one item bucket per
//! responsible party, dropping items that are not yet due for contact.

use crate::analysis::classify;
use crate::error::RowDecodeError;
use crate::models::{ItemBucket, OverdueRow, PartyKey, Thresholds};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Party buckets, ordered by party key so dispatch order is reproducible.
pub type PartyBuckets = BTreeMap<PartyKey, ItemBucket>;

/// Buckets built from a decoded row stream, plus the rows that were rejected.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub parties: PartyBuckets,
    pub rejected: Vec<RowDecodeError>,
}

/// Group rows by party, keeping only items at or past `warning_days`.
///
/// A repeated item id within one party keeps the last value seen. Parties
/// with no qualifying items do not appear in the result.
pub fn aggregate<I>(rows: I, warning_days: i64) -> PartyBuckets
where
    I: IntoIterator<Item = OverdueRow>,
{
    let mut parties = PartyBuckets::new();

    for row in rows {
        if row.days_elapsed < warning_days {
            debug!(
                "Dropping {} for {}: {} days is under the warning threshold",
                row.item_id, row.party_id, row.days_elapsed
            );
            continue;
        }

        parties
            .entry(PartyKey::new(row.party_id, row.phone))
            .or_default()
            .insert(row.item_id, row.days_elapsed);
    }

    parties
}

/// Aggregate a stream of decode results, setting aside undecodable rows.
pub fn aggregate_decoded<I>(rows: I, warning_days: i64) -> Aggregation
where
    I: IntoIterator<Item = Result<OverdueRow, RowDecodeError>>,
{
    let mut rejected = Vec::new();

    let valid = rows.into_iter().filter_map(|row| match row {
        Ok(row) => Some(row),
        Err(e) => {
            warn!("Skipping {}", e);
            rejected.push(e);
            None
        }
    });
    let parties = aggregate(valid, warning_days);

    Aggregation { parties, rejected }
}

/// Elapsed days that stands for the whole bucket: the most urgent item.
///
/// Urgency is severity first, then days, since an item one day past the
/// warning day is not yet overdue and classifies below it.
pub fn representative_days(bucket: &ItemBucket, thresholds: Thresholds) -> Option<i64> {
    bucket
        .values()
        .copied()
        .max_by_key(|&days| (classify(days, thresholds), days))
}
