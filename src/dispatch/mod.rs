//! Scan orchestration.
//!
//! One scan fetches every row from the record source, groups them per
//! party, composes one message per party and hands it to the sender:
//! first to the party's own phone, then to the escalation destination
//! with the party id prefixed.

use crate::analysis::{aggregate_decoded, representative_days, Aggregation};
use crate::error::ScanError;
use crate::models::{ItemBucket, NotificationMessage, PartyKey, ScanResult};
use crate::notify::NotificationSender;
use crate::report::Composer;
use crate::store::RecordSource;
use tracing::{debug, error, info, warn};

/// Drives one scan end to end.
pub struct Dispatcher {
    source: Box<dyn RecordSource>,
    sender: Box<dyn NotificationSender>,
    composer: Composer,
    escalation_destination: Option<String>,
}

impl Dispatcher {
    pub fn new(
        source: Box<dyn RecordSource>,
        sender: Box<dyn NotificationSender>,
        composer: Composer,
        escalation_destination: Option<String>,
    ) -> Self {
        Self {
            source,
            sender,
            composer,
            escalation_destination: escalation_destination.filter(|d| !d.trim().is_empty()),
        }
    }

    /// Run one scan. Never fails: a fatal store error is the sole entry of `errors`.
    pub async fn run(&self) -> ScanResult {
        info!(
            "Scanning {} source (warning at {} days, overdue at {} days)",
            self.source.name(),
            self.composer.thresholds().warning_days,
            self.composer.thresholds().overdue_days
        );

        let rows = match self.source.fetch_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Scan aborted: {}", e);
                return ScanResult::fatal(e);
            }
        };

        let Aggregation { parties, rejected } =
            aggregate_decoded(rows, self.composer.thresholds().warning_days);

        let mut result = ScanResult {
            skipped: rejected.len(),
            parties: parties.len(),
            errors: rejected.into_iter().map(ScanError::from).collect(),
            ..ScanResult::default()
        };
        info!(
            "{} parties with due items, {} rows skipped",
            result.parties, result.skipped
        );

        for (party, bucket) in &parties {
            match self.message_for(party, bucket) {
                Some(message) => {
                    if self.deliver(party, &message, &mut result).await {
                        result.notified += 1;
                    }
                }
                None => {
                    debug!("No message warranted for {}", party);
                    result.silent += 1;
                }
            }
        }

        info!(
            "Scan complete: {} notified, {} send errors",
            result.notified,
            result.send_failures()
        );
        result
    }

    fn message_for(&self, party: &PartyKey, bucket: &ItemBucket) -> Option<NotificationMessage> {
        let days = representative_days(bucket, self.composer.thresholds())?;
        let body = self.composer.compose(bucket.keys(), days);
        if body.is_empty() {
            return None;
        }

        debug!("Message for {} ({} days): {}", party, days, body);
        Some(NotificationMessage {
            recipient_phone: party.phone.clone(),
            body,
        })
    }

    /// Send to the party, then escalate. Returns true if every send succeeded.
    async fn deliver(
        &self,
        party: &PartyKey,
        message: &NotificationMessage,
        result: &mut ScanResult,
    ) -> bool {
        let mut delivered = true;

        if let Err(e) = self.sender.send(&message.body, &message.recipient_phone).await {
            warn!("Failed to notify {}: {}", party, e);
            result.errors.push(ScanError::Send {
                party_id: party.party_id.clone(),
                source: e,
            });
            delivered = false;
        }

        if let Some(ref destination) = self.escalation_destination {
            let escalation = format!("{}-{}", party.party_id, message.body);
            if let Err(e) = self.sender.send(&escalation, destination).await {
                warn!("Failed to escalate {}: {}", party, e);
                result.errors.push(ScanError::Send {
                    party_id: party.party_id.clone(),
                    source: e,
                });
                delivered = false;
            }
        }

        delivered
    }
}
