//! Error types for a scan.
//!
//! A scan distinguishes three failure classes: the record store being
//! unreachable (fatal), a single undecodable row (skipped), and a
//! notification that could not be delivered (recorded per party).

use thiserror::Error;

/// A single row from the record store that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row {index}: {reason}")]
pub struct RowDecodeError {
    /// Zero-based position of the row in the result set.
    pub index: usize,
    pub reason: String,
}

/// The notification channel rejected or could not deliver a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("delivery to {destination} failed: {reason}")]
pub struct SendError {
    pub destination: String,
    pub reason: String,
}

impl SendError {
    pub fn new(destination: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced in a scan result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Connection or query failure; nothing was sent.
    #[error("record store unavailable: {0}")]
    Fatal(String),

    #[error("undecodable {0}")]
    RowDecode(#[from] RowDecodeError),

    #[error("party {party_id}: {source}")]
    Send {
        party_id: String,
        #[source]
        source: SendError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let decode = ScanError::from(RowDecodeError {
            index: 3,
            reason: "sku is NULL".to_string(),
        });
        assert_eq!(decode.to_string(), "undecodable row 3: sku is NULL");

        let send = ScanError::Send {
            party_id: "bob".to_string(),
            source: SendError::new("+15550100", "HTTP 400"),
        };
        assert_eq!(
            send.to_string(),
            "party bob: delivery to +15550100 failed: HTTP 400"
        );
    }
}
