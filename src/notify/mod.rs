//! Notification delivery.
//!
//! A [`NotificationSender`] delivers one text message to one destination.
//! Each call is independent; the dispatcher decides what to do on failure.

pub mod log;
pub mod twilio;

pub use self::log::LogSender;
pub use self::twilio::TwilioSender;

use crate::error::SendError;
use async_trait::async_trait;

/// Text-message channel.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Deliver `body` to `destination`.
    async fn send(&self, body: &str, destination: &str) -> Result<(), SendError>;
}
