//! Dry-run sender: logs each message instead of delivering it.

use crate::error::SendError;
use crate::notify::NotificationSender;
use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn send(&self, body: &str, destination: &str) -> Result<(), SendError> {
        info!("[dry-run] to {}: {}", destination, body);
        Ok(())
    }
}
