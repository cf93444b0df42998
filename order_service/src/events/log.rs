// topup-order-service/src/events/log.rs

use crate::events::{EventPublisher, PublishError};
use async_trait::async_trait;
use tracing::info;

/// Writes events to the log. Used when no message bus is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventPublisher;

#[async_trait]
impl EventPublisher for LogEventPublisher {
  async fn emit(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
    info!(
      topic,
      key,
      payload = %String::from_utf8_lossy(payload),
      "Order event (log sink)."
    );
    Ok(())
  }
}
