// topup-order-service/src/events/mod.rs

//! Best-effort order lifecycle events.

#[cfg(feature = "kafka")]
pub mod kafka;
pub mod log;

#[cfg(feature = "kafka")]
pub use kafka::KafkaEventPublisher;
pub use log::LogEventPublisher;

use crate::models::{Order, OrderMessage};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const TOPIC_NEW_ORDER: &str = "new_order";
pub const TOPIC_ORDER_SUCCEEDED: &str = "order_succeeded";
pub const TOPIC_ORDER_FAILED: &str = "order_failed";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
  #[error("event could not be serialized: {0}")]
  Serialization(String),

  #[error("message bus rejected event: {0}")]
  Bus(String),

  #[error("publish timed out after {0:?}")]
  Timeout(Duration),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
  async fn emit(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError>;
}

/// Emits the order snapshot on `topic`, keyed by order id, within `timeout`.
/// Failures are logged and swallowed: the order or status change they describe
/// is already committed.
pub async fn emit_best_effort(publisher: &Arc<dyn EventPublisher>, topic: &str, order: &Order, timeout: Duration) {
  let result = match serde_json::to_vec(&OrderMessage::from(order)) {
    Ok(payload) => {
      let key = order.id.to_string();
      match tokio::time::timeout(timeout, publisher.emit(topic, &key, &payload)).await {
        Ok(result) => result,
        Err(_) => Err(PublishError::Timeout(timeout)),
      }
    }
    Err(e) => Err(PublishError::Serialization(e.to_string())),
  };

  match result {
    Ok(()) => debug!(topic, order_id = %order.id, "Order event published."),
    Err(e) => warn!(topic, order_id = %order.id, status = %order.status, error = %e, "Order event not published."),
  }
}
