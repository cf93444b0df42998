// topup-order-service/src/events/kafka.rs

use crate::events::{EventPublisher, PublishError};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;

pub struct KafkaEventPublisher {
  producer: FutureProducer,
  queue_timeout: Duration,
}

impl KafkaEventPublisher {
  pub fn new(brokers: &str, message_timeout: Duration) -> Result<Self, PublishError> {
    let producer: FutureProducer = ClientConfig::new()
      .set("bootstrap.servers", brokers)
      .set("message.timeout.ms", message_timeout.as_millis().to_string())
      .create()
      .map_err(|e| PublishError::Bus(format!("failed to create Kafka producer: {}", e)))?;
    Ok(Self {
      producer,
      queue_timeout: Duration::from_millis(0),
    })
  }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
  async fn emit(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
    self
      .producer
      .send(
        FutureRecord::to(topic).payload(payload).key(key),
        Timeout::After(self.queue_timeout),
      )
      .await
      .map(|_| ())
      .map_err(|(e, _)| PublishError::Bus(e.to_string()))
  }
}
