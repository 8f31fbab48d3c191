mod kafka;

pub use kafka::KafkaEventPublisher;

use async_trait::async_trait;

use crate::errors::PublishError;

/// Emits notification events after an order is committed.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), PublishError>;
}
