use std::time::Duration;

use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    producer::{FutureProducer, FutureRecord},
};

use crate::errors::PublishError;
use crate::messaging::EventPublisher;

pub struct KafkaEventPublisher {
    producer: FutureProducer,
    send_timeout: Duration,
}

impl KafkaEventPublisher {
    pub fn new(brokers: &str) -> Result<Self, PublishError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| PublishError::Broker(e.to_string()))?;

        Ok(Self {
            producer,
            send_timeout: Duration::from_secs(5),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), PublishError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        self.producer
            .send(record, rdkafka::util::Timeout::After(self.send_timeout))
            .await
            .map_err(|(e, _)| PublishError::Broker(e.to_string()))?;

        tracing::info!(
            topic = %topic,
            key = %key,
            "Published notification event"
        );

        Ok(())
    }
}
