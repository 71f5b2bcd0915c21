//! Durable event queue.
//!
//! Two layers: [`QueueClient`] is the transport contract for one named
//! durable queue (publish with publisher confirms, manual-ack consumption,
//! depth introspection, graceful stop); [`Queue`] sits on top, serializes
//! events to JSON and bounds every publish with the configured processing
//! timeout. A publish that returns `Ok` means the broker durably accepted
//! the message, which is what authorizes deleting the source record.

pub mod error;
pub mod memory;
pub mod rabbitmq;

pub use error::QueueError;
pub use memory::MemoryQueueClient;
pub use rabbitmq::RabbitMqClient;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::events::ExpiredStakingEvent;

/// A consumed message plus the receipt needed to acknowledge it later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    pub body: String,
    pub receipt: String,
}

#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Publish one message and wait for the broker's confirm. Errors on an
    /// unusable channel, a negative acknowledgement, or a stopped client.
    async fn send_message(&self, body: String) -> Result<(), QueueError>;

    /// Start consuming. Messages are forwarded on the returned channel from
    /// a separate task and must be acknowledged via [`delete_message`];
    /// stopping the client closes the feed.
    ///
    /// [`delete_message`]: QueueClient::delete_message
    async fn receive_messages(&self) -> Result<mpsc::UnboundedReceiver<QueueMessage>, QueueError>;

    /// Acknowledge a consumed message, removing it from redelivery.
    async fn delete_message(&self, receipt: &str) -> Result<(), QueueError>;

    /// Number of messages currently waiting in the queue.
    async fn message_count(&self) -> Result<u32, QueueError>;

    fn queue_name(&self) -> &str;

    /// Idempotent graceful shutdown. Confirmed publishes stay delivered;
    /// unconfirmed in-flight publishes may be lost.
    async fn stop(&self);
}

/// Event-level wrapper around the expired-staking queue client.
pub struct Queue {
    expired_staking_client: Box<dyn QueueClient>,
    processing_timeout: Duration,
}

impl Queue {
    pub fn new(expired_staking_client: Box<dyn QueueClient>, processing_timeout: Duration) -> Self {
        Self {
            expired_staking_client,
            processing_timeout,
        }
    }

    /// Serializes the event and publishes it, waiting for the publisher
    /// confirm. Returns only after the broker durably accepted the message
    /// or the processing timeout elapsed.
    pub async fn send_expired_staking_event(
        &self,
        ev: &ExpiredStakingEvent,
    ) -> Result<(), QueueError> {
        let body = serde_json::to_string(ev)?;

        debug!(tx_hash = %ev.staking_tx_hash_hex, "publishing expired staking event");
        tokio::time::timeout(
            self.processing_timeout,
            self.expired_staking_client.send_message(body),
        )
        .await
        .map_err(|_| {
            QueueError::PublishTimeout(self.expired_staking_client.queue_name().to_string())
        })??;
        debug!(tx_hash = %ev.staking_tx_hash_hex, "expired staking event confirmed");

        Ok(())
    }

    pub async fn receive_expired_staking_events(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<QueueMessage>, QueueError> {
        self.expired_staking_client.receive_messages().await
    }

    pub async fn acknowledge(&self, receipt: &str) -> Result<(), QueueError> {
        self.expired_staking_client.delete_message(receipt).await
    }

    pub async fn expired_queue_message_count(&self) -> Result<u32, QueueError> {
        self.expired_staking_client.message_count().await
    }

    /// Gracefully stops the queue interaction and releases broker resources.
    pub async fn shutdown(&self) {
        self.expired_staking_client.stop().await;
    }
}
