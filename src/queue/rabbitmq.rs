//! RabbitMQ queue client.
//!
//! One connection and one channel shared by all publishes in the process.
//! The channel is put into confirm mode at startup, so `send_message` blocks
//! until the broker acknowledges the message. Consumption is manual-ack: a
//! consumer crash leaves unacknowledged messages eligible for redelivery.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, ConfirmSelectOptions,
    QueueDeclareOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{QueueClient, QueueError, QueueMessage};

const PERSISTENT_DELIVERY_MODE: u8 = 2;

pub struct RabbitMqClient {
    connection: Connection,
    channel: Channel,
    queue_name: String,
    stop: CancellationToken,
}

impl RabbitMqClient {
    /// Connects, declares the durable queue and enables publisher confirms.
    /// Any failure here is fatal to startup.
    pub async fn connect(amqp_uri: &str, queue_name: &str) -> Result<Self, QueueError> {
        let connection = Connection::connect(amqp_uri, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;

        channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;

        Ok(Self {
            connection,
            channel,
            queue_name: queue_name.to_string(),
            stop: CancellationToken::new(),
        })
    }
}

#[async_trait]
impl QueueClient for RabbitMqClient {
    async fn send_message(&self, body: String) -> Result<(), QueueError> {
        if self.stop.is_cancelled() {
            return Err(QueueError::Stopped);
        }

        let confirm = self
            .channel
            .basic_publish(
                "",
                &self.queue_name,
                BasicPublishOptions {
                    // The broker must route the message to the queue.
                    mandatory: true,
                    ..Default::default()
                },
                body.as_bytes(),
                BasicProperties::default().with_delivery_mode(PERSISTENT_DELIVERY_MODE),
            )
            .await?
            .await?;

        match confirm {
            Confirmation::Ack(_) => Ok(()),
            Confirmation::Nack(_) | Confirmation::NotRequested => {
                Err(QueueError::NotConfirmed(self.queue_name.clone()))
            }
        }
    }

    async fn receive_messages(&self) -> Result<mpsc::UnboundedReceiver<QueueMessage>, QueueError> {
        if self.stop.is_cancelled() {
            return Err(QueueError::Stopped);
        }

        let mut consumer = self
            .channel
            .basic_consume(
                &self.queue_name,
                "",
                // Defaults keep no_ack off: acknowledgement is manual.
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let stop = self.stop.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop.cancelled() => return,
                    delivery = consumer.next() => {
                        let Some(delivery) = delivery else { return };
                        match delivery {
                            Ok(delivery) => {
                                let message = QueueMessage {
                                    body: String::from_utf8_lossy(&delivery.data).into_owned(),
                                    receipt: delivery.delivery_tag.to_string(),
                                };
                                if tx.send(message).is_err() {
                                    return;
                                }
                            }
                            Err(e) => {
                                warn!("consumer error: {e}");
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn delete_message(&self, receipt: &str) -> Result<(), QueueError> {
        let delivery_tag: u64 = receipt
            .parse()
            .map_err(|_| QueueError::InvalidReceipt(receipt.to_string()))?;
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await?;
        Ok(())
    }

    async fn message_count(&self) -> Result<u32, QueueError> {
        // Passive declare inspects the queue without changing it.
        let queue = self
            .channel
            .queue_declare(
                &self.queue_name,
                QueueDeclareOptions {
                    passive: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(queue.message_count())
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }

    async fn stop(&self) {
        if self.stop.is_cancelled() {
            return;
        }
        self.stop.cancel();
        if let Err(e) = self.connection.close(200, "shutting down").await {
            debug!("error closing RabbitMQ connection: {e}");
        }
    }
}
