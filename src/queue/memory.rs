//! In-memory queue client with the same confirm/ack surface as the RabbitMQ
//! client, for tests and local runs without a broker. Consumed messages stay
//! in an unacked set until acknowledged, mirroring a broker's redelivery set.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use super::{QueueClient, QueueError, QueueMessage};

#[derive(Default)]
struct State {
    /// Published messages not yet handed to a consumer.
    ready: VecDeque<QueueMessage>,
    /// Receipts handed to a consumer and not yet acknowledged.
    unacked: HashSet<String>,
    consumer: Option<mpsc::UnboundedSender<QueueMessage>>,
}

pub struct MemoryQueueClient {
    queue_name: String,
    state: Mutex<State>,
    next_tag: AtomicU64,
    stop: CancellationToken,
}

impl MemoryQueueClient {
    pub fn new(queue_name: &str) -> Self {
        Self {
            queue_name: queue_name.to_string(),
            state: Mutex::new(State::default()),
            next_tag: AtomicU64::new(0),
            stop: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl QueueClient for MemoryQueueClient {
    async fn send_message(&self, body: String) -> Result<(), QueueError> {
        if self.stop.is_cancelled() {
            return Err(QueueError::Stopped);
        }

        let tag = self.next_tag.fetch_add(1, Ordering::Relaxed) + 1;
        let message = QueueMessage {
            body,
            receipt: tag.to_string(),
        };

        let mut state = self.state.lock().await;
        let delivered = state
            .consumer
            .as_ref()
            .is_some_and(|tx| tx.send(message.clone()).is_ok());
        if delivered {
            state.unacked.insert(message.receipt);
        } else {
            state.consumer = None;
            state.ready.push_back(message);
        }
        Ok(())
    }

    async fn receive_messages(&self) -> Result<mpsc::UnboundedReceiver<QueueMessage>, QueueError> {
        if self.stop.is_cancelled() {
            return Err(QueueError::Stopped);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().await;
        while let Some(message) = state.ready.pop_front() {
            state.unacked.insert(message.receipt.clone());
            // The receiver is still in scope, this cannot fail.
            let _ = tx.send(message);
        }
        state.consumer = Some(tx);
        Ok(rx)
    }

    async fn delete_message(&self, receipt: &str) -> Result<(), QueueError> {
        let mut state = self.state.lock().await;
        if !state.unacked.remove(receipt) {
            return Err(QueueError::InvalidReceipt(receipt.to_string()));
        }
        Ok(())
    }

    async fn message_count(&self) -> Result<u32, QueueError> {
        Ok(self.state.lock().await.ready.len() as u32)
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }

    async fn stop(&self) {
        self.stop.cancel();
        // Dropping the sender closes any open consumer feed.
        self.state.lock().await.consumer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publishes_are_counted_until_consumed() {
        let client = MemoryQueueClient::new("expired_staking_queue");
        client.send_message("one".to_string()).await.unwrap();
        client.send_message("two".to_string()).await.unwrap();
        assert_eq!(client.message_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn consumer_gets_backlog_then_live_messages() {
        let client = MemoryQueueClient::new("expired_staking_queue");
        client.send_message("backlog".to_string()).await.unwrap();

        let mut rx = client.receive_messages().await.unwrap();
        assert_eq!(rx.recv().await.unwrap().body, "backlog");

        client.send_message("live".to_string()).await.unwrap();
        let live = rx.recv().await.unwrap();
        assert_eq!(live.body, "live");
        assert_eq!(client.message_count().await.unwrap(), 0);

        client.delete_message(&live.receipt).await.unwrap();
        let err = client.delete_message(&live.receipt).await.unwrap_err();
        assert!(matches!(err, QueueError::InvalidReceipt(_)));
    }

    #[tokio::test]
    async fn stop_rejects_further_publishes_and_closes_the_feed() {
        let client = MemoryQueueClient::new("expired_staking_queue");
        let mut rx = client.receive_messages().await.unwrap();

        client.stop().await;
        client.stop().await; // idempotent

        assert!(matches!(
            client.send_message("late".to_string()).await,
            Err(QueueError::Stopped)
        ));
        assert!(rx.recv().await.is_none());
    }
}
