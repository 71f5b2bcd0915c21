//! End-to-end cycle scenarios against the in-memory store and queue with a
//! mocked chain tip oracle: delivery guarantees, fail-fast ordering, and the
//! documented at-least-once duplicate behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use staking_expiry_checker::events::{EXPIRED_STAKING_QUEUE_NAME, EventType, StakingEvent};
use staking_expiry_checker::oracle::{ChainHeightOracle, OracleError};
use staking_expiry_checker::queue::{
    MemoryQueueClient, Queue, QueueClient, QueueError, QueueMessage,
};
use staking_expiry_checker::service::{ExpiryService, ServiceError};
use staking_expiry_checker::store::{ExpiryStore, MemoryStore, StoreError};
use staking_expiry_checker::types::{ExpiryRecord, StakingTxType};

struct FixedTipOracle(u64);

#[async_trait]
impl ChainHeightOracle for FixedTipOracle {
    async fn tip_height(&self) -> Result<u64, OracleError> {
        Ok(self.0)
    }
}

struct FailingOracle;

#[async_trait]
impl ChainHeightOracle for FailingOracle {
    async fn tip_height(&self) -> Result<u64, OracleError> {
        Err(OracleError::RpcConnection(
            "failed to get block count".to_string(),
        ))
    }
}

/// Store whose queries always fail.
struct FailingStore;

#[async_trait]
impl ExpiryStore for FailingStore {
    async fn find_expired(&self, _tip_height: u64) -> Result<Vec<ExpiryRecord>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn delete(&self, _staking_tx_hash_hex: &str) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store that serves records but refuses every delete.
struct NoDeleteStore {
    inner: MemoryStore,
}

#[async_trait]
impl ExpiryStore for NoDeleteStore {
    async fn find_expired(&self, tip_height: u64) -> Result<Vec<ExpiryRecord>, StoreError> {
        self.inner.find_expired(tip_height).await
    }

    async fn delete(&self, _staking_tx_hash_hex: &str) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolClosed))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

/// Queue client that confirms the first `allow` publishes and nacks the rest.
struct FlakyQueueClient {
    inner: MemoryQueueClient,
    allow: usize,
    sent: AtomicUsize,
}

impl FlakyQueueClient {
    fn new(allow: usize) -> Self {
        Self {
            inner: MemoryQueueClient::new(EXPIRED_STAKING_QUEUE_NAME),
            allow,
            sent: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl QueueClient for FlakyQueueClient {
    async fn send_message(&self, body: String) -> Result<(), QueueError> {
        let n = self.sent.fetch_add(1, Ordering::SeqCst);
        if n >= self.allow {
            return Err(QueueError::NotConfirmed(self.queue_name().to_string()));
        }
        self.inner.send_message(body).await
    }

    async fn receive_messages(&self) -> Result<mpsc::UnboundedReceiver<QueueMessage>, QueueError> {
        self.inner.receive_messages().await
    }

    async fn delete_message(&self, receipt: &str) -> Result<(), QueueError> {
        self.inner.delete_message(receipt).await
    }

    async fn message_count(&self) -> Result<u32, QueueError> {
        self.inner.message_count().await
    }

    fn queue_name(&self) -> &str {
        self.inner.queue_name()
    }

    async fn stop(&self) {
        self.inner.stop().await;
    }
}

fn record(hash: &str, height: u64, tx_type: StakingTxType) -> ExpiryRecord {
    ExpiryRecord {
        staking_tx_hash_hex: hash.to_string(),
        expire_height: height,
        tx_type,
    }
}

fn memory_queue() -> Arc<Queue> {
    Arc::new(Queue::new(
        Box::new(MemoryQueueClient::new(EXPIRED_STAKING_QUEUE_NAME)),
        Duration::from_secs(5),
    ))
}

#[tokio::test]
async fn processes_expired_delegations() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(record("mockStakingTxHashHex1", 999, StakingTxType::Active))
        .await;
    store
        .insert(record("mockStakingTxHashHex2", 999, StakingTxType::Unbonding))
        .await;

    let queue = memory_queue();
    let service = ExpiryService::new(store.clone(), Arc::new(FixedTipOracle(1000)), queue.clone());

    service.run_cycle(&CancellationToken::new()).await.unwrap();

    assert!(store.is_empty().await);
    assert_eq!(queue.expired_queue_message_count().await.unwrap(), 2);

    // Tags are preserved on the wire.
    let mut rx = queue.receive_expired_staking_events().await.unwrap();
    let mut seen = Vec::new();
    for _ in 0..2 {
        let message = rx.recv().await.unwrap();
        match StakingEvent::from_json(&message.body).unwrap() {
            StakingEvent::Expired(ev) => {
                assert_eq!(ev.event_type, EventType::ExpiredStaking);
                seen.push((ev.staking_tx_hash_hex, ev.tx_type));
            }
            other => panic!("unexpected event on expired queue: {other:?}"),
        }
        queue.acknowledge(&message.receipt).await.unwrap();
    }
    seen.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(
        seen,
        vec![
            ("mockStakingTxHashHex1".to_string(), StakingTxType::Active),
            (
                "mockStakingTxHashHex2".to_string(),
                StakingTxType::Unbonding
            ),
        ]
    );
}

#[tokio::test]
async fn error_getting_block_count() {
    let store = Arc::new(MemoryStore::new());
    store
        .insert(record("mockStakingTxHashHex", 999, StakingTxType::Active))
        .await;

    let queue = memory_queue();
    let service = ExpiryService::new(store.clone(), Arc::new(FailingOracle), queue.clone());

    let err = service
        .run_cycle(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Oracle(_)));
    assert_eq!(store.len().await, 1);
    assert_eq!(queue.expired_queue_message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn error_finding_expired_delegations() {
    let queue = memory_queue();
    let service = ExpiryService::new(
        Arc::new(FailingStore),
        Arc::new(FixedTipOracle(1000)),
        queue.clone(),
    );

    let err = service
        .run_cycle(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Store(_)));
    assert_eq!(queue.expired_queue_message_count().await.unwrap(), 0);
}

#[tokio::test]
async fn error_deleting_expired_delegation_keeps_record_and_message() {
    let inner = MemoryStore::new();
    inner
        .insert(record("mockStakingTxHashHex", 999, StakingTxType::Active))
        .await;
    let store = Arc::new(NoDeleteStore { inner });

    let queue = memory_queue();
    let service = ExpiryService::new(store.clone(), Arc::new(FixedTipOracle(1000)), queue.clone());

    let err = service
        .run_cycle(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Store(_)));

    // Publish preceded the failed delete: one message, record still present.
    assert_eq!(queue.expired_queue_message_count().await.unwrap(), 1);
    assert_eq!(store.inner.len().await, 1);

    // The next cycle republishes the same record: the documented
    // at-least-once duplicate, deduplicated downstream by tx hash.
    let err = service
        .run_cycle(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Store(_)));
    assert_eq!(queue.expired_queue_message_count().await.unwrap(), 2);
}

#[tokio::test]
async fn publish_failure_is_fail_fast() {
    let store = Arc::new(MemoryStore::new());
    // BTreeMap order makes "aa" the first record processed.
    store.insert(record("aa", 999, StakingTxType::Active)).await;
    store
        .insert(record("bb", 999, StakingTxType::Unbonding))
        .await;

    let queue = Arc::new(Queue::new(
        Box::new(FlakyQueueClient::new(1)),
        Duration::from_secs(5),
    ));
    let service = ExpiryService::new(store.clone(), Arc::new(FixedTipOracle(1000)), queue.clone());

    let err = service
        .run_cycle(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Queue(_)));

    // First record was published and deleted; the failing one was neither
    // deleted nor skipped past.
    assert_eq!(queue.expired_queue_message_count().await.unwrap(), 1);
    assert_eq!(store.len().await, 1);
    assert!(store.contains("bb").await);
    assert!(!store.contains("aa").await);
}
