//! Expiry detection cycle.
//!
//! One cycle: fetch the chain tip, query the store for records at or below
//! it, then for each record publish its expiry event and delete the record.
//! The cycle is strictly sequential and fails fast: the first error aborts
//! it, leaving every unprocessed record in the store for the next tick.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::ExpiredStakingEvent;
use crate::oracle::{ChainHeightOracle, OracleError};
use crate::queue::{Queue, QueueError};
use crate::store::{ExpiryStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to get chain tip: {0}")]
    Oracle(#[from] OracleError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("cycle interrupted by shutdown")]
    Cancelled,
}

pub struct ExpiryService {
    store: Arc<dyn ExpiryStore>,
    oracle: Arc<dyn ChainHeightOracle>,
    queue: Arc<Queue>,
}

impl ExpiryService {
    pub fn new(
        store: Arc<dyn ExpiryStore>,
        oracle: Arc<dyn ChainHeightOracle>,
        queue: Arc<Queue>,
    ) -> Self {
        Self {
            store,
            oracle,
            queue,
        }
    }

    /// Runs one full detection cycle.
    ///
    /// A record is deleted only after the publisher confirm for its event,
    /// so an error or crash anywhere in the cycle can duplicate an event
    /// downstream but never lose one. Consumers must deduplicate by
    /// `staking_tx_hash_hex`.
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> Result<(), ServiceError> {
        let tip_height = self.oracle.tip_height().await?;

        let expired = self.store.find_expired(tip_height).await?;
        if expired.is_empty() {
            debug!(tip_height, "no expired delegations");
            return Ok(());
        }
        info!(
            tip_height,
            count = expired.len(),
            "processing expired delegations"
        );

        for record in &expired {
            if shutdown.is_cancelled() {
                return Err(ServiceError::Cancelled);
            }

            let event =
                ExpiredStakingEvent::new(record.staking_tx_hash_hex.clone(), record.tx_type);
            self.queue.send_expired_staking_event(&event).await?;

            // The event is durably queued; only now may the record go away.
            self.store.delete(&record.staking_tx_hash_hex).await?;
            debug!(tx_hash = %record.staking_tx_hash_hex, "expired delegation processed");
        }

        Ok(())
    }

    /// Health probe for external checks: pings the store.
    pub async fn health_check(&self) -> Result<(), ServiceError> {
        self.store.ping().await?;
        Ok(())
    }
}
