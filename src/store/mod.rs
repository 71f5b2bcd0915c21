//! Persistent collection of pending expiry records.
//!
//! One record per staking position with a known timelock, keyed by the
//! staking tx hash. The poll cycle reads eligible records and deletes each
//! one only after its expiry event has been confirmed by the broker.

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgExpiryStore;

use async_trait::async_trait;

use crate::types::ExpiryRecord;

/// Page cap on a single expiry query. Any un-deleted remainder stays
/// eligible and is picked up by the next poll cycle.
pub const EXPIRED_QUERY_LIMIT: i64 = 10;

#[async_trait]
pub trait ExpiryStore: Send + Sync {
    /// Every record whose `expire_height` is at or below `tip_height`,
    /// capped at [`EXPIRED_QUERY_LIMIT`] rows. Order is unspecified.
    async fn find_expired(&self, tip_height: u64) -> Result<Vec<ExpiryRecord>, StoreError>;

    /// Removes exactly one record by its staking tx hash. Zero matches is
    /// [`StoreError::NotFound`].
    async fn delete(&self, staking_tx_hash_hex: &str) -> Result<(), StoreError>;

    /// Liveness probe for health checks; not used by the poll cycle.
    async fn ping(&self) -> Result<(), StoreError>;
}
