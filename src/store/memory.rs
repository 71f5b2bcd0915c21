//! In-memory expiry store for tests and local runs without Postgres.
//! Mirrors the paging and delete semantics of the Postgres store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EXPIRED_QUERY_LIMIT, ExpiryStore, StoreError};
use crate::types::ExpiryRecord;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, ExpiryRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: ExpiryRecord) {
        self.records
            .write()
            .await
            .insert(record.staking_tx_hash_hex.clone(), record);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn contains(&self, staking_tx_hash_hex: &str) -> bool {
        self.records.read().await.contains_key(staking_tx_hash_hex)
    }
}

#[async_trait]
impl ExpiryStore for MemoryStore {
    async fn find_expired(&self, tip_height: u64) -> Result<Vec<ExpiryRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.expire_height <= tip_height)
            .take(EXPIRED_QUERY_LIMIT as usize)
            .cloned()
            .collect())
    }

    async fn delete(&self, staking_tx_hash_hex: &str) -> Result<(), StoreError> {
        match self.records.write().await.remove(staking_tx_hash_hex) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(staking_tx_hash_hex.to_string())),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StakingTxType;

    fn record(hash: &str, height: u64) -> ExpiryRecord {
        ExpiryRecord {
            staking_tx_hash_hex: hash.to_string(),
            expire_height: height,
            tx_type: StakingTxType::Active,
        }
    }

    #[tokio::test]
    async fn find_expired_filters_by_height() {
        let store = MemoryStore::new();
        store.insert(record("aa", 100)).await;
        store.insert(record("bb", 200)).await;
        store.insert(record("cc", 300)).await;

        let expired = store.find_expired(200).await.unwrap();
        let hashes: Vec<&str> = expired
            .iter()
            .map(|r| r.staking_tx_hash_hex.as_str())
            .collect();
        assert_eq!(hashes, vec!["aa", "bb"]);
    }

    #[tokio::test]
    async fn find_expired_caps_the_page() {
        let store = MemoryStore::new();
        for i in 0..15 {
            store.insert(record(&format!("tx{i:02}"), 100)).await;
        }

        let expired = store.find_expired(100).await.unwrap();
        assert_eq!(expired.len(), EXPIRED_QUERY_LIMIT as usize);
        assert_eq!(store.len().await, 15);
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let store = MemoryStore::new();
        store.insert(record("aa", 100)).await;

        store.delete("aa").await.unwrap();
        let err = store.delete("aa").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.is_empty().await);
    }
}
