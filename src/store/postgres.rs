//! Postgres-backed expiry store.
//!
//! Schema:
//!
//! ```sql
//! CREATE TABLE timelock_queue (
//!     staking_tx_hash_hex TEXT PRIMARY KEY,
//!     expire_height       BIGINT NOT NULL,
//!     tx_type             TEXT NOT NULL
//! );
//! ```

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use super::{EXPIRED_QUERY_LIMIT, ExpiryStore, StoreError};
use crate::config::DbConfig;
use crate::types::{ExpiryRecord, StakingTxType};

pub struct PgExpiryStore {
    pool: PgPool,
}

impl PgExpiryStore {
    pub async fn connect(cfg: &DbConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect(&cfg.url)
            .await?;
        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpiryStore for PgExpiryStore {
    async fn find_expired(&self, tip_height: u64) -> Result<Vec<ExpiryRecord>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT staking_tx_hash_hex, expire_height, tx_type
               FROM timelock_queue
               WHERE expire_height <= $1
               LIMIT $2"#,
        )
        .bind(tip_height as i64)
        .bind(EXPIRED_QUERY_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let tx_type: String = row.get("tx_type");
            let tx_type = StakingTxType::from_str(&tx_type)
                .map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))?;
            records.push(ExpiryRecord {
                staking_tx_hash_hex: row.get("staking_tx_hash_hex"),
                expire_height: row.get::<i64, _>("expire_height") as u64,
                tx_type,
            });
        }
        Ok(records)
    }

    async fn delete(&self, staking_tx_hash_hex: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM timelock_queue WHERE staking_tx_hash_hex = $1")
            .bind(staking_tx_hash_hex)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(staking_tx_hash_hex.to_string()));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
