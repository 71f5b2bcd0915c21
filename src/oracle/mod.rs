//! Chain height oracle.
//!
//! Read-only view of the chain tip, backed by a remote node. The oracle never
//! retries: a failed call aborts the current poll cycle and the next tick
//! re-attempts from scratch.

pub mod btc;
pub mod error;

pub use btc::BtcRpcOracle;
pub use error::OracleError;

use async_trait::async_trait;

#[async_trait]
pub trait ChainHeightOracle: Send + Sync {
    /// Current confirmed tip height of the chain.
    async fn tip_height(&self) -> Result<u64, OracleError>;
}
