//! staking-expiry-checker
//!
//! Periodically detects staking positions whose timelock has elapsed and
//! announces their expiry to downstream consumers through a durable message
//! queue, deleting each record only after its event was confirmed accepted
//! by the broker. Delivery is at-least-once; consumers deduplicate by
//! `staking_tx_hash_hex`.
//!
//! # Modules
//!
//! - [`types`] - Shared domain types (records, tx kinds, networks)
//! - [`events`] - Staking event family and wire schema
//! - [`config`] - YAML configuration with startup validation
//! - [`logging`] - tracing setup
//! - [`metrics`] - Injected observability sink
//! - [`oracle`] - Chain tip oracle (bitcoind RPC)
//! - [`store`] - Expiry record store (Postgres, in-memory)
//! - [`queue`] - Durable event queue (RabbitMQ, in-memory)
//! - [`service`] - One detection cycle
//! - [`poller`] - Fixed-interval loop and shutdown lifecycle

pub mod config;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod oracle;
pub mod poller;
pub mod queue;
pub mod service;
pub mod store;
pub mod types;

// Convenient re-exports at crate root
pub use config::Config;
pub use events::{EventType, ExpiredStakingEvent, StakingEvent};
pub use metrics::{NoopSink, ObservabilitySink, Outcome, PrometheusSink};
pub use oracle::{BtcRpcOracle, ChainHeightOracle, OracleError};
pub use poller::Poller;
pub use queue::{MemoryQueueClient, Queue, QueueClient, QueueError, RabbitMqClient};
pub use service::{ExpiryService, ServiceError};
pub use store::{ExpiryStore, MemoryStore, PgExpiryStore, StoreError};
pub use types::{ExpiryRecord, StakingTxType, SupportedBtcNetwork};
