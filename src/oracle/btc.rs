//! Tip oracle backed by a bitcoind JSON-RPC endpoint.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bitcoincore_rpc::{Auth, Client, RpcApi};
use tracing::info;

use super::error::OracleError;
use super::ChainHeightOracle;
use crate::config::BtcConfig;
use crate::metrics::{ObservabilitySink, Outcome};

pub struct BtcRpcOracle {
    client: Arc<Client>,
    sink: Arc<dyn ObservabilitySink>,
}

impl BtcRpcOracle {
    pub fn new(cfg: &BtcConfig, sink: Arc<dyn ObservabilitySink>) -> Result<Self, OracleError> {
        let url = cfg.rpc_url();
        info!("connecting to bitcoind at {} ({})", url, cfg.net_params);

        let client = Client::new(
            &url,
            Auth::UserPass(cfg.rpc_user.clone(), cfg.rpc_pass.clone()),
        )?;

        Ok(Self {
            client: Arc::new(client),
            sink,
        })
    }
}

#[async_trait]
impl ChainHeightOracle for BtcRpcOracle {
    async fn tip_height(&self) -> Result<u64, OracleError> {
        let client = Arc::clone(&self.client);
        let start = Instant::now();

        // The RPC client is blocking; keep it off the async workers.
        let result = tokio::task::spawn_blocking(move || client.get_block_count())
            .await
            .map_err(OracleError::from)
            .and_then(|res| res.map_err(OracleError::from));

        self.sink
            .observe("get_block_count", Outcome::of(&result), start.elapsed());

        result
    }
}
