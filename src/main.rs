//! Service entry point: load and validate configuration, wire up the
//! observability sink, oracle, store and queue, then drive the poller until
//! the process is asked to shut down. Startup failures (bad config, broker
//! handshake, store connection) are fatal; everything after that is logged
//! and retried on the next tick.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::info;

use staking_expiry_checker::config::Config;
use staking_expiry_checker::events::EXPIRED_STAKING_QUEUE_NAME;
use staking_expiry_checker::logging;
use staking_expiry_checker::metrics::{ObservabilitySink, PrometheusSink};
use staking_expiry_checker::oracle::BtcRpcOracle;
use staking_expiry_checker::poller::Poller;
use staking_expiry_checker::queue::{Queue, RabbitMqClient};
use staking_expiry_checker::service::ExpiryService;
use staking_expiry_checker::store::PgExpiryStore;

fn config_path() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "config/config.yaml".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = config_path();
    let cfg = Config::from_file(&path)
        .with_context(|| format!("error while loading config file: {path}"))?;

    let _guard = logging::init_logging(cfg.poller.log_level.as_deref());

    let registry = prometheus::Registry::new();
    let sink: Arc<dyn ObservabilitySink> =
        Arc::new(PrometheusSink::new(&registry).context("error while registering metrics")?);
    // The registry is served by the operational HTTP surface; this process
    // only records into it.
    info!(port = cfg.metrics.port, "metrics sink initialized");

    let store = Arc::new(
        PgExpiryStore::connect(&cfg.db)
            .await
            .context("error while creating db client")?,
    );
    let oracle = Arc::new(
        BtcRpcOracle::new(&cfg.btc, sink.clone()).context("error while creating btc client")?,
    );
    let client = RabbitMqClient::connect(&cfg.queue.amqp_uri(), EXPIRED_STAKING_QUEUE_NAME)
        .await
        .context("failed to initialize staking event queue")?;
    let queue = Arc::new(Queue::new(Box::new(client), cfg.queue.processing_timeout()));

    let service = Arc::new(ExpiryService::new(store, oracle, queue.clone()));
    let shutdown = CancellationToken::new();
    let poller = Poller::new(service, cfg.poller.interval(), sink, &shutdown);

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received shutdown signal");
                shutdown.cancel();
            }
        }
    });

    poller.run().await;
    queue.shutdown().await;
    info!("shutdown complete");

    Ok(())
}
