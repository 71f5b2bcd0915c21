//! Poll loop driving the expiry service.
//!
//! Cycles run strictly one at a time: a tick never starts a new cycle while
//! the previous one is in flight. Cycle errors are logged and retried on the
//! next tick, never propagated; transient oracle, store or broker failures
//! self-heal this way.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::metrics::{ObservabilitySink, Outcome};
use crate::service::{ExpiryService, ServiceError};

pub struct Poller {
    service: Arc<ExpiryService>,
    poll_interval: Duration,
    sink: Arc<dyn ObservabilitySink>,
    shutdown: CancellationToken,
}

impl Poller {
    /// `shutdown` is the externally owned cancellation signal. The poller
    /// derives a child token so that both external cancellation and
    /// [`Poller::stop`] end the loop.
    pub fn new(
        service: Arc<ExpiryService>,
        poll_interval: Duration,
        sink: Arc<dyn ObservabilitySink>,
        shutdown: &CancellationToken,
    ) -> Self {
        Self {
            service,
            poll_interval,
            sink,
            shutdown: shutdown.child_token(),
        }
    }

    /// Signals the loop to exit before its next cycle. Idempotent.
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    pub async fn run(&self) {
        info!(interval = ?self.poll_interval, "poller starting");

        // A zero interval means back-to-back cycles; tokio's interval
        // requires a non-zero period.
        let period = self.poll_interval.max(Duration::from_millis(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("poller shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    let start = Instant::now();
                    let result = self.service.run_cycle(&self.shutdown).await;
                    self.sink.observe("poll", Outcome::of(&result), start.elapsed());

                    match result {
                        Ok(()) => {}
                        Err(ServiceError::Cancelled) => {
                            info!("cycle interrupted by shutdown");
                        }
                        Err(e) => error!("error processing expired delegations: {e}"),
                    }
                }
            }
        }
    }
}
