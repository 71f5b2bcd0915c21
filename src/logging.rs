use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initializes tracing with a daily-rolling file plus stdout output.
/// `RUST_LOG` overrides the configured level. The returned guard must stay
/// alive for the lifetime of the process.
pub fn init_logging(log_level: Option<&str>) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", "staking-expiry-checker.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = log_level.unwrap_or("info").to_string();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_layer = fmt::layer()
        .with_target(true)
        .with_writer(non_blocking)
        .with_ansi(false);
    let stdout_layer = fmt::layer().with_target(false).with_ansi(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    guard
}
