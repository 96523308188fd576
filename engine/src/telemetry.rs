//! Telemetry
//!
//! Sets up `tracing-subscriber`. Logs go to stderr so command output on
//! stdout stays machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter for a log level.
///
/// Priority: `RUST_LOG` env var > `log_level` parameter
pub fn env_filter(log_level: &str) -> EnvFilter {
    let default_filter = format!("{},skillforge_engine={}", log_level, log_level);
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Initialize the tracing subscriber.
///
/// In debug builds: pretty-printed terminal output.
/// In release builds: JSON structured output with spans, so the
/// per-run `run_id` travels with every line.
///
/// Only the first call installs a subscriber; later calls are ignored.
pub fn init_telemetry_with_level(log_level: &str) {
    let filter = env_filter(log_level);

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }
}
