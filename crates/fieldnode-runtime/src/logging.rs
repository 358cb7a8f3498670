//! Tracing subscriber setup for hosts that want the node's default logging

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::LogConfig;

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `config.level`. Returns false if a
/// subscriber was already installed; calling it twice is harmless.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_timer(fmt::time::uptime()))
            .try_init()
    };

    installed.is_ok()
}
