//! # Telemetry
//!
//! Tracing subscriber setup. Production emits Bunyan-formatted JSON lines for
//! log shippers; every other environment gets the human-readable fmt layer.

use tracing::subscriber::set_global_default;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Installs the global tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is not set.
pub fn init_subscriber(name: &str, default_filter: &str, json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let result = if json {
        let subscriber = Registry::default()
            .with(env_filter)
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new(name.to_string(), std::io::stdout));
        set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(env_filter).with(fmt::layer());
        set_global_default(subscriber)
    };

    if let Err(e) = result {
        eprintln!("Tracing subscriber already installed: {e}");
    }
}
