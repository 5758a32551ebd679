//! Native logging for tests and host tooling.
//!
//! `RUST_LOG` wins over the configured directive. Set `PHANTOM_LINK_LOG_JSON=1`
//! for one JSON object per event.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ConnectorConfig;

const JSON_ENV: &str = "PHANTOM_LINK_LOG_JSON";

fn filter_for(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install a stderr subscriber using `config.log_level` as the default
/// directive. Later calls are ignored.
pub fn init_logging(config: &ConnectorConfig) {
    let use_json = std::env::var(JSON_ENV).map(|value| value == "1").unwrap_or(false);

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter_for(&config.log_level))
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = if use_json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}
