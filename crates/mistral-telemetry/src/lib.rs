//! Logging setup for the Mistral node
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either
//! the human-readable or the JSON formatter.

use mistral_config::{LogFormat, TelemetryConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Build the filter, preferring `override_filter` over the configured one
///
/// Falls back to `info` when the directive does not parse.
pub fn build_filter(config: &TelemetryConfig, override_filter: Option<&str>) -> EnvFilter {
    let directive = override_filter.unwrap_or(&config.log_filter);
    EnvFilter::try_new(directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter `{directive}` ({e}), falling back to `info`");
        EnvFilter::new("info")
    })
}

/// Initialize the global subscriber
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &TelemetryConfig, override_filter: Option<&str>) -> anyhow::Result<()> {
    let filter = build_filter(config, override_filter);

    let result = match config.format {
        LogFormat::Text => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
        }
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_writer(std::io::stderr);

            tracing_subscriber::registry().with(filter).with(fmt_layer).try_init()
        }
    };

    result.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
