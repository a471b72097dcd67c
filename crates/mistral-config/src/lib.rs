#![allow(clippy::must_use_candidate)]

pub mod cache;
mod env;
mod loader;
pub mod mistral;
pub mod node;
pub mod retry;
pub mod telemetry;

use serde::Deserialize;

pub use cache::*;
pub use mistral::*;
pub use node::*;
pub use retry::*;
pub use telemetry::*;

/// Top-level node configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Endpoint and credential settings
    #[serde(default)]
    pub mistral: MistralConfig,
    /// Node defaults applied when an input port is left unconnected
    #[serde(default)]
    pub node: NodeConfig,
    /// Response cache bounds
    #[serde(default)]
    pub cache: ResponseCacheConfig,
    /// Retry policy for the outbound request
    #[serde(default)]
    pub retry: RetryConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
