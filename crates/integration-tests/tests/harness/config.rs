//! Programmatic configuration builder for integration tests

use mistral_config::{Config, NodeConfig, RetryConfig};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Point a default config at `base_url` with a test key and fast retries
    pub fn new(base_url: &str) -> Self {
        let mut config = Config::default();
        config.mistral.api_key = Some(SecretString::from("test-key"));
        config.mistral.base_url = base_url.parse().expect("valid URL");
        config.retry = RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 10,
            backoff_multiplier: 2,
            jitter: false,
        };
        Self { config }
    }

    /// Drop the configured key and read it from a variable nobody sets
    pub fn without_api_key(mut self) -> Self {
        self.config.mistral.api_key = None;
        self.config.mistral.api_key_env = "MISTRAL_NODE_TEST_UNSET_KEY".to_owned();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.config.retry.max_attempts = max_attempts;
        self
    }

    /// Bound each read, and nothing else, to `secs`
    pub fn with_read_timeout(mut self, secs: u64) -> Self {
        self.config.mistral.read_timeout_secs = secs;
        self
    }

    /// Adjust node defaults
    pub fn with_node(mut self, update: impl FnOnce(&mut NodeConfig)) -> Self {
        update(&mut self.config.node);
        self
    }

    pub fn non_streaming(self) -> Self {
        self.with_node(|node| node.stream = false)
    }

    /// Build the final config, validated like a loaded one
    pub fn build(self) -> Config {
        self.config.validate().expect("valid test config");
        self.config
    }
}
