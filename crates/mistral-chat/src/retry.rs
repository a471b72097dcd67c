//! Exponential backoff around request sends
//!
//! Connection failures, 408, 429 and 5xx responses are transient and get
//! retried by the middleware; every other status is returned at once.

use mistral_config::RetryConfig;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{Jitter, RetryTransientMiddleware};

/// Backoff schedule for `config`
///
/// `max_attempts` counts the first send, so the policy allows one retry
/// less.
pub fn backoff_policy(config: &RetryConfig) -> ExponentialBackoff {
    let jitter = if config.jitter { Jitter::Bounded } else { Jitter::None };

    ExponentialBackoff::builder()
        .retry_bounds(config.base_delay(), config.max_delay())
        .base(config.backoff_multiplier)
        .jitter(jitter)
        .build_with_max_retries(config.max_attempts.saturating_sub(1))
}

/// Wrap `client` so sends are retried on transient failures
pub fn with_retries(client: Client, config: &RetryConfig) -> ClientWithMiddleware {
    ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(backoff_policy(config)))
        .build()
}
