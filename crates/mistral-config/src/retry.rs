use std::time::Duration;

use serde::Deserialize;

/// Largest accepted backoff multiplier
pub const MAX_BACKOFF_MULTIPLIER: u32 = 10;

/// Largest accepted single delay, in milliseconds
pub const MAX_DELAY_MS: u64 = 5 * 60 * 1000;

/// Exponential backoff settings for the outbound request
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Exponent base applied to the delay after each failed attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
    /// Randomize each delay within its backoff window
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: default_jitter(),
        }
    }
}

impl RetryConfig {
    /// Delay before the first retry
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Cap on any single delay
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Validate the policy
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_owned());
        }
        if !(2..=MAX_BACKOFF_MULTIPLIER).contains(&self.backoff_multiplier) {
            return Err(format!(
                "retry.backoff_multiplier must be between 2 and {MAX_BACKOFF_MULTIPLIER}"
            ));
        }
        if self.max_delay_ms > MAX_DELAY_MS {
            return Err(format!("retry.max_delay_ms must not exceed {MAX_DELAY_MS}"));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err("retry.max_delay_ms must not be below retry.base_delay_ms".to_owned());
        }
        Ok(())
    }
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_base_delay_ms() -> u64 {
    500
}

const fn default_max_delay_ms() -> u64 {
    10_000
}

const fn default_backoff_multiplier() -> u32 {
    2
}

const fn default_jitter() -> bool {
    true
}
