use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

/// Default Mistral API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Environment variable consulted when no key is configured
pub const DEFAULT_API_KEY_ENV: &str = "MISTRAL_API_KEY";

/// Endpoint and credential configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MistralConfig {
    /// API key for bearer authentication
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Environment variable read when `api_key` is unset
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Base URL override
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Timeout for establishing a connection, in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Longest wait for any single read, response head included, in seconds
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for MistralConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

impl MistralConfig {
    /// Resolve the credential
    ///
    /// The configured secret wins; otherwise the named environment variable
    /// is read. Blank values count as unset.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        if let Some(key) = &self.api_key
            && !key.expose_secret().trim().is_empty()
        {
            return Some(key.clone());
        }

        match std::env::var(&self.api_key_env) {
            Ok(value) if !value.trim().is_empty() => {
                tracing::debug!(env = %self.api_key_env, "using API key from environment");
                Some(SecretString::from(value))
            }
            _ => None,
        }
    }
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_owned()
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("valid default URL")
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

const fn default_read_timeout_secs() -> u64 {
    300
}
