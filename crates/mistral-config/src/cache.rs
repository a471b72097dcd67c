use serde::Deserialize;

/// Response cache bounds
///
/// Whether a node consults the cache is a node option (`node.cache`); this
/// section only sizes the cache shared by the host integration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseCacheConfig {
    /// Maximum number of cached outputs
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    /// Time-to-live for a cached output, in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

const fn default_max_entries() -> u64 {
    1000
}

#[allow(clippy::missing_const_for_fn)]
fn default_ttl_seconds() -> u64 {
    3600
}
