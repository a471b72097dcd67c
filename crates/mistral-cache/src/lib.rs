//! Bounded in-memory response cache for node invocations
//!
//! Caches final node outputs keyed by a SHA-256 hash of the serialized
//! completion request, so changing any request field misses the cache.
//! The cache is an explicit object owned by the host integration and passed
//! to each node; entries expire after a TTL and the total count is capped.

use std::time::Duration;

use mini_moka::sync::Cache;
use mistral_config::ResponseCacheConfig;
use mistral_core::NodeOutput;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// The request could not be serialized into a key
    #[error("serialization: {0}")]
    Serialization(String),
}

/// Size- and time-bounded cache of final node outputs
///
/// Concurrent writers for the same key resolve last-write-wins.
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<String, NodeOutput>,
}

impl ResponseCache {
    /// Create a cache holding at most `max_entries` outputs for `ttl` each
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_entries).time_to_live(ttl).build(),
        }
    }

    /// Create a cache sized from configuration
    pub fn from_config(config: &ResponseCacheConfig) -> Self {
        Self::new(config.max_entries, Duration::from_secs(config.ttl_seconds))
    }

    /// Look up a cached output
    pub fn get(&self, cache_key: &str) -> Option<NodeOutput> {
        let hit = self.entries.get(&cache_key.to_owned());
        if hit.is_some() {
            tracing::debug!(cache_key, "cache hit");
        } else {
            tracing::debug!(cache_key, "cache miss");
        }
        hit
    }

    /// Store a final output
    pub fn put(&self, cache_key: &str, output: NodeOutput) {
        self.entries.insert(cache_key.to_owned(), output);
        tracing::debug!(cache_key, "cached output");
    }

    /// Drop a cached output
    pub fn invalidate(&self, cache_key: &str) {
        self.entries.invalidate(&cache_key.to_owned());
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache").finish_non_exhaustive()
    }
}

/// Compute a SHA-256 cache key from a serializable request
///
/// # Errors
///
/// Returns `CacheError::Serialization` if the request cannot be encoded
pub fn compute_cache_key<T: serde::Serialize>(request: &T) -> Result<String, CacheError> {
    let json = serde_json::to_string(request).map_err(|e| CacheError::Serialization(e.to_string()))?;
    let hash = Sha256::digest(json.as_bytes());
    Ok(format!("{hash:x}"))
}

#[cfg(test)]
mod tests {
    use mistral_core::ChatMessage;

    use super::*;

    fn output(text: &str) -> NodeOutput {
        NodeOutput {
            response: text.to_owned(),
            message: ChatMessage::assistant(text),
            all_messages: vec![ChatMessage::user("q"), ChatMessage::assistant(text)],
            usage: None,
            finish_reason: Some("stop".to_owned()),
        }
    }

    #[test]
    fn cache_key_deterministic() {
        let data = serde_json::json!({"model": "mistral-small-latest", "messages": [{"role": "user", "content": "hi"}]});
        assert_eq!(compute_cache_key(&data).unwrap(), compute_cache_key(&data).unwrap());
        assert_eq!(compute_cache_key(&data).unwrap().len(), 64);
    }

    #[test]
    fn cache_key_changes_with_any_field() {
        let a = serde_json::json!({"model": "mistral-small-latest", "temperature": 0.7});
        let b = serde_json::json!({"model": "mistral-small-latest", "temperature": 0.8});
        assert_ne!(compute_cache_key(&a).unwrap(), compute_cache_key(&b).unwrap());
    }

    #[test]
    fn miss_then_hit() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        assert!(cache.get("k").is_none());

        cache.put("k", output("cached"));
        assert_eq!(cache.get("k").unwrap().response, "cached");
    }

    #[test]
    fn last_write_wins() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        cache.put("k", output("first"));
        cache.put("k", output("second"));
        assert_eq!(cache.get("k").unwrap().response, "second");
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = ResponseCache::new(10, Duration::from_secs(60));
        cache.put("k", output("gone"));
        cache.invalidate("k");
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn entries_expire() {
        let cache = ResponseCache::new(10, Duration::from_millis(20));
        cache.put("k", output("stale"));
        std::thread::sleep(Duration::from_millis(60));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn sized_from_config() {
        let cache = ResponseCache::from_config(&ResponseCacheConfig::default());
        cache.put("k", output("ok"));
        assert!(cache.get("k").is_some());
    }
}
