//! Search result cache
//!
//! Provides:
//! - Redis-backed get/set with TTL when Redis answers at startup
//! - A process-local map that takes over permanently on the first Redis failure
//! - Glob invalidation over either backend
//!
//! Cache failures never reach callers: reads degrade to misses and writes to no-ops.

use crate::config::RedisConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL (redis://host:port)
    pub url: String,
    /// Attempt Redis at all
    pub enabled: bool,
    /// Default TTL in seconds
    pub default_ttl_secs: u64,
    /// Key prefix for namespacing in Redis
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from(&RedisConfig::default())
    }
}

impl From<&RedisConfig> for CacheConfig {
    fn from(config: &RedisConfig) -> Self {
        Self {
            url: config.url.clone(),
            enabled: config.enabled,
            default_ttl_secs: config.default_ttl_secs,
            key_prefix: config.key_prefix.clone(),
        }
    }
}

struct MemoryEntry {
    json: String,
    expires_at: Instant,
}

/// Cache with a Redis primary and an in-memory fallback
pub struct Cache {
    redis: Option<MultiplexedConnection>,
    degraded: AtomicBool,
    memory: Mutex<HashMap<String, MemoryEntry>>,
    config: CacheConfig,
}

impl Cache {
    /// Connect to Redis, falling back to memory if it is disabled or unreachable
    pub async fn connect(config: CacheConfig) -> Self {
        if !config.enabled {
            info!("Redis disabled, using in-memory cache");
            return Self::in_memory(config);
        }

        match open_connection(&config.url).await {
            Ok(connection) => {
                info!(url = %config.url, "Connected to Redis cache");
                Self {
                    redis: Some(connection),
                    degraded: AtomicBool::new(false),
                    memory: Mutex::new(HashMap::new()),
                    config,
                }
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, using in-memory cache");
                Self::in_memory(config)
            }
        }
    }

    /// Create a cache that never talks to Redis
    pub fn in_memory(config: CacheConfig) -> Self {
        Self {
            redis: None,
            degraded: AtomicBool::new(true),
            memory: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Name of the backend currently serving requests
    pub fn backend(&self) -> &'static str {
        if self.active_redis().is_some() {
            "redis"
        } else {
            "memory"
        }
    }

    pub fn default_ttl_secs(&self) -> u64 {
        self.config.default_ttl_secs
    }

    /// Build a prefixed key
    fn key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    fn active_redis(&self) -> Option<MultiplexedConnection> {
        if self.degraded.load(Ordering::Acquire) {
            return None;
        }
        self.redis.clone()
    }

    /// Switch to memory for the rest of the process. Returns true on the first switch.
    fn fall_back(&self, err: &AppError) -> bool {
        let first = !self.degraded.swap(true, Ordering::AcqRel);
        if first {
            warn!(error = %err, "Redis error, switching to in-memory cache");
        }
        first
    }

    /// Get a value from cache. Errors and undecodable values are misses.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = match self.active_redis() {
            Some(mut conn) => {
                let full_key = self.key(key);
                match conn.get::<_, Option<String>>(&full_key).await {
                    Ok(value) => value,
                    Err(e) => {
                        self.fall_back(&AppError::from(e));
                        self.memory_get(key).await
                    }
                }
            }
            None => self.memory_get(key).await,
        };

        let parsed = json.and_then(|json| match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        });

        metrics::record_cache(parsed.is_some(), "search");
        if parsed.is_some() {
            debug!(key, "Cache hit");
        } else {
            debug!(key, "Cache miss");
        }
        parsed
    }

    /// Set a value in cache with the default TTL
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.config.default_ttl_secs).await
    }

    /// Set a value in cache with a custom TTL
    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache value");
                return;
            }
        };

        if let Some(mut conn) = self.active_redis() {
            let full_key = self.key(key);
            match conn.set_ex::<_, _, ()>(&full_key, &json, ttl_secs).await {
                Ok(()) => {
                    debug!(key, ttl_secs, "Cache set");
                    return;
                }
                Err(e) => {
                    self.fall_back(&AppError::from(e));
                }
            }
        }

        self.memory_set(key, json, ttl_secs).await;
        debug!(key, ttl_secs, "Cache set (memory)");
    }

    /// Remove every key matching a glob pattern (`*` and `?` wildcards).
    /// Returns the number of keys removed.
    pub async fn invalidate(&self, pattern: &str) -> usize {
        if let Some(mut conn) = self.active_redis() {
            match redis_invalidate(&mut conn, &self.key(pattern)).await {
                Ok(removed) => {
                    info!(pattern, removed, "Cache invalidated");
                    return removed;
                }
                Err(e) => {
                    self.fall_back(&e);
                }
            }
        }

        let matcher = match glob_matcher(pattern) {
            Some(matcher) => matcher,
            None => return 0,
        };
        let mut memory = self.memory.lock().await;
        let before = memory.len();
        memory.retain(|key, _| !matcher.is_match(key));
        let removed = before - memory.len();
        info!(pattern, removed, "Cache invalidated (memory)");
        removed
    }

    async fn memory_get(&self, key: &str) -> Option<String> {
        let mut memory = self.memory.lock().await;
        let expired = match memory.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => return Some(entry.json.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            memory.remove(key);
        }
        None
    }

    /// Expired entries are swept on every write.
    async fn memory_set(&self, key: &str, json: String, ttl_secs: u64) {
        let now = Instant::now();
        let entry = MemoryEntry {
            json,
            expires_at: now + Duration::from_secs(ttl_secs),
        };
        let mut memory = self.memory.lock().await;
        memory.retain(|_, e| now < e.expires_at);
        memory.insert(key.to_string(), entry);
    }
}

async fn open_connection(url: &str) -> Result<MultiplexedConnection> {
    let client = Client::open(url).map_err(|e| AppError::CacheError {
        message: format!("Failed to create Redis client: {}", e),
    })?;

    let mut connection = tokio::time::timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection())
        .await
        .map_err(|_| AppError::CacheError {
            message: "Timed out connecting to Redis".to_string(),
        })??;

    redis::cmd("PING")
        .query_async::<String>(&mut connection)
        .await?;

    Ok(connection)
}

async fn redis_invalidate(conn: &mut MultiplexedConnection, pattern: &str) -> Result<usize> {
    let keys: Vec<String> = conn.keys(pattern).await?;
    if keys.is_empty() {
        return Ok(0);
    }
    let removed: usize = conn.del(keys).await?;
    Ok(removed)
}

fn glob_matcher(pattern: &str) -> Option<regex_lite::Regex> {
    let mut expr = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex_lite::escape(&other.to_string())),
        }
    }
    expr.push('$');
    regex_lite::Regex::new(&expr).ok()
}

/// Cache key builder helpers
pub mod keys {
    use serde::Serialize;
    use sha2::{Digest, Sha256};

    /// Glob covering every cached search result set
    pub const ALL_SEARCHES: &str = "search:*";

    /// Key for a search result set. Object keys are serialized in sorted
    /// order, so equal parameter sets hash equally regardless of how they
    /// were assembled.
    pub fn search<T: Serialize>(params: &T) -> String {
        let canonical = serde_json::to_value(params)
            .map(|value| value.to_string())
            .unwrap_or_default();
        let digest = Sha256::digest(canonical.as_bytes());
        format!("search:{}", hex::encode(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn memory_cache() -> Cache {
        Cache::in_memory(CacheConfig::default())
    }

    #[tokio::test]
    async fn test_memory_set_and_get() {
        let cache = memory_cache();
        cache.set("search:abc", &json!({"total": 3})).await;

        let value: Option<serde_json::Value> = cache.get("search:abc").await;
        assert_eq!(value, Some(json!({"total": 3})));
        assert_eq!(cache.backend(), "memory");
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let cache = memory_cache();
        let value: Option<String> = cache.get("nope").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_read() {
        let cache = memory_cache();
        cache.set_with_ttl("short", &"value", 0).await;

        let value: Option<String> = cache.get("short").await;
        assert!(value.is_none());
        assert!(cache.memory.lock().await.get("short").is_none());
    }

    #[tokio::test]
    async fn test_write_sweeps_expired_entries() {
        let cache = memory_cache();
        for i in 0..100 {
            cache.set_with_ttl(&format!("search:{}", i), &i, 0).await;
        }
        cache.set("search:live", &"value").await;

        let memory = cache.memory.lock().await;
        assert_eq!(memory.len(), 1);
        assert!(memory.contains_key("search:live"));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let cache = memory_cache();
        cache.set("k", &"not a number").await;
        let value: Option<u64> = cache.get("k").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_glob() {
        let cache = memory_cache();
        cache.set("search:1", &1).await;
        cache.set("search:2", &2).await;
        cache.set("other:1", &3).await;

        assert_eq!(cache.invalidate("search:*").await, 2);
        assert!(cache.get::<i32>("search:1").await.is_none());
        assert_eq!(cache.get::<i32>("other:1").await, Some(3));
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_memory() {
        let config = CacheConfig {
            url: "redis://127.0.0.1:1".to_string(),
            enabled: true,
            ..CacheConfig::default()
        };
        let cache = Cache::connect(config).await;
        assert_eq!(cache.backend(), "memory");

        cache.set("search:x", &vec![1, 2, 3]).await;
        assert_eq!(cache.get::<Vec<i32>>("search:x").await, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_fallback_is_reported_once() {
        let cache = Cache {
            redis: None,
            degraded: AtomicBool::new(false),
            memory: Mutex::new(HashMap::new()),
            config: CacheConfig::default(),
        };
        let err = AppError::CacheError {
            message: "connection reset".to_string(),
        };

        assert!(cache.fall_back(&err));
        assert!(!cache.fall_back(&err));
        assert_eq!(cache.backend(), "memory");
    }

    #[test]
    fn test_glob_matcher() {
        let matcher = glob_matcher("search:*").unwrap();
        assert!(matcher.is_match("search:abc"));
        assert!(!matcher.is_match("xsearch:abc"));

        let literal = glob_matcher("a.b?").unwrap();
        assert!(literal.is_match("a.bc"));
        assert!(!literal.is_match("axbc"));
    }

    #[test]
    fn test_search_key_ignores_field_order() {
        let a = json!({"query": "ai", "limit": 25, "page": 1});
        let b = json!({"page": 1, "limit": 25, "query": "ai"});
        assert_eq!(keys::search(&a), keys::search(&b));
        assert!(keys::search(&a).starts_with("search:"));
        assert_ne!(keys::search(&a), keys::search(&json!({"query": "ai", "limit": 26, "page": 1})));
    }
}
