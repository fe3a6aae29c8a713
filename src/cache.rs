use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tokio::time::Instant;

/// Returns `true` for methods whose responses may be cached.
///
/// Compared case-insensitively, so an extension method spelled `get` counts.
pub fn is_cacheable(method: &Method) -> bool {
    let name = method.as_str();
    name.eq_ignore_ascii_case("GET") || name.eq_ignore_ascii_case("HEAD")
}

/// Derives the cache fingerprint of a request.
///
/// The URL is length-prefixed so that distinct `(url, body)` pairs can never
/// concatenate to the same key.
pub fn cache_key(method: &Method, url: &str, body: Option<&str>) -> String {
    format!("{method}:{}:{url}:{}", url.len(), body.unwrap_or(""))
}

#[derive(Clone, Debug)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

/// In-memory response cache with per-entry TTL.
///
/// Cloning is cheap and every clone shares the same entries. Expired entries
/// are dropped lazily when read, or in bulk by [`ResponseCache::purge_expired`].
#[derive(Clone, Default)]
pub struct ResponseCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.len())
            .finish()
    }
}

impl ResponseCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored value unless it is missing or older than its TTL.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if entry.is_expired(Instant::now()) {
            entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Stores `value`, replacing any previous entry and restarting its TTL.
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        self.lock().insert(
            key.into(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Removes an entry, returning its value even if expired.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key).map(|entry| entry.value)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
