//! Short-lived read cache for expensive list queries.
//!
//! An injected component (a field of [`crate::Library`]), not process-global
//! state, so tests get isolated instances. Entries are type-erased JSON
//! values keyed by `"<entity>:<filter>"` strings; mutating operations evict
//! by key prefix rather than tracking exact filter combinations.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;

struct CacheEntry {
    value: serde_json::Value,
    created_at: Instant,
}

pub struct ReadCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ReadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh hit or nothing. Uses `try_lock` so a reader is never blocked on
    /// the cache; a contended lock just degrades to a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.try_lock().ok()?;
        if let Some(entry) = entries.get(key) {
            if entry.created_at.elapsed() <= self.ttl {
                return serde_json::from_value(entry.value.clone()).ok();
            }
        }
        entries.remove(key);
        None
    }

    /// Store a freshly computed result. Concurrent recomputes for the same
    /// key may race; both values are equally valid and the last one wins.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        if let Ok(mut entries) = self.entries.try_lock() {
            entries.insert(
                key.to_owned(),
                CacheEntry {
                    value,
                    created_at: Instant::now(),
                },
            );
        }
    }

    /// Evict every entry whose key starts with `prefix`. Called by each
    /// mutating operation that could change a cached result.
    pub fn invalidate(&self, prefix: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|key, _| !key.starts_with(prefix));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_within_ttl() {
        let cache = ReadCache::new(Duration::from_secs(5));
        cache.put("books:all", &vec!["dune".to_string()]);
        let hit: Option<Vec<String>> = cache.get("books:all");
        assert_eq!(hit, Some(vec!["dune".to_string()]));
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = ReadCache::new(Duration::from_millis(10));
        cache.put("books:all", &1);
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get::<i32>("books:all"), None);
    }

    #[test]
    fn invalidate_only_evicts_matching_prefix() {
        let cache = ReadCache::new(Duration::from_secs(5));
        cache.put("books:all", &1);
        cache.put("books:dune:", &2);
        cache.put("borrowers:all", &3);

        cache.invalidate("books");

        assert_eq!(cache.get::<i32>("books:all"), None);
        assert_eq!(cache.get::<i32>("books:dune:"), None);
        assert_eq!(cache.get::<i32>("borrowers:all"), Some(3));
    }

    #[test]
    fn miss_on_unknown_key() {
        let cache = ReadCache::new(Duration::from_secs(5));
        assert_eq!(cache.get::<i32>("books:all"), None);
    }
}
