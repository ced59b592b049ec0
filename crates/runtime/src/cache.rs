//! Shared TTL cache for widget-data responses.
//!
//! One [`ResponseCache`] is constructed per application session and
//! injected into every [`WidgetRuntime`](crate::WidgetRuntime), so any
//! widget instance can populate or evict a key another instance reads.
//! Entries are keyed by `(endpoint, canonical params)`; different
//! parameter sets for the same endpoint never share an entry.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::fetch::QueryParams;

/// Default freshness window for cached responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// CacheKey
// ---------------------------------------------------------------------------

/// Identifies one cached response: endpoint plus canonical query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: String,
    params: String,
}

impl CacheKey {
    pub fn new(endpoint: &str, params: &QueryParams) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            params: params.canonical(),
        }
    }
}

// ---------------------------------------------------------------------------
// ResponseCache
// ---------------------------------------------------------------------------

struct CacheEntry {
    data: serde_json::Value,
    stored_at: Instant,
}

/// Process-wide response cache with a fixed TTL.
///
/// All access happens through short mutex-guarded critical sections; no
/// lock is ever held across an await point.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh cached response for `key`, if any.
    ///
    /// An expired entry is removed on the way out and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: CacheKey, data: serde_json::Value) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key,
            CacheEntry {
                data,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop one key (explicit refresh path).
    pub fn invalidate(&self, key: &CacheKey) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.remove(key);
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.clear();
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}
