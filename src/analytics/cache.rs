use crate::error::{AppError, AppResult};
use moka::sync::Cache;
use moka::Expiry;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Source of "now" for cache freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
    ttl: Duration,
}

/// Lets moka reclaim memory for entries once their TTL has passed in real time.
/// Freshness on read is decided by the injected [`Clock`].
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Outcome of [`AnalyticsCache::get_or_compute`].
#[derive(Debug)]
pub struct Cached<T> {
    pub cached: bool,
    pub data: T,
}

/// Process-wide response cache for analytics endpoints, keyed on
/// `"{endpoint}:{normalized params as JSON}"`. Values are stored serialized.
pub struct AnalyticsCache {
    inner: Cache<String, CacheEntry>,
    clock: Arc<dyn Clock>,
    generation: AtomicU64,
}

impl AnalyticsCache {
    pub fn new(max_entries: u64) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(max_entries: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryExpiry)
                .build(),
            clock,
            generation: AtomicU64::new(0),
        }
    }

    pub fn cache_key<P: Serialize>(endpoint: &str, params: &P) -> AppResult<String> {
        let params = serde_json::to_string(params)
            .map_err(|e| AppError::Internal(format!("cache key serialize: {e}")))?;
        Ok(format!("{endpoint}:{params}"))
    }

    /// Serialized value for `key`, if present and not yet expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let entry = self.inner.get(key)?;
        if self.clock.now() < entry.expires_at {
            Some(entry.value)
        } else {
            self.inner.invalidate(key);
            None
        }
    }

    pub fn insert(&self, key: String, value: String, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: self.clock.now() + ttl,
            ttl,
        };
        self.inner.insert(key, entry);
    }

    /// Serve `key` from cache, or run `compute` and store its result for `ttl`.
    ///
    /// Concurrent misses on the same key each run `compute`; the last one to
    /// finish wins. A result computed across an [`invalidate_all`] is returned
    /// to its caller but not stored. Errors from `compute` are never cached.
    ///
    /// [`invalidate_all`]: AnalyticsCache::invalidate_all
    pub async fn get_or_compute<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> AppResult<Cached<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(hit) = self.get(key) {
            let data = serde_json::from_str(&hit)
                .map_err(|e| AppError::Internal(format!("cache deserialize: {e}")))?;
            tracing::debug!(key, "analytics cache hit");
            return Ok(Cached { cached: true, data });
        }

        let generation = self.generation.load(Ordering::Acquire);
        let data = compute().await?;

        if self.generation.load(Ordering::Acquire) == generation {
            let json = serde_json::to_string(&data)
                .map_err(|e| AppError::Internal(format!("cache serialize: {e}")))?;
            self.insert(key.to_string(), json, ttl);
            // An invalidation may have landed between the check and the insert.
            if self.generation.load(Ordering::Acquire) != generation {
                self.inner.invalidate(key);
                tracing::debug!(key, "cache invalidated during store, entry dropped");
            }
        } else {
            tracing::debug!(key, "cache invalidated during compute, result not stored");
        }

        Ok(Cached {
            cached: false,
            data,
        })
    }

    /// Drop every entry regardless of TTL.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.inner.invalidate_all();
    }
}
