use chrono::{DateTime, Duration, Utc};
use tracing::debug;

pub const DEFAULT_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub loaded_at: DateTime<Utc>,
}

/// Read-through cache holding a single value for a fixed time.
///
/// The caller owns the cache and passes the current time in, so expiry is
/// decided only by `now - loaded_at` against the TTL.
#[derive(Debug)]
pub struct DatasetCache<T> {
    ttl: Duration,
    entry: Option<CacheEntry<T>>,
}

impl<T> DatasetCache<T> {
    pub fn new(ttl: Duration) -> Self {
        DatasetCache { ttl, entry: None }
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.entry.as_ref().map(|entry| entry.loaded_at)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|entry| now - entry.loaded_at < self.ttl)
    }

    /// Returns the cached value, calling `load` first when the cache is empty
    /// or expired. A failed load leaves the cache empty.
    pub fn get_or_load<E, F>(&mut self, now: DateTime<Utc>, load: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let entry = match self.entry.take() {
            Some(entry) if now - entry.loaded_at < self.ttl => entry,
            previous => {
                debug!(expired = previous.is_some(), "loading dataset");
                CacheEntry {
                    value: load()?,
                    loaded_at: now,
                }
            }
        };
        Ok(&self.entry.insert(entry).value)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
