//! Query results cache shared across cursor adapters.
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use anyhow::Result;
use cached::Cached;
use cached::TimedSizedCache;
use mongodb::bson::Document;

use crate::conf::CacheConf;

/// Least recently used cache of raw query results with expiring entries.
///
/// Clones share the same underlying storage.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<Mutex<TimedSizedCache<String, Vec<Document>>>>,
}

impl QueryCache {
    /// Create a cache with the configured capacity and entries lifespan.
    pub fn new(conf: &CacheConf) -> Result<QueryCache> {
        conf.validate()?;
        let entries = TimedSizedCache::with_size_and_lifespan(conf.capacity, conf.expiration);
        Ok(QueryCache {
            entries: Arc::new(Mutex::new(entries)),
        })
    }

    /// Remove all cached results.
    pub fn clear(&self) {
        self.lock().cache_clear();
    }

    /// Look up unexpired results stored for `key`.
    pub fn get(&self, key: &str) -> Option<Vec<Document>> {
        let key = key.to_string();
        self.lock().cache_get(&key).cloned()
    }

    /// Number of entries currently stored, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.lock().cache_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store results for `key`, evicting the least recently used entry when full.
    pub fn set(&self, key: String, documents: Vec<Document>) {
        self.lock().cache_set(key, documents);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TimedSizedCache<String, Vec<Document>>> {
        // Cache operations can't leave entries half updated so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .finish()
    }
}
