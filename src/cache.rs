//! TTL cache over durable storage.
//!
//! Catalog pages and search results are cached for a fixed window so page
//! navigation does not hammer the backend. Every entry is wrapped in a
//! `CacheEntry` envelope carrying its write time and expiry; an expired or
//! unreadable entry behaves exactly like a miss and is dropped on contact.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::storage::Storage;

/// Consider catalog pages and search results stale after 15 minutes.
pub const CACHE_TTL_MINUTES: i64 = 15;

/// Key prefix for cached catalog pages.
pub const TRAINER_LIST_PREFIX: &str = "trainerList:";

/// Key prefix for cached search results.
pub const SEARCH_RESULTS_PREFIX: &str = "searchResults:";

/// Envelope persisted around every cached value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub written_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            data,
            written_at: now,
            expires_at: now + ttl,
        }
    }

    /// An entry is servable only strictly before its expiry.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

/// TTL cache for catalog pages and search results.
pub struct CacheStore {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl CacheStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self::with_ttl(storage, Duration::minutes(CACHE_TTL_MINUTES))
    }

    pub fn with_ttl(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    /// Cache key for one catalog page.
    pub fn trainer_list_key(page: u32) -> String {
        format!("{}{}", TRAINER_LIST_PREFIX, page)
    }

    /// Cache key for one page of search results. The query is normalized so
    /// that trivially different spellings share an entry; the page number is
    /// the digit-only suffix after the final `:`, so two distinct queries
    /// can never collide.
    pub fn search_results_key(query: &str, page: u32) -> String {
        format!("{}{}:{}", SEARCH_RESULTS_PREFIX, normalize_query(query), page)
    }

    /// Look up `key`, honoring expiry. Expired or unreadable entries are
    /// removed and reported as a miss; storage problems never propagate.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.storage.get(key)?;

        let entry: CacheEntry<Value> = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Discarding malformed cache entry");
                self.discard(key);
                return None;
            }
        };

        if entry.is_expired() {
            debug!(key, expired_at = %entry.expires_at, "Cache entry expired");
            self.discard(key);
            return None;
        }

        match serde_json::from_value(entry.data) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(key, error = %e, "Cache entry payload does not match expected shape");
                self.discard(key);
                None
            }
        }
    }

    /// Write `data` under `key` with the store's TTL, overwriting any
    /// existing entry.
    pub fn set<T: Serialize>(&self, key: &str, data: &T) -> anyhow::Result<()> {
        let entry = CacheEntry::new(serde_json::to_value(data)?, self.ttl);
        self.storage.set(key, serde_json::to_value(&entry)?)?;
        Ok(())
    }

    /// Remove every expired or unreadable catalog/search entry. Idempotent;
    /// a no-op on an empty cache.
    pub fn sweep(&self) {
        let mut removed = 0usize;
        for key in self.storage.keys() {
            if !Self::is_cache_key(&key) {
                continue;
            }
            let expired = match self.storage.get(&key) {
                Some(value) => match serde_json::from_value::<CacheEntry<Value>>(value) {
                    Ok(entry) => entry.is_expired(),
                    // Unreadable entries get swept along with expired ones.
                    Err(_) => true,
                },
                None => false,
            };
            if expired {
                self.discard(&key);
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "Swept expired cache entries");
        }
    }

    /// Drop all cached catalog pages and search results, fresh or not.
    /// Called after a mutating remote call invalidates server-side counts.
    pub fn invalidate_catalog(&self) {
        for key in self.storage.keys() {
            if Self::is_cache_key(&key) {
                self.discard(&key);
            }
        }
    }

    fn is_cache_key(key: &str) -> bool {
        key.starts_with(TRAINER_LIST_PREFIX) || key.starts_with(SEARCH_RESULTS_PREFIX)
    }

    fn discard(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            warn!(key, error = %e, "Failed to remove cache entry");
        }
    }
}

/// Normalize a search query for cache keying: trim and lowercase.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> (Arc<MemoryStorage>, CacheStore) {
        crate::init_test_tracing();
        let storage = Arc::new(MemoryStorage::new());
        let cache = CacheStore::new(storage.clone());
        (storage, cache)
    }

    /// Rewrite an entry's expiry so it looks `minutes` old past its TTL.
    fn expire(storage: &MemoryStorage, key: &str, minutes: i64) {
        let mut value = storage.get(key).unwrap();
        let past = Utc::now() - Duration::minutes(minutes);
        value["expires_at"] = serde_json::to_value(past).unwrap();
        storage.set(key, value).unwrap();
    }

    #[test]
    fn test_fresh_entry_is_served() {
        let (_, cache) = store();
        let key = CacheStore::trainer_list_key(1);
        cache.set(&key, &vec!["a", "b"]).unwrap();
        assert_eq!(cache.get::<Vec<String>>(&key), Some(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_removed() {
        let (storage, cache) = store();
        let key = CacheStore::trainer_list_key(1);
        cache.set(&key, &vec![1, 2]).unwrap();
        expire(&storage, &key, 1);

        assert_eq!(cache.get::<Vec<i32>>(&key), None);
        // The stale entry must not survive the read.
        assert!(storage.get(&key).is_none());
    }

    #[test]
    fn test_malformed_entry_is_a_miss() {
        let (storage, cache) = store();
        let key = CacheStore::trainer_list_key(3);
        storage.set(&key, serde_json::json!("not an envelope")).unwrap();

        assert_eq!(cache.get::<Vec<i32>>(&key), None);
        assert!(storage.get(&key).is_none());
    }

    #[test]
    fn test_distinct_queries_never_collide() {
        let a = CacheStore::search_results_key("a", 1);
        let b = CacheStore::search_results_key("b", 1);
        assert_ne!(a, b);

        // Same query, different casing/whitespace shares an entry.
        assert_eq!(
            CacheStore::search_results_key(" Portal ", 2),
            CacheStore::search_results_key("portal", 2)
        );

        // A query containing the separator still keys uniquely per page.
        assert_ne!(
            CacheStore::search_results_key("a:1", 2),
            CacheStore::search_results_key("a", 1)
        );
    }

    #[test]
    fn test_sweep_removes_only_expired_entries() {
        let (storage, cache) = store();
        let fresh = CacheStore::trainer_list_key(1);
        let stale = CacheStore::search_results_key("old", 1);
        cache.set(&fresh, &vec![1]).unwrap();
        cache.set(&stale, &vec![2]).unwrap();
        storage.set("installedTrainers", serde_json::json!([])).unwrap();
        expire(&storage, &stale, 30);

        cache.sweep();

        assert!(storage.get(&fresh).is_some());
        assert!(storage.get(&stale).is_none());
        // Non-cache keys are untouched.
        assert!(storage.get("installedTrainers").is_some());

        // Idempotent, including on an empty cache.
        cache.sweep();
        cache.sweep();
    }

    #[test]
    fn test_invalidate_catalog_drops_fresh_entries() {
        let (storage, cache) = store();
        let key = CacheStore::trainer_list_key(1);
        cache.set(&key, &vec![1]).unwrap();
        storage.set("storage_migrated", serde_json::json!(true)).unwrap();

        cache.invalidate_catalog();

        assert!(storage.get(&key).is_none());
        assert!(storage.get("storage_migrated").is_some());
    }

    #[test]
    fn test_overwrite_resets_expiry() {
        let (storage, cache) = store();
        let key = CacheStore::trainer_list_key(1);
        cache.set(&key, &vec![1]).unwrap();
        expire(&storage, &key, 1);
        cache.set(&key, &vec![2]).unwrap();

        assert_eq!(cache.get::<Vec<i32>>(&key), Some(vec![2]));
    }
}
