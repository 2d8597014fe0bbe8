//! Two-tier TTL cache: process memory in front of a persisted backend.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use super::backend::{CacheBackend, CacheEntry, CacheMetadata};
use super::key::CacheKey;
use crate::db::Database;
use crate::{Category, Error};

/// Values are cached as JSON. An entry only enters memory after it was
/// written to, or read from, the backend, so memory never holds anything
/// the backend does not. Every mutation of both tiers runs under the memory
/// write lock, so a clear never interleaves with a write.
pub struct TieredCache<B = Database> {
    backend: B,
    memory: RwLock<HashMap<String, CacheEntry>>,
}

impl<B: CacheBackend> TieredCache<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, memory: RwLock::new(HashMap::new()) }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Look up a live value. Read and decode failures are logged and
    /// reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let now = Utc::now();

        let cached = self.memory.read().await.get(key.as_str()).cloned();
        if let Some(entry) = cached {
            if entry.is_live(now) {
                return decode(&entry);
            }
            self.memory.write().await.remove(key.as_str());
        }

        // Held across the backend read so a concurrent clear cannot land
        // between the read and the memory insert.
        let mut memory = self.memory.write().await;
        let entry = match self.backend.load_live(key.as_str(), now).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "persisted cache read failed");
                return None;
            }
        };

        let value = decode(&entry)?;
        memory.insert(entry.key.clone(), entry);
        Some(value)
    }

    /// Store `value` under `key` until `now + ttl`, replacing any previous
    /// entry. A non-positive TTL writes an already-expired entry.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T, ttl: Duration) -> Result<(), Error> {
        let now = Utc::now();
        let entry = CacheEntry {
            key: key.as_str().to_string(),
            category: key.category(),
            payload: serde_json::to_string(value)?,
            created_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .ok_or_else(|| Error::InvalidInput(format!("ttl out of range: {ttl}")))?,
        };

        let mut memory = self.memory.write().await;
        self.backend.store(&entry).await?;
        memory.insert(entry.key.clone(), entry);
        drop(memory);

        tracing::debug!(key = %key, ttl_secs = ttl.num_seconds(), "cached");
        Ok(())
    }

    /// Drop every entry with `expires_at <= now` from both tiers. Returns
    /// the number of persisted rows removed.
    pub async fn clear_expired(&self) -> Result<u64, Error> {
        let now = Utc::now();
        let mut memory = self.memory.write().await;
        let removed = self.backend.delete_expired(now).await?;
        memory.retain(|_, entry| entry.is_live(now));
        drop(memory);

        tracing::debug!(removed, "cleared expired cache entries");
        Ok(removed)
    }

    pub async fn clear_category(&self, category: Category) -> Result<u64, Error> {
        let mut memory = self.memory.write().await;
        let removed = self.backend.delete_category(category).await?;
        memory.retain(|_, entry| entry.category != category);
        drop(memory);

        tracing::info!(category = category.path(), removed, "cleared cache category");
        Ok(removed)
    }

    pub async fn clear_all(&self) -> Result<u64, Error> {
        let mut memory = self.memory.write().await;
        let removed = self.backend.delete_all().await?;
        memory.clear();
        drop(memory);

        tracing::info!(removed, "cleared cache");
        Ok(removed)
    }

    pub async fn metadata(&self, category: Category) -> Result<Option<CacheMetadata>, Error> {
        self.backend.metadata(category).await
    }

    /// Number of entries currently held in memory, live or not.
    pub async fn memory_len(&self) -> usize {
        self.memory.read().await.len()
    }

    /// Whether memory holds an entry for `key`, live or not.
    pub async fn in_memory(&self, key: &CacheKey) -> bool {
        self.memory.read().await.contains_key(key.as_str())
    }
}

fn decode<T: DeserializeOwned>(entry: &CacheEntry) -> Option<T> {
    match serde_json::from_str(&entry.payload) {
        Ok(value) => Some(value),
        Err(e) => {
            let err = Error::CacheRead(format!("{}: {e}", entry.key));
            tracing::warn!(error = %err, "cached payload could not be decoded");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::DateTime;

    async fn cache() -> TieredCache {
        TieredCache::new(Database::open_in_memory().await.unwrap())
    }

    /// Delegates to a real database but can be told to fail writes or reads.
    struct FlakyBackend {
        db: Database,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
    }

    #[async_trait]
    impl CacheBackend for FlakyBackend {
        async fn load_live(&self, key: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>, Error> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(Error::Internal("disk unavailable".into()));
            }
            self.db.load_live(key, now).await
        }

        async fn store(&self, entry: &CacheEntry) -> Result<(), Error> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Error::Internal("disk full".into()));
            }
            self.db.store(entry).await
        }

        async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
            self.db.delete_expired(now).await
        }

        async fn delete_category(&self, category: Category) -> Result<u64, Error> {
            self.db.delete_category(category).await
        }

        async fn delete_all(&self) -> Result<u64, Error> {
            self.db.delete_all().await
        }

        async fn metadata(&self, category: Category) -> Result<Option<CacheMetadata>, Error> {
            self.db.metadata(category).await
        }
    }

    async fn flaky() -> TieredCache<FlakyBackend> {
        TieredCache::new(FlakyBackend {
            db: Database::open_in_memory().await.unwrap(),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        })
    }

    /// Pauses every `store` after the write lands, until released.
    struct GatedBackend {
        db: Database,
        stored: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl CacheBackend for GatedBackend {
        async fn load_live(&self, key: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>, Error> {
            self.db.load_live(key, now).await
        }

        async fn store(&self, entry: &CacheEntry) -> Result<(), Error> {
            self.db.store(entry).await?;
            self.stored.notify_one();
            self.release.notified().await;
            Ok(())
        }

        async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
            self.db.delete_expired(now).await
        }

        async fn delete_category(&self, category: Category) -> Result<u64, Error> {
            self.db.delete_category(category).await
        }

        async fn delete_all(&self) -> Result<u64, Error> {
            self.db.delete_all().await
        }

        async fn metadata(&self, category: Category) -> Result<Option<CacheMetadata>, Error> {
            self.db.metadata(category).await
        }
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = cache().await;
        let key = CacheKey::slug(Category::Spells, "fireball");
        cache.set(&key, &vec!["fireball"], Duration::hours(1)).await.unwrap();

        let value: Option<Vec<String>> = cache.get(&key).await;
        assert_eq!(value, Some(vec!["fireball".to_string()]));
    }

    #[tokio::test]
    async fn test_negative_ttl_is_a_miss() {
        let cache = cache().await;
        let key = CacheKey::all(Category::Races, None);
        cache.set(&key, &vec![1, 2, 3], Duration::seconds(-1)).await.unwrap();

        assert!(cache.get::<Vec<i32>>(&key).await.is_none());
        assert!(!cache.in_memory(&key).await);
    }

    #[tokio::test]
    async fn test_persisted_tier_survives_restart() {
        let db = Database::open_in_memory().await.unwrap();
        let key = CacheKey::all(Category::Feats, Some(20));

        let first = TieredCache::new(db.clone());
        first.set(&key, &vec!["alert"], Duration::hours(1)).await.unwrap();

        let second = TieredCache::new(db);
        assert_eq!(second.memory_len().await, 0);
        assert_eq!(second.get::<Vec<String>>(&key).await, Some(vec!["alert".to_string()]));
        assert!(second.in_memory(&key).await);
    }

    #[tokio::test]
    async fn test_set_replaces() {
        let cache = cache().await;
        let key = CacheKey::slug(Category::Spells, "light");
        cache.set(&key, "old", Duration::hours(1)).await.unwrap();
        cache.set(&key, "new", Duration::hours(1)).await.unwrap();

        assert_eq!(cache.get::<String>(&key).await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_decode_failure_is_a_miss() {
        let cache = cache().await;
        let key = CacheKey::slug(Category::Spells, "light");
        cache.set(&key, &vec!["not", "numbers"], Duration::hours(1)).await.unwrap();

        assert!(cache.get::<Vec<i64>>(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_write_skips_memory() {
        let cache = flaky().await;
        cache.backend().fail_writes.store(true, Ordering::SeqCst);

        let key = CacheKey::slug(Category::Weapons, "club");
        assert!(cache.set(&key, "club", Duration::hours(1)).await.is_err());
        assert!(!cache.in_memory(&key).await);
        assert!(cache.get::<String>(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_read_failure_is_a_miss() {
        let cache = flaky().await;
        let key = CacheKey::slug(Category::Weapons, "club");
        cache.backend().db.store(&CacheEntry {
            key: key.as_str().to_string(),
            category: Category::Weapons,
            payload: "\"club\"".into(),
            created_at: Utc::now(),
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();
        cache.backend().fail_reads.store(true, Ordering::SeqCst);

        assert!(cache.get::<String>(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_clear_expired() {
        let cache = cache().await;
        let stale = CacheKey::all(Category::Spells, None);
        let fresh = CacheKey::all(Category::Spells, Some(20));
        cache.set(&stale, &Vec::<String>::new(), Duration::seconds(-5)).await.unwrap();
        cache.set(&fresh, &Vec::<String>::new(), Duration::hours(1)).await.unwrap();

        assert_eq!(cache.clear_expired().await.unwrap(), 1);
        assert_eq!(cache.memory_len().await, 1);
        assert!(cache.get::<Vec<String>>(&fresh).await.is_some());
    }

    #[tokio::test]
    async fn test_clear_category_and_all() {
        let cache = cache().await;
        let race = CacheKey::slug(Category::Races, "elf");
        let feat = CacheKey::slug(Category::Feats, "alert");
        cache.set(&race, "elf", Duration::hours(1)).await.unwrap();
        cache.set(&feat, "alert", Duration::hours(1)).await.unwrap();

        assert_eq!(cache.clear_category(Category::Races).await.unwrap(), 1);
        assert!(cache.get::<String>(&race).await.is_none());
        assert!(cache.get::<String>(&feat).await.is_some());
        assert_eq!(cache.metadata(Category::Races).await.unwrap().unwrap().total_items, 0);
        assert_eq!(cache.metadata(Category::Feats).await.unwrap().unwrap().total_items, 1);

        assert_eq!(cache.clear_all().await.unwrap(), 1);
        assert_eq!(cache.memory_len().await, 0);
        assert!(cache.metadata(Category::Feats).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_clear_during_set_leaves_no_memory_orphan() {
        let cache = std::sync::Arc::new(TieredCache::new(GatedBackend {
            db: Database::open_in_memory().await.unwrap(),
            stored: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        }));
        let key = CacheKey::all(Category::Races, None);

        let writer = {
            let (cache, key) = (cache.clone(), key.clone());
            tokio::spawn(async move { cache.set(&key, "stale", Duration::days(7)).await })
        };
        cache.backend().stored.notified().await;

        let clearer = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.clear_all().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        cache.backend().release.notify_one();

        writer.await.unwrap().unwrap();
        clearer.await.unwrap().unwrap();

        let persisted = cache.backend().db.load_live(key.as_str(), Utc::now()).await.unwrap();
        assert!(persisted.is_none());
        assert!(!cache.in_memory(&key).await);
        assert!(cache.get::<String>(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_out_of_range_ttl_is_rejected() {
        let cache = cache().await;
        let key = CacheKey::all(Category::Races, None);

        let err = cache.set(&key, "x", Duration::MAX).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!cache.in_memory(&key).await);
    }
}
