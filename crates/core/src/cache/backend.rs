//! Persisted cache tier.
//!
//! [`CacheBackend`] is the seam between the tiered cache and durable
//! storage. [`Database`] implements it over the `cache_entries` and
//! `cache_metadata` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row, Transaction, types::Type};

use crate::db::Database;
use crate::{Category, Error};

/// Payload layout version. Entries written under another version are
/// never returned and are removed by the expiry sweep.
pub const CACHE_FORMAT_VERSION: &str = "1";

/// A serialized cached value.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub category: Category,
    /// JSON-encoded value.
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Per-category summary kept alongside the entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CacheMetadata {
    pub category: Category,
    pub last_updated: DateTime<Utc>,
    /// Live entries tagged with this category.
    pub total_items: u64,
    pub version: String,
}

#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Entry for `key` if it exists, is current-version and expires after `now`.
    async fn load_live(&self, key: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>, Error>;

    /// Insert or fully replace an entry and refresh its category metadata.
    async fn store(&self, entry: &CacheEntry) -> Result<(), Error>;

    /// Remove entries with `expires_at <= now`. Returns rows removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error>;

    async fn delete_category(&self, category: Category) -> Result<u64, Error>;

    /// Remove every entry and all metadata.
    async fn delete_all(&self) -> Result<u64, Error>;

    async fn metadata(&self, category: Category) -> Result<Option<CacheMetadata>, Error>;
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, format!("timestamp out of range: {ms}").into())
    })
}

fn category_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Category> {
    let tag: String = row.get(idx)?;
    tag.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, format!("unknown cache category: {tag}").into())
    })
}

/// Recount live entries for `category` and stamp the metadata row.
fn refresh_metadata(tx: &Transaction<'_>, category: Category, now: DateTime<Utc>) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO cache_metadata (category, last_updated, total_items, version)
         VALUES (
             ?1, ?2,
             (SELECT COUNT(*) FROM cache_entries WHERE category = ?1 AND version = ?3 AND expires_at_ms > ?4),
             ?3
         )
         ON CONFLICT(category) DO UPDATE SET
             last_updated = excluded.last_updated,
             total_items = excluded.total_items,
             version = excluded.version",
        params![category.path(), now.to_rfc3339(), CACHE_FORMAT_VERSION, now.timestamp_millis()],
    )?;
    Ok(())
}

#[async_trait]
impl CacheBackend for Database {
    async fn load_live(&self, key: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheEntry>, Error> {
                let result = conn.query_row(
                    "SELECT key, category, payload, created_at_ms, expires_at_ms FROM cache_entries
                     WHERE key = ?1 AND version = ?2 AND expires_at_ms > ?3",
                    params![key, CACHE_FORMAT_VERSION, now.timestamp_millis()],
                    |row| {
                        Ok(CacheEntry {
                            key: row.get(0)?,
                            category: category_column(row, 1)?,
                            payload: row.get(2)?,
                            created_at: timestamp(row, 3)?,
                            expires_at: timestamp(row, 4)?,
                        })
                    },
                );

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn store(&self, entry: &CacheEntry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO cache_entries (key, category, payload, created_at_ms, expires_at_ms, version)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(key) DO UPDATE SET
                         category = excluded.category,
                         payload = excluded.payload,
                         created_at_ms = excluded.created_at_ms,
                         expires_at_ms = excluded.expires_at_ms,
                         version = excluded.version",
                    params![
                        entry.key,
                        entry.category.path(),
                        entry.payload,
                        entry.created_at.timestamp_millis(),
                        entry.expires_at.timestamp_millis(),
                        CACHE_FORMAT_VERSION,
                    ],
                )?;
                refresh_metadata(&tx, entry.category, entry.created_at)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let removed = tx.execute(
                    "DELETE FROM cache_entries WHERE expires_at_ms <= ?1 OR version <> ?2",
                    params![now.timestamp_millis(), CACHE_FORMAT_VERSION],
                )?;
                let tracked: Vec<String> = {
                    let mut stmt = tx.prepare("SELECT category FROM cache_metadata")?;
                    stmt.query_map([], |row| row.get(0))?
                        .collect::<Result<_, _>>()?
                };
                for tag in tracked {
                    if let Ok(category) = tag.parse::<Category>() {
                        refresh_metadata(&tx, category, now)?;
                    }
                }
                tx.commit()?;
                Ok(removed as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_category(&self, category: Category) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let removed = tx.execute("DELETE FROM cache_entries WHERE category = ?1", params![category.path()])?;
                refresh_metadata(&tx, category, Utc::now())?;
                tx.commit()?;
                Ok(removed as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_all(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let removed = tx.execute("DELETE FROM cache_entries", [])?;
                tx.execute("DELETE FROM cache_metadata", [])?;
                tx.commit()?;
                Ok(removed as u64)
            })
            .await
            .map_err(Error::from)
    }

    async fn metadata(&self, category: Category) -> Result<Option<CacheMetadata>, Error> {
        self.conn
            .call(move |conn| -> Result<Option<CacheMetadata>, Error> {
                let result = conn.query_row(
                    "SELECT last_updated, total_items, version FROM cache_metadata WHERE category = ?1",
                    params![category.path()],
                    |row| {
                        let last_updated: String = row.get(0)?;
                        let last_updated = DateTime::parse_from_rfc3339(&last_updated)
                            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?
                            .with_timezone(&Utc);
                        Ok(CacheMetadata {
                            category,
                            last_updated,
                            total_items: row.get::<_, i64>(1)?.max(0) as u64,
                            version: row.get(2)?,
                        })
                    },
                );

                match result {
                    Ok(meta) => Ok(Some(meta)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(key: &str, category: Category, ttl: Duration) -> CacheEntry {
        let now = Utc::now();
        CacheEntry {
            key: key.to_string(),
            category,
            payload: "[]".to_string(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let db = Database::open_in_memory().await.unwrap();
        db.store(&entry("spells:fireball", Category::Spells, Duration::hours(1)))
            .await
            .unwrap();

        let loaded = db.load_live("spells:fireball", Utc::now()).await.unwrap().unwrap();
        assert_eq!(loaded.category, Category::Spells);
        assert_eq!(loaded.payload, "[]");

        let meta = db.metadata(Category::Spells).await.unwrap().unwrap();
        assert_eq!(meta.total_items, 1);
        assert_eq!(meta.version, CACHE_FORMAT_VERSION);
    }

    #[tokio::test]
    async fn test_expired_rows_are_invisible() {
        let db = Database::open_in_memory().await.unwrap();
        db.store(&entry("spells:all:all", Category::Spells, Duration::seconds(-1)))
            .await
            .unwrap();

        assert!(db.load_live("spells:all:all", Utc::now()).await.unwrap().is_none());
        assert_eq!(db.delete_expired(Utc::now()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_other_version_is_invisible_and_swept() {
        let db = Database::open_in_memory().await.unwrap();
        db.store(&entry("races:elf", Category::Races, Duration::hours(1)))
            .await
            .unwrap();
        db.conn
            .call(|conn| conn.execute("UPDATE cache_entries SET version = '0'", []))
            .await
            .unwrap();

        assert!(db.load_live("races:elf", Utc::now()).await.unwrap().is_none());
        assert_eq!(db.delete_expired(Utc::now()).await.unwrap(), 1);
        assert_eq!(db.metadata(Category::Races).await.unwrap().unwrap().total_items, 0);
    }

    #[tokio::test]
    async fn test_delete_category_keeps_others() {
        let db = Database::open_in_memory().await.unwrap();
        db.store(&entry("races:elf", Category::Races, Duration::hours(1)))
            .await
            .unwrap();
        db.store(&entry("feats:alert", Category::Feats, Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(db.delete_category(Category::Races).await.unwrap(), 1);
        assert!(db.load_live("races:elf", Utc::now()).await.unwrap().is_none());
        assert!(db.load_live("feats:alert", Utc::now()).await.unwrap().is_some());
        assert_eq!(db.metadata(Category::Races).await.unwrap().unwrap().total_items, 0);
    }

    #[tokio::test]
    async fn test_delete_all_drops_metadata() {
        let db = Database::open_in_memory().await.unwrap();
        db.store(&entry("races:elf", Category::Races, Duration::hours(1)))
            .await
            .unwrap();

        assert_eq!(db.delete_all().await.unwrap(), 1);
        assert!(db.metadata(Category::Races).await.unwrap().is_none());
    }
}
