//! Persistent reference store.
//!
//! One typed table per category. Batches are written atomically together
//! with their load-status row, so a category is either fully replaced or
//! left exactly as it was.

mod records;
mod search;
mod status;

pub use records::{
    AbilityScoreIncrease, Archetype, Background, Class, DocumentRef, Feat, MagicItem, Monster, MonsterAction,
    Race, Record, Spell, Speed, SpeedValue, Subrace, Weapon,
};
pub use search::SearchHit;
pub use status::{CORE_CATEGORIES, LoadStatus, STORE_FORMAT_VERSION};

use chrono::Utc;
use tokio_rusqlite::rusqlite::{self, params_from_iter, types::Value};
use tokio_rusqlite::params;

use crate::db::Database;
use crate::{Category, Error};
use records::{select_sql, upsert_sql};

/// Filters for [`ReferenceStore::spells`]. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpellFilter {
    pub level: Option<i64>,
    /// Exact school name, case-insensitive.
    pub school: Option<String>,
    /// Substring of the class list, case-insensitive.
    pub class: Option<String>,
}

/// Filters for [`ReferenceStore::monsters`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonsterFilter {
    pub cr: Option<f64>,
    /// Creature type (`dragon`, `humanoid`, ...), case-insensitive.
    pub kind: Option<String>,
}

/// Typed access to the reference tables.
#[derive(Clone, Debug)]
pub struct ReferenceStore {
    pub(crate) db: Database,
}

impl ReferenceStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Upsert a batch by slug and record its load status, in one
    /// transaction.
    ///
    /// Any failure rolls the whole batch back and is reported as
    /// [`Error::StoreWrite`]. Returns the number of records written.
    pub async fn store<R: Record>(&self, records: &[R]) -> Result<usize, Error> {
        let records = records.to_vec();
        let category = R::CATEGORY;
        let sql = upsert_sql::<R>();
        let loaded_at = Utc::now().to_rfc3339();

        let stored = self
            .db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                write_batch(conn, &sql, &records, &loaded_at)
                    .map_err(|e| Error::StoreWrite(format!("{}: {e}", category.name())))
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(category = category.name(), count = stored, "stored reference records");
        Ok(stored)
    }

    pub async fn store_races(&self, records: &[Race]) -> Result<usize, Error> {
        self.store(records).await
    }

    pub async fn store_classes(&self, records: &[Class]) -> Result<usize, Error> {
        self.store(records).await
    }

    pub async fn store_backgrounds(&self, records: &[Background]) -> Result<usize, Error> {
        self.store(records).await
    }

    pub async fn store_spells(&self, records: &[Spell]) -> Result<usize, Error> {
        self.store(records).await
    }

    pub async fn store_monsters(&self, records: &[Monster]) -> Result<usize, Error> {
        self.store(records).await
    }

    pub async fn store_weapons(&self, records: &[Weapon]) -> Result<usize, Error> {
        self.store(records).await
    }

    pub async fn store_magic_items(&self, records: &[MagicItem]) -> Result<usize, Error> {
        self.store(records).await
    }

    pub async fn store_feats(&self, records: &[Feat]) -> Result<usize, Error> {
        self.store(records).await
    }

    /// Point lookup by slug.
    pub async fn by_slug<R: Record>(&self, slug: &str) -> Result<Option<R>, Error> {
        let mut found = self
            .select::<R>("WHERE slug = ?1".into(), vec![Value::from(slug.to_string())])
            .await?;
        Ok(found.pop())
    }

    pub async fn race_by_slug(&self, slug: &str) -> Result<Option<Race>, Error> {
        self.by_slug(slug).await
    }

    pub async fn class_by_slug(&self, slug: &str) -> Result<Option<Class>, Error> {
        self.by_slug(slug).await
    }

    pub async fn background_by_slug(&self, slug: &str) -> Result<Option<Background>, Error> {
        self.by_slug(slug).await
    }

    pub async fn spell_by_slug(&self, slug: &str) -> Result<Option<Spell>, Error> {
        self.by_slug(slug).await
    }

    pub async fn monster_by_slug(&self, slug: &str) -> Result<Option<Monster>, Error> {
        self.by_slug(slug).await
    }

    pub async fn weapon_by_slug(&self, slug: &str) -> Result<Option<Weapon>, Error> {
        self.by_slug(slug).await
    }

    pub async fn magic_item_by_slug(&self, slug: &str) -> Result<Option<MagicItem>, Error> {
        self.by_slug(slug).await
    }

    pub async fn feat_by_slug(&self, slug: &str) -> Result<Option<Feat>, Error> {
        self.by_slug(slug).await
    }

    pub async fn races(&self) -> Result<Vec<Race>, Error> {
        self.select("ORDER BY name".into(), Vec::new()).await
    }

    pub async fn classes(&self) -> Result<Vec<Class>, Error> {
        self.select("ORDER BY name".into(), Vec::new()).await
    }

    pub async fn backgrounds(&self) -> Result<Vec<Background>, Error> {
        self.select("ORDER BY name".into(), Vec::new()).await
    }

    pub async fn feats(&self) -> Result<Vec<Feat>, Error> {
        self.select("ORDER BY name".into(), Vec::new()).await
    }

    /// Spells ordered by level, then name.
    pub async fn spells(&self, filter: &SpellFilter) -> Result<Vec<Spell>, Error> {
        self.select(
            "WHERE (?1 IS NULL OR level = ?1)
               AND (?2 IS NULL OR school = ?2 COLLATE NOCASE)
               AND (?3 IS NULL OR classes LIKE '%' || ?3 || '%')
             ORDER BY level, name"
                .into(),
            vec![
                Value::from(filter.level),
                Value::from(filter.school.clone()),
                Value::from(filter.class.clone()),
            ],
        )
        .await
    }

    /// Monsters ordered by challenge rating, then name.
    pub async fn monsters(&self, filter: &MonsterFilter) -> Result<Vec<Monster>, Error> {
        self.select(
            "WHERE (?1 IS NULL OR cr = ?1)
               AND (?2 IS NULL OR type = ?2 COLLATE NOCASE)
             ORDER BY cr, name"
                .into(),
            vec![Value::from(filter.cr), Value::from(filter.kind.clone())],
        )
        .await
    }

    /// Weapons in one category by name, or all weapons by category, then name.
    pub async fn weapons(&self, category: Option<&str>) -> Result<Vec<Weapon>, Error> {
        match category {
            Some(category) => {
                self.select(
                    "WHERE category = ?1 COLLATE NOCASE ORDER BY name".into(),
                    vec![Value::from(category.to_string())],
                )
                .await
            }
            None => self.select("ORDER BY category, name".into(), Vec::new()).await,
        }
    }

    /// Magic items of one rarity by name, or all items by rarity, then name.
    pub async fn magic_items(&self, rarity: Option<&str>) -> Result<Vec<MagicItem>, Error> {
        match rarity {
            Some(rarity) => {
                self.select(
                    "WHERE rarity = ?1 COLLATE NOCASE ORDER BY name".into(),
                    vec![Value::from(rarity.to_string())],
                )
                .await
            }
            None => self.select("ORDER BY rarity, name".into(), Vec::new()).await,
        }
    }

    /// Number of stored records in a category.
    pub async fn count(&self, category: Category) -> Result<u64, Error> {
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row(&format!("SELECT COUNT(*) FROM {}", category.table()), [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Empty every reference table and the load status, in one transaction.
    pub async fn clear_all(&self) -> Result<(), Error> {
        self.db
            .conn
            .call(|conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for category in Category::ALL {
                    tx.execute(&format!("DELETE FROM {}", category.table()), [])?;
                }
                tx.execute("DELETE FROM load_status", [])?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::info!("cleared reference store");
        Ok(())
    }

    async fn select<R: Record>(&self, clause: String, args: Vec<Value>) -> Result<Vec<R>, Error> {
        let sql = format!("{} {clause}", select_sql::<R>());
        self.db
            .conn
            .call(move |conn| -> Result<Vec<R>, Error> {
                let mut stmt = conn.prepare_cached(&sql)?;
                let rows = stmt.query_map(params_from_iter(args), R::from_row)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }
}

fn write_batch<R: Record>(
    conn: &mut rusqlite::Connection, sql: &str, records: &[R], loaded_at: &str,
) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(sql)?;
        for record in records {
            record.insert(&mut stmt)?;
        }
    }
    tx.execute(
        "INSERT INTO load_status (data_type, item_count, last_loaded, version)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(data_type) DO UPDATE SET
             item_count = excluded.item_count,
             last_loaded = excluded.last_loaded,
             version = excluded.version",
        params![R::CATEGORY.name(), records.len() as i64, loaded_at, STORE_FORMAT_VERSION],
    )?;
    tx.commit()?;
    Ok(records.len())
}
