//! Per-category load bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Row, types::Type};

use super::ReferenceStore;
use crate::{Category, Error};

/// Layout version of the reference tables. Bump when a record's columns or
/// nested JSON shape change; rows written under another version are
/// reloaded.
pub const STORE_FORMAT_VERSION: &str = "1";

/// Categories that must be present before the store is considered usable.
pub const CORE_CATEGORIES: [Category; 3] = [Category::Races, Category::Classes, Category::Backgrounds];

/// Outcome of the last bulk store for a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct LoadStatus {
    pub category: Category,
    pub item_count: u64,
    pub last_loaded: DateTime<Utc>,
    pub version: String,
}

impl LoadStatus {
    /// Written under the current table layout.
    pub fn is_current(&self) -> bool {
        self.version == STORE_FORMAT_VERSION
    }
}

fn status_from_row(row: &Row<'_>) -> rusqlite::Result<Option<LoadStatus>> {
    let data_type: String = row.get(0)?;
    let Ok(category) = data_type.parse::<Category>() else {
        return Ok(None);
    };
    let last_loaded: String = row.get(2)?;
    let last_loaded = DateTime::parse_from_rfc3339(&last_loaded)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Some(LoadStatus {
        category,
        item_count: row.get::<_, i64>(1)?.max(0) as u64,
        last_loaded,
        version: row.get(3)?,
    }))
}

impl ReferenceStore {
    /// Status row for one category, if it was ever loaded.
    pub async fn load_status(&self, category: Category) -> Result<Option<LoadStatus>, Error> {
        self.db
            .conn
            .call(move |conn| -> Result<Option<LoadStatus>, Error> {
                let result = conn.query_row(
                    "SELECT data_type, item_count, last_loaded, version FROM load_status WHERE data_type = ?1",
                    params![category.name()],
                    status_from_row,
                );

                match result {
                    Ok(status) => Ok(status),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Every status row, ordered by category name. Rows naming a category
    /// this build does not know are skipped.
    pub async fn all_load_status(&self) -> Result<Vec<LoadStatus>, Error> {
        self.db
            .conn
            .call(|conn| -> Result<Vec<LoadStatus>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT data_type, item_count, last_loaded, version FROM load_status ORDER BY data_type",
                )?;
                let rows = stmt.query_map([], status_from_row)?;

                let mut statuses = Vec::new();
                for row in rows {
                    if let Some(status) = row? {
                        statuses.push(status);
                    }
                }
                Ok(statuses)
            })
            .await
            .map_err(Error::from)
    }

    /// True when races, classes and backgrounds all have a current,
    /// non-empty load.
    pub async fn is_core_loaded(&self) -> Result<bool, Error> {
        let statuses = self.all_load_status().await?;
        Ok(CORE_CATEGORIES.iter().all(|category| {
            statuses
                .iter()
                .any(|s| s.category == *category && s.is_current() && s.item_count > 0)
        }))
    }
}
