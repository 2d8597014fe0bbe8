//! Cross-category text search over the reference tables.

use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

use super::ReferenceStore;
use crate::{Category, Error};

/// One match from [`ReferenceStore::search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SearchHit {
    /// Singular record kind (`spell`, `magic_item`, ...).
    pub kind: String,
    pub slug: String,
    pub name: String,
    pub description: String,
}

impl ReferenceStore {
    /// Case-insensitive substring match on name and description.
    ///
    /// Categories are searched in [`Category::ALL`] order and their hits
    /// concatenated; each category contributes at most `per_category_limit`
    /// hits, ordered by name.
    pub async fn search(&self, query: &str, per_category_limit: usize) -> Result<Vec<SearchHit>, Error> {
        let pattern = format!("%{}%", query.trim());
        let limit = per_category_limit as i64;

        self.db
            .conn
            .call(move |conn| -> Result<Vec<SearchHit>, Error> {
                let mut hits = Vec::new();
                for category in Category::ALL {
                    let mut stmt = conn.prepare_cached(&format!(
                        "SELECT slug, name, description FROM {}
                         WHERE name LIKE ?1 OR description LIKE ?1
                         ORDER BY name LIMIT ?2",
                        category.table()
                    ))?;
                    let rows = stmt.query_map(params![pattern, limit], |row| {
                        Ok(SearchHit {
                            kind: category.kind().to_string(),
                            slug: row.get(0)?,
                            name: row.get(1)?,
                            description: row.get(2)?,
                        })
                    })?;
                    for hit in rows {
                        hits.push(hit?);
                    }
                }
                Ok(hits)
            })
            .await
            .map_err(Error::from)
    }
}
