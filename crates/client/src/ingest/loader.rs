//! One-shot population of the reference store.

use std::sync::Arc;

use grimoire_core::Category;
use grimoire_core::store::{Background, Class, Feat, MagicItem, Monster, Race, Record, ReferenceStore, Spell, Weapon};

use super::IngestError;
use crate::open5e::Open5eClient;

/// What a loader run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: Vec<(Category, usize)>,
    pub skipped: Vec<Category>,
}

/// Loads every category that has no current load status.
///
/// Categories already loaded are skipped, so running it again after a
/// failure resumes where the previous run stopped.
pub struct BulkLoader {
    client: Arc<Open5eClient>,
    store: ReferenceStore,
}

impl BulkLoader {
    pub fn new(client: Arc<Open5eClient>, store: ReferenceStore) -> Self {
        Self { client, store }
    }

    /// Categories with no load-status row, or one written under an older
    /// store format.
    pub async fn missing_categories(&self) -> Result<Vec<Category>, IngestError> {
        let statuses = self.store.all_load_status().await?;
        Ok(Category::ALL
            .into_iter()
            .filter(|category| !statuses.iter().any(|s| s.category == *category && s.is_current()))
            .collect())
    }

    /// Load the missing categories in order. The first failure stops the
    /// run and is returned; categories stored before it stay stored.
    pub async fn run(&self) -> Result<LoadSummary, IngestError> {
        let missing = self.missing_categories().await?;
        let mut summary = LoadSummary {
            skipped: Category::ALL.into_iter().filter(|c| !missing.contains(c)).collect(),
            ..Default::default()
        };

        if missing.is_empty() {
            tracing::info!("reference store already loaded");
            return Ok(summary);
        }

        tracing::info!(missing = missing.len(), "loading reference data");
        for category in missing {
            let count = self.load(category).await.inspect_err(|e| {
                tracing::error!(category = category.name(), error = %e, "reference load failed");
            })?;
            tracing::info!(category = category.name(), count, "loaded reference data");
            summary.loaded.push((category, count));
        }

        Ok(summary)
    }

    /// Fetch and store one category, whatever its load status.
    pub async fn load(&self, category: Category) -> Result<usize, IngestError> {
        match category {
            Category::Races => self.load_records::<Race>().await,
            Category::Classes => self.load_records::<Class>().await,
            Category::Backgrounds => self.load_records::<Background>().await,
            Category::Spells => self.load_records::<Spell>().await,
            Category::Monsters => self.load_records::<Monster>().await,
            Category::Weapons => self.load_records::<Weapon>().await,
            Category::MagicItems => self.load_records::<MagicItem>().await,
            Category::Feats => self.load_records::<Feat>().await,
        }
    }

    async fn load_records<R: Record>(&self) -> Result<usize, IngestError> {
        let records: Vec<R> = self.client.fetch_all(R::CATEGORY, &[]).await?;
        Ok(self.store.store(&records).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::testing::{BASE, client, records, serve};
    use crate::open5e::MockTransport;
    use grimoire_core::Database;

    async fn loader(mock: &Arc<MockTransport>) -> (BulkLoader, ReferenceStore) {
        let store = ReferenceStore::new(Database::open_in_memory().await.unwrap());
        (BulkLoader::new(client(mock), store.clone()), store)
    }

    fn serve_all(mock: &MockTransport) {
        for category in Category::ALL {
            serve(mock, category, &records(category, 3));
        }
    }

    #[tokio::test]
    async fn test_second_run_makes_no_calls() {
        let mock = Arc::new(MockTransport::new());
        serve_all(&mock);
        let (loader, store) = loader(&mock).await;

        let first = loader.run().await.unwrap();
        assert_eq!(first.loaded.len(), Category::ALL.len());
        assert_eq!(mock.call_count(), Category::ALL.len());
        assert_eq!(store.count(Category::MagicItems).await.unwrap(), 3);

        let second = loader.run().await.unwrap();
        assert!(second.loaded.is_empty());
        assert_eq!(second.skipped.len(), Category::ALL.len());
        assert_eq!(mock.call_count(), Category::ALL.len());
    }

    #[tokio::test]
    async fn test_failure_aborts_then_resumes() {
        let mock = Arc::new(MockTransport::new());
        for category in Category::ALL.into_iter().filter(|c| *c != Category::Spells) {
            serve(&mock, category, &records(category, 3));
        }
        mock.respond(&format!("{BASE}/spells/"), 400, r#"{"detail": "bad"}"#);
        let (loader, store) = loader(&mock).await;

        let err = loader.run().await.unwrap_err();
        assert!(matches!(err, IngestError::Upstream(ref e) if e.category == Some(Category::Spells)));
        assert_eq!(store.count(Category::Backgrounds).await.unwrap(), 3);
        assert_eq!(store.count(Category::Monsters).await.unwrap(), 0);

        let missing = loader.missing_categories().await.unwrap();
        assert_eq!(missing.first(), Some(&Category::Spells));
        assert_eq!(missing.len(), 5);
    }

    #[tokio::test]
    async fn test_cleared_store_is_reloaded() {
        let mock = Arc::new(MockTransport::new());
        serve_all(&mock);
        let (loader, store) = loader(&mock).await;
        loader.run().await.unwrap();
        assert!(loader.missing_categories().await.unwrap().is_empty());

        store.clear_all().await.unwrap();
        assert_eq!(loader.missing_categories().await.unwrap(), Category::ALL.to_vec());

        loader.run().await.unwrap();
        assert_eq!(mock.call_count(), 2 * Category::ALL.len());
    }

    #[tokio::test]
    async fn test_typed_records_are_stored() {
        let mock = Arc::new(MockTransport::new());
        serve(
            &mock,
            Category::Spells,
            &[serde_json::json!({
                "slug": "fireball", "name": "Fireball", "desc": "Boom.", "level_int": 3,
                "school": "Evocation", "dnd_class": "Wizard", "spell_lists": ["wizard"],
            })],
        );
        let (loader, store) = loader(&mock).await;

        assert_eq!(loader.load(Category::Spells).await.unwrap(), 1);
        let spell = store.spell_by_slug("fireball").await.unwrap().unwrap();
        assert_eq!(spell.level, 3);
        assert_eq!(spell.spell_lists, vec!["wizard".to_string()]);
    }
}
