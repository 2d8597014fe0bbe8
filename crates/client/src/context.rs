//! Process-wide services, built once at startup and shared by reference.

use std::sync::Arc;

use grimoire_core::{AppConfig, Database, Error, ReferenceStore, TieredCache};

use crate::ingest::{BulkLoader, Resolver, ScheduleConfig, ScheduleHandle, Scheduler, Warmup, WarmupPlan};
use crate::open5e::{Open5eClient, Open5eConfig};

pub struct Context {
    pub config: AppConfig,
    pub client: Arc<Open5eClient>,
    pub cache: Arc<TieredCache>,
    pub store: ReferenceStore,
    pub warmup: Arc<Warmup>,
    pub loader: Arc<BulkLoader>,
    pub resolver: Arc<Resolver>,
}

impl Context {
    /// Open the database at `config.db_path` and build every service over
    /// an HTTP client.
    pub async fn open(config: &AppConfig) -> Result<Self, Error> {
        let db = Database::open(&config.db_path).await?;
        let client = Open5eClient::new(Open5eConfig::from(config))?;
        tracing::info!(db_path = %config.db_path.display(), base_url = %config.base_url, "context ready");
        Ok(Self::assemble(config, db, client))
    }

    /// Build every service over an existing database and client.
    pub fn assemble(config: &AppConfig, db: Database, client: Open5eClient) -> Self {
        let client = Arc::new(client);
        let cache = Arc::new(TieredCache::new(db.clone()));
        let store = ReferenceStore::new(db);

        Self {
            config: config.clone(),
            warmup: Arc::new(Warmup::new(client.clone(), cache.clone(), WarmupPlan::from(config))),
            loader: Arc::new(BulkLoader::new(client.clone(), store.clone())),
            resolver: Arc::new(Resolver::new(client.clone(), cache.clone(), config.request_ttl())),
            client,
            cache,
            store,
        }
    }

    /// Start periodic warmup and cleanup.
    pub fn schedule(&self) -> ScheduleHandle {
        Scheduler::spawn(self.warmup.clone(), ScheduleConfig::from(&self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open5e::MockTransport;

    #[tokio::test]
    async fn test_assemble_shares_database() {
        let config = AppConfig { base_url: "https://api.test/v1".into(), ..Default::default() };
        let db = Database::open_in_memory().await.unwrap();
        let client =
            Open5eClient::with_transport(Open5eConfig::from(&config), Arc::new(MockTransport::new())).unwrap();

        let ctx = Context::assemble(&config, db, client);
        assert_eq!(ctx.warmup.plan().core.len(), 3);
        assert!(ctx.loader.missing_categories().await.unwrap().len() == 8);
        assert_eq!(ctx.cache.memory_len().await, 0);
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let dir = std::env::temp_dir().join(format!("grimoire-ctx-{}", std::process::id()));
        let config = AppConfig { db_path: dir.join("grimoire.sqlite"), ..Default::default() };

        let ctx = Context::open(&config).await.unwrap();
        assert!(config.db_path.exists());
        drop(ctx);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
