//! Cache warmup and eviction.

use std::sync::Arc;

use chrono::Duration;
use futures_util::future::join_all;
use grimoire_core::{AppConfig, CacheKey, Category, TieredCache};
use serde_json::Value;

use super::IngestError;
use crate::open5e::Open5eClient;

/// A bulk category and the size of its capped warm entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkTarget {
    pub category: Category,
    pub limit: usize,
}

/// What to warm and for how long.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmupPlan {
    /// Small, foundational categories; fetched in order, fail-fast.
    pub core: Vec<Category>,
    /// Large categories; fetched concurrently, failures isolated.
    pub bulk: Vec<BulkTarget>,
    pub core_ttl: Duration,
    pub bulk_ttl: Duration,
}

impl Default for WarmupPlan {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for WarmupPlan {
    fn from(config: &AppConfig) -> Self {
        let limit = config.warmup_limit;
        Self {
            core: vec![Category::Races, Category::Classes, Category::Backgrounds],
            bulk: [Category::Spells, Category::Weapons, Category::MagicItems]
                .into_iter()
                .map(|category| BulkTarget { category, limit })
                .collect(),
            core_ttl: config.core_ttl(),
            bulk_ttl: config.bulk_ttl(),
        }
    }
}

/// Outcome of one warmup pass.
#[derive(Debug, Default)]
pub struct WarmupReport {
    /// Categories cached, with the number of records fetched.
    pub warmed: Vec<(Category, usize)>,
    /// Bulk categories that failed; the others were still warmed.
    pub failed: Vec<(Category, IngestError)>,
}

pub struct Warmup {
    client: Arc<Open5eClient>,
    cache: Arc<TieredCache>,
    plan: WarmupPlan,
}

impl Warmup {
    pub fn new(client: Arc<Open5eClient>, cache: Arc<TieredCache>, plan: WarmupPlan) -> Self {
        Self { client, cache, plan }
    }

    pub fn plan(&self) -> &WarmupPlan {
        &self.plan
    }

    /// Warm core categories one at a time, stopping at the first failure,
    /// then every bulk category concurrently.
    ///
    /// Core entries are cached under `{path}:all:all`. Bulk entries are
    /// cached under both `{path}:all:{limit}` and `{path}:all:all`.
    pub async fn warmup(&self) -> Result<WarmupReport, IngestError> {
        tracing::info!(core = self.plan.core.len(), bulk = self.plan.bulk.len(), "starting cache warmup");
        let mut report = WarmupReport::default();

        for &category in &self.plan.core {
            let records: Vec<Value> = self.client.fetch_all(category, &[]).await?;
            self.cache
                .set(&CacheKey::all(category, None), &records, self.plan.core_ttl)
                .await?;
            tracing::debug!(category = category.path(), count = records.len(), "warmed core category");
            report.warmed.push((category, records.len()));
        }

        let outcomes = join_all(self.plan.bulk.iter().map(|&target| self.warm_bulk(target))).await;
        for (target, outcome) in self.plan.bulk.iter().zip(outcomes) {
            match outcome {
                Ok(count) => report.warmed.push((target.category, count)),
                Err(e) => {
                    tracing::error!(category = target.category.path(), error = %e, "failed to warm category");
                    report.failed.push((target.category, e));
                }
            }
        }

        tracing::info!(warmed = report.warmed.len(), failed = report.failed.len(), "cache warmup complete");
        Ok(report)
    }

    async fn warm_bulk(&self, target: BulkTarget) -> Result<usize, IngestError> {
        let records: Vec<Value> = self.client.fetch_all(target.category, &[]).await?;
        let capped = &records[..records.len().min(target.limit)];

        self.cache
            .set(&CacheKey::all(target.category, Some(target.limit)), capped, self.plan.bulk_ttl)
            .await?;
        self.cache
            .set(&CacheKey::all(target.category, None), &records, self.plan.bulk_ttl)
            .await?;

        Ok(records.len())
    }

    /// Drop every cache entry, then warm again before returning.
    pub async fn reset_cache(&self) -> Result<WarmupReport, IngestError> {
        tracing::info!("resetting cache");
        self.cache.clear_all().await?;
        let report = self.warmup().await?;
        tracing::info!("cache reset complete");
        Ok(report)
    }

    pub async fn clear_expired(&self) -> Result<u64, IngestError> {
        Ok(self.cache.clear_expired().await?)
    }
}
