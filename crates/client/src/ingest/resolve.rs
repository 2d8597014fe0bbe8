//! Inbound data requests: cache first, upstream on a miss.

use std::sync::Arc;

use chrono::Duration;
use grimoire_core::TieredCache;
use serde::Serialize;
use serde_json::Value;

use super::IngestError;
use crate::open5e::{DataQuery, Lookup, Open5eClient};

/// Records answering a query, trimmed to its limit.
#[derive(Debug, Clone, PartialEq, Serialize, schemars::JsonSchema)]
pub struct ResolveOutcome {
    pub records: Vec<Value>,
    /// Served from the cache without an upstream call.
    pub cached: bool,
}

pub struct Resolver {
    client: Arc<Open5eClient>,
    cache: Arc<TieredCache>,
    ttl: Duration,
}

impl Resolver {
    pub fn new(client: Arc<Open5eClient>, cache: Arc<TieredCache>, ttl: Duration) -> Self {
        Self { client, cache, ttl }
    }

    /// Answer `query` from the cache, or fetch it, cache the full result
    /// under the query's key and return it trimmed to `limit`.
    pub async fn resolve(&self, query: &DataQuery) -> Result<ResolveOutcome, IngestError> {
        let key = query.cache_key();

        if let Some(mut records) = self.cache.get::<Vec<Value>>(&key).await {
            tracing::debug!(key = %key, "cache hit");
            trim(&mut records, query.limit);
            return Ok(ResolveOutcome { records, cached: true });
        }

        let mut records: Vec<Value> = match &query.lookup {
            Lookup::Slug(slug) => vec![self.client.fetch_by_slug(query.category, slug).await?],
            Lookup::Search(term) => self.client.search(query.category, term, &[]).await?,
            Lookup::All => self.client.fetch_all(query.category, &[]).await?,
        };

        self.cache.set(&key, &records, self.ttl).await?;
        tracing::debug!(key = %key, count = records.len(), "cache miss, fetched upstream");

        trim(&mut records, query.limit);
        Ok(ResolveOutcome { records, cached: false })
    }
}

fn trim(records: &mut Vec<Value>, limit: Option<usize>) {
    if let Some(limit) = limit {
        records.truncate(limit);
    }
}
