//! load_status tool implementation.
//!
//! Reports per-category store load status and cache metadata.

use grimoire_client::Context;
use grimoire_core::cache::CacheMetadata;
use grimoire_core::{Category, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryStatus {
    pub category: Category,
    /// Rows in the reference table.
    pub stored: u64,
    /// RFC 3339 time of the last bulk store, if any.
    pub last_loaded: Option<String>,
    /// False when the category has never been loaded or was loaded under an
    /// older store format.
    pub current: bool,
    pub cache: Option<CacheMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LoadStatusOutput {
    pub core_loaded: bool,
    pub cached_in_memory: usize,
    pub categories: Vec<CategoryStatus>,
}

pub async fn status_impl(ctx: &Context) -> Result<CallToolResult, McpError> {
    let statuses = ctx.store.all_load_status().await?;
    let mut categories = Vec::with_capacity(Category::ALL.len());

    for category in Category::ALL {
        let status = statuses.iter().find(|s| s.category == category);
        categories.push(CategoryStatus {
            category,
            stored: ctx.store.count(category).await?,
            last_loaded: status.map(|s| s.last_loaded.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            current: status.is_some_and(|s| s.is_current()),
            cache: ctx.cache.metadata(category).await?,
        });
    }

    let output = LoadStatusOutput {
        core_loaded: ctx.store.is_core_loaded().await?,
        cached_in_memory: ctx.cache.memory_len().await,
        categories,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::Internal(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
