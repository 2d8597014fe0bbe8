//! reference_search tool implementation.
//!
//! Searches names and descriptions across every table of the local store.

use grimoire_client::Context;
use grimoire_client::open5e::MAX_LIMIT;
use grimoire_core::{Error, store::SearchHit};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceSearchParams {
    /// Case-insensitive substring to match.
    pub query: String,

    /// Maximum hits per category (default: 10).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceSearchOutput {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

pub async fn search_impl(ctx: &Context, params: ReferenceSearchParams) -> Result<CallToolResult, McpError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(Error::InvalidInput("query cannot be empty".into()).into());
    }
    if params.limit == 0 || params.limit > MAX_LIMIT {
        return Err(Error::InvalidInput(format!("limit must be between 1 and {MAX_LIMIT}")).into());
    }

    let hits = ctx.store.search(query, params.limit).await?;
    tracing::debug!(query, hits = hits.len(), "reference search");

    let output = ReferenceSearchOutput { query: query.to_string(), hits };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::Internal(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
