//! cache_reset tool implementation.
//!
//! Clears both cache tiers and runs a warmup pass before answering.

use grimoire_client::{Context, IngestError};
use grimoire_core::{Category, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WarmedCategory {
    pub category: Category,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FailedCategory {
    pub category: Category,
    /// Generic reason; the upstream's own message stays in the server log.
    pub error: String,
    /// Upstream HTTP status, when there was a response.
    pub status: Option<u16>,
}

impl FailedCategory {
    fn new(category: Category, err: &IngestError) -> Self {
        match err {
            IngestError::Upstream(e) => {
                Self { category, error: "upstream reference data unavailable".into(), status: e.status }
            }
            IngestError::Store(_) => Self { category, error: "failed to cache reference data".into(), status: None },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheResetOutput {
    pub warmed: Vec<WarmedCategory>,
    /// Bulk categories that could not be warmed. Core failures fail the call.
    pub failed: Vec<FailedCategory>,
}

pub async fn reset_impl(ctx: &Context) -> Result<CallToolResult, McpError> {
    let report = ctx.warmup.reset_cache().await.map_err(Error::from)?;

    let output = CacheResetOutput {
        warmed: report
            .warmed
            .into_iter()
            .map(|(category, count)| WarmedCategory { category, count })
            .collect(),
        failed: report
            .failed
            .into_iter()
            .map(|(category, e)| FailedCategory::new(category, &e))
            .collect(),
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::Internal(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{BASE, context, output};
    use grimoire_core::CacheKey;
    use rmcp::model::ErrorCode;
    use serde_json::{Value, json};

    fn page(n: usize) -> Value {
        let results: Vec<Value> = (0..n).map(|i| json!({ "slug": format!("r-{i}") })).collect();
        json!({ "next": null, "results": results })
    }

    #[tokio::test]
    async fn test_reset_rewarms() {
        let (ctx, mock) = context().await;
        for category in [Category::Races, Category::Classes, Category::Backgrounds, Category::Weapons] {
            mock.respond_json(&format!("{BASE}/{}/", category.path()), 200, &page(2));
        }
        let stale = CacheKey::slug(Category::Monsters, "goblin");
        ctx.cache.set(&stale, &json!({}), chrono::Duration::days(1)).await.unwrap();

        let out: CacheResetOutput = output(reset_impl(&ctx).await.unwrap());

        assert!(ctx.cache.get::<Value>(&stale).await.is_none());
        assert!(out.warmed.iter().any(|w| w.category == Category::Races && w.count == 2));
        let failed: Vec<Category> = out.failed.iter().map(|f| f.category).collect();
        assert!(failed.contains(&Category::Spells));
        assert!(failed.contains(&Category::MagicItems));
        assert!(!failed.contains(&Category::Weapons));
    }

    #[tokio::test]
    async fn test_reset_core_failure_is_an_error() {
        let (ctx, _) = context().await;
        let err = reset_impl(&ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode(-32600));
    }

    #[tokio::test]
    async fn test_reset_failure_does_not_leak() {
        let (ctx, mock) = context().await;
        for category in [Category::Races, Category::Classes, Category::Backgrounds] {
            mock.respond_json(&format!("{BASE}/{}/", category.path()), 200, &page(1));
        }
        mock.respond(&format!("{BASE}/spells/"), 500, r#"{"detail": "database on fire at 10.0.0.3"}"#);

        let result = reset_impl(&ctx).await.unwrap();
        let text = serde_json::to_string(&result.content[0]).unwrap();
        assert!(!text.contains("10.0.0.3"));

        let out: CacheResetOutput = output(result);
        let spells = out.failed.iter().find(|f| f.category == Category::Spells).unwrap();
        assert_eq!(spells.error, "upstream reference data unavailable");
        assert_eq!(spells.status, Some(500));
    }
}
