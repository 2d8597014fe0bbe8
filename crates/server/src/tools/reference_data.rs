//! reference_data tool implementation.
//!
//! Answers a category lookup from the cache, fetching upstream on a miss.

use grimoire_client::{Context, DataQuery};
use grimoire_core::{Category, Error};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input parameters for the reference_data tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceDataParams {
    /// Category path or name, e.g. "spells" or "magic-items".
    pub category: String,

    /// Fetch a single record by slug.
    #[serde(default)]
    pub slug: Option<String>,

    /// Upstream full-text search term. Cannot be combined with `slug`.
    #[serde(default)]
    pub search: Option<String>,

    /// Maximum records to return (1-100).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Output structure for the reference_data tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceDataOutput {
    pub category: Category,
    pub count: usize,
    /// Whether the answer came from the cache.
    pub cached: bool,
    pub records: Vec<Value>,
}

pub async fn data_impl(ctx: &Context, params: ReferenceDataParams) -> Result<CallToolResult, McpError> {
    let query = DataQuery::parse(&params.category, params.slug.as_deref(), params.search.as_deref(), params.limit)?;
    let outcome = ctx.resolver.resolve(&query).await.map_err(Error::from)?;

    let output = ReferenceDataOutput {
        category: query.category,
        count: outcome.records.len(),
        cached: outcome.cached,
        records: outcome.records,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::Internal(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{BASE, context, output};
    use rmcp::model::ErrorCode;
    use serde_json::json;

    fn params(category: &str) -> ReferenceDataParams {
        ReferenceDataParams { category: category.into(), slug: None, search: None, limit: None }
    }

    #[tokio::test]
    async fn test_data_miss_then_cached() {
        let (ctx, mock) = context().await;
        mock.respond_json(
            &format!("{BASE}/spells/"),
            200,
            &json!({ "next": null, "results": [{ "slug": "a" }, { "slug": "b" }, { "slug": "c" }] }),
        );

        let first: ReferenceDataOutput =
            output(data_impl(&ctx, ReferenceDataParams { limit: Some(2), ..params("spells") }).await.unwrap());
        assert_eq!(first.count, 2);
        assert!(!first.cached);

        let second: ReferenceDataOutput =
            output(data_impl(&ctx, ReferenceDataParams { limit: Some(2), ..params("spells") }).await.unwrap());
        assert!(second.cached);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_data_hyphenated_category() {
        let (ctx, mock) = context().await;
        mock.respond_json(
            &format!("{BASE}/magicitems/"),
            200,
            &json!({ "next": null, "results": [{ "slug": "bag-of-holding" }] }),
        );

        let out: ReferenceDataOutput = output(data_impl(&ctx, params("magic-items")).await.unwrap());
        assert_eq!(out.category, Category::MagicItems);
        assert_eq!(out.count, 1);
    }

    #[tokio::test]
    async fn test_data_rejects_slug_and_search() {
        let (ctx, _) = context().await;
        let err = data_impl(
            &ctx,
            ReferenceDataParams { slug: Some("fireball".into()), search: Some("fire".into()), ..params("spells") },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode(-32602));
    }

    #[tokio::test]
    async fn test_data_unknown_category() {
        let (ctx, _) = context().await;
        let err = data_impl(&ctx, params("vehicles")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode(-32602));
        assert!(err.message.contains("vehicles"));
    }

    #[tokio::test]
    async fn test_upstream_error_does_not_leak() {
        let (ctx, mock) = context().await;
        mock.respond(&format!("{BASE}/feats/"), 500, r#"{"detail": "database on fire at 10.0.0.3"}"#);

        let err = data_impl(&ctx, params("feats")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode(-32600));
        assert!(!err.message.contains("10.0.0.3"));
    }
}
