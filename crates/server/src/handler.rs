//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::{
    ReferenceDataParams, ReferenceSearchParams, cache_reset::reset_impl, load_status::status_impl,
    reference_data::data_impl, reference_search::search_impl,
};

use grimoire_client::Context;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The main MCP server handler for grimoire.
#[derive(Clone)]
pub struct GrimoireServer {
    ctx: Arc<Context>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GrimoireServer {
    pub fn new(ctx: Arc<Context>) -> Self {
        Self { ctx, tool_router: Self::tool_router() }
    }

    /// Look up reference data by category, slug or search term.
    ///
    /// Results are served from the cache when present and fetched from the
    /// upstream API otherwise.
    #[tool(
        description = "Fetch tabletop reference data (spells, monsters, races, classes, backgrounds, weapons, magic-items, feats). Optionally by slug or upstream search term, with a result limit of 1-100."
    )]
    async fn reference_data(&self, params: Parameters<ReferenceDataParams>) -> Result<CallToolResult, McpError> {
        data_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Search names and descriptions across the locally loaded reference store.")]
    async fn reference_search(&self, params: Parameters<ReferenceSearchParams>) -> Result<CallToolResult, McpError> {
        search_impl(&self.ctx, params.0).await
    }

    #[tool(description = "Report which reference categories are loaded and what the cache holds for each.")]
    async fn load_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.ctx).await
    }

    /// Clear both cache tiers and warm them again before returning.
    #[tool(description = "Clear the reference data cache and re-warm it from the upstream API.")]
    async fn cache_reset(&self) -> Result<CallToolResult, McpError> {
        reset_impl(&self.ctx).await
    }
}

impl ServerHandler for GrimoireServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "grimoire".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
