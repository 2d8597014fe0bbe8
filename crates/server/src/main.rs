//! grimoire MCP server entry point.
//!
//! Boots the reference-data server on stdio transport. Logging goes to
//! stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use grimoire_client::Context;
use grimoire_core::AppConfig;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().inspect_err(|e| tracing::error!(error = %e, "invalid configuration"))?;
    let ctx = Arc::new(Context::open(&config).await?);

    if config.load_on_startup {
        let loader = ctx.loader.clone();
        tokio::spawn(async move {
            if let Err(e) = loader.run().await {
                tracing::error!(error = %e, "startup reference load failed");
            }
        });
    }

    let schedule = ctx.schedule();

    tracing::info!("Starting grimoire server on stdio transport");
    let server = serve_server(handler::GrimoireServer::new(ctx), stdio()).await?;
    server.waiting().await?;

    schedule.abort();
    Ok(())
}
