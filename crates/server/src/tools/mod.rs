//! MCP tool implementations.
//!
//! This module contains all tools exposed by the grimoire server.

pub mod cache_reset;
pub mod load_status;
pub mod reference_data;
pub mod reference_search;

pub use reference_data::ReferenceDataParams;
pub use reference_search::ReferenceSearchParams;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use grimoire_client::Context;
    use grimoire_client::open5e::{MockTransport, Open5eClient, Open5eConfig};
    use grimoire_core::{AppConfig, Database};
    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;

    pub const BASE: &str = "https://api.test/v1";

    /// A context over an in-memory database and a scripted upstream that
    /// answers 404 to anything unrouted.
    pub async fn context() -> (Context, Arc<MockTransport>) {
        let config = AppConfig { base_url: BASE.into(), retry_max_attempts: 1, ..Default::default() };
        let mock = Arc::new(MockTransport::new());
        let client = Open5eClient::with_transport(Open5eConfig::from(&config), mock.clone()).unwrap();
        let db = Database::open_in_memory().await.unwrap();
        (Context::assemble(&config, db, client), mock)
    }

    pub fn output<T: DeserializeOwned>(result: CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
