//! Moving upstream data into local storage.
//!
//! - [`Warmup`] pre-populates the response cache and sweeps expired entries.
//! - [`Scheduler`] runs warmup and the sweep on independent intervals.
//! - [`BulkLoader`] fills the reference store with every missing category.
//! - [`Resolver`] answers an inbound query from the cache or upstream.

pub mod loader;
pub mod resolve;
pub mod scheduler;
pub mod warmup;

pub use loader::{BulkLoader, LoadSummary};
pub use resolve::{ResolveOutcome, Resolver};
pub use scheduler::{ScheduleConfig, ScheduleHandle, Scheduler};
pub use warmup::{BulkTarget, Warmup, WarmupPlan, WarmupReport};

use grimoire_core::Error;

use crate::open5e::UpstreamError;

/// Failure while fetching from upstream or writing locally.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("upstream fetch failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] Error),
}

impl From<IngestError> for Error {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Upstream(e) => e.into(),
            IngestError::Store(e) => e,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for ingest tests.

    use std::sync::Arc;
    use std::time::Duration;

    use grimoire_core::Category;
    use serde_json::{Value, json};

    use crate::open5e::{MockTransport, Open5eClient, Open5eConfig, RateLimitConfig, RetryPolicy};

    pub const BASE: &str = "https://api.test/v1";

    pub fn client(mock: &Arc<MockTransport>) -> Arc<Open5eClient> {
        let config = Open5eConfig {
            base_url: BASE.to_string(),
            user_agent: "grimoire-test".to_string(),
            timeout: Duration::from_secs(5),
            rate_limit: RateLimitConfig { max_requests: 1_000, window: Duration::from_secs(60) },
            retry: RetryPolicy { max_attempts: 1, initial_delay: Duration::ZERO, max_delay: Duration::ZERO },
        };
        Arc::new(Open5eClient::with_transport(config, mock.clone()).unwrap())
    }

    pub fn records(category: Category, n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                json!({
                    "slug": format!("{}-{i}", category.kind()),
                    "name": format!("{} {i}", category.kind()),
                    "desc": "",
                })
            })
            .collect()
    }

    /// Serve `items` for a category as a single page.
    pub fn serve(mock: &MockTransport, category: Category, items: &[Value]) {
        mock.respond_json(
            &format!("{BASE}/{}/", category.path()),
            200,
            &json!({ "count": items.len(), "next": null, "previous": null, "results": items }),
        );
    }
}
