//! Open5e reference API client.
//!
//! ### Behaviour
//!
//! - **Endpoints**: `GET {base}/{path}/` (paginated) and `GET {base}/{path}/{slug}/`.
//! - **Pagination**: envelope `{count, next, previous, results}`; `next` is
//!   followed until null and pages are concatenated in order. Query
//!   parameters go on the first page only, `next` already carries them.
//! - **Rate limiting**: fixed window, every attempt counts.
//! - **Retry**: network failures and 5xx, exponential backoff, capped.
//!   4xx fails immediately.
//! - **Errors**: normalized into [`UpstreamError`] tagged with the category.

pub mod error;
pub mod query;
pub mod rate_limit;
pub mod retry;
pub mod transport;

pub use error::{UpstreamContext, UpstreamError};
pub use query::{DataQuery, Lookup, MAX_LIMIT};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, MockTransport, Transport, TransportError, TransportResponse};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use grimoire_core::{AppConfig, Category, Error};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

/// Upstream client configuration.
#[derive(Debug, Clone)]
pub struct Open5eConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryPolicy,
}

impl Default for Open5eConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for Open5eConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            rate_limit: RateLimitConfig {
                max_requests: config.rate_limit_max_requests,
                window: config.rate_limit_window(),
            },
            retry: RetryPolicy {
                max_attempts: config.retry_max_attempts,
                initial_delay: config.retry_initial_delay(),
                max_delay: config.retry_max_delay(),
            },
        }
    }
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Rate-limited, retrying client for the upstream reference API.
pub struct Open5eClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl Open5eClient {
    /// Create a client over HTTP.
    pub fn new(config: Open5eConfig) -> Result<Self, Error> {
        let transport = HttpTransport::new(&config.user_agent, config.timeout)
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over any transport.
    pub fn with_transport(config: Open5eConfig, transport: Arc<dyn Transport>) -> Result<Self, Error> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| Error::InvalidInput(format!("invalid base URL {base_url}: {e}")))?;

        Ok(Self { transport, base_url, limiter: RateLimiter::new(config.rate_limit), retry: config.retry })
    }

    /// Every record in a category, following pagination to the end.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self, category: Category, params: &[(&str, &str)],
    ) -> Result<Vec<T>, UpstreamError> {
        self.collect_pages(category, params)
            .await
            .map_err(|e| e.with_category(category))
    }

    /// A single record. An unknown slug is an upstream 404.
    pub async fn fetch_by_slug<T: DeserializeOwned>(&self, category: Category, slug: &str) -> Result<T, UpstreamError> {
        let url = self
            .endpoint(category, Some(slug), &[])
            .map_err(|e| e.with_category(category))?;
        self.get_json(&url).await.map_err(|e| e.with_category(category))
    }

    /// [`Open5eClient::fetch_all`] with a `search` parameter merged in.
    pub async fn search<T: DeserializeOwned>(
        &self, category: Category, query: &str, params: &[(&str, &str)],
    ) -> Result<Vec<T>, UpstreamError> {
        let mut merged: Vec<(&str, &str)> = params.iter().filter(|(k, _)| *k != "search").copied().collect();
        merged.push(("search", query));
        self.fetch_all(category, &merged).await
    }

    async fn collect_pages<T: DeserializeOwned>(
        &self, category: Category, params: &[(&str, &str)],
    ) -> Result<Vec<T>, UpstreamError> {
        let mut next = Some(self.endpoint(category, None, params)?);
        let mut visited = HashSet::new();
        let mut results = Vec::new();

        while let Some(url) = next {
            let page: Page<T> = self.get_json(&url).await?;
            visited.insert(url);
            results.extend(page.results);

            next = match page.next.as_deref().map(str::trim) {
                Some(link) if !link.is_empty() => {
                    let link = Url::parse(link)
                        .map_err(|e| UpstreamError::new(format!("invalid next link {link}: {e}")))?;
                    if visited.contains(&link) {
                        return Err(UpstreamError::new(format!("pagination loops back to {link}")));
                    }
                    Some(link)
                }
                _ => None,
            };
        }

        tracing::debug!(category = category.path(), pages = visited.len(), items = results.len(), "fetched category");
        Ok(results)
    }

    fn endpoint(&self, category: Category, slug: Option<&str>, params: &[(&str, &str)]) -> Result<Url, UpstreamError> {
        let raw = match slug {
            Some(slug) => format!("{}/{}/{slug}/", self.base_url, category.path()),
            None => format!("{}/{}/", self.base_url, category.path()),
        };
        let mut url = Url::parse(&raw).map_err(|e| UpstreamError::new(format!("invalid upstream URL {raw}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, UpstreamError> {
        let response = self.send(url).await?;
        if !(200..300).contains(&response.status) {
            return Err(UpstreamError::from_response(url.as_str(), response.status, &response.body));
        }
        serde_json::from_slice(&response.body)
            .map_err(|e| UpstreamError::malformed(url.as_str(), response.status, &e, &response.body))
    }

    /// One logical request: rate-limited attempts with backoff between
    /// retryable failures. Returns the last response or failure.
    async fn send(&self, url: &Url) -> Result<TransportResponse, UpstreamError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            self.limiter.acquire().await;
            let result = self.transport.get(url).await;

            let status = match &result {
                Ok(response) => Some(response.status),
                Err(_) => None,
            };
            let failed = result.as_ref().map_or(true, |r| !(200..300).contains(&r.status));

            if !failed || !RetryPolicy::is_retryable(status) || attempt >= max_attempts {
                return result.map_err(|e| UpstreamError::from_transport(url.as_str(), &e));
            }

            let delay = self.retry.delay_for(attempt);
            tracing::warn!(
                url = %url,
                attempt,
                status = ?status,
                delay_ms = delay.as_millis() as u64,
                "upstream request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
