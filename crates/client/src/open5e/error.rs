//! Upstream failure type.

use grimoire_core::{Category, Error};
use serde::Deserialize;

use super::transport::TransportError;

/// Longest response body kept for diagnostics.
const MAX_CONTEXT_BODY: usize = 2048;

/// Request details captured when an upstream call fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamContext {
    pub url: Option<String>,
    pub body: Option<String>,
}

/// A failed call to the upstream reference API.
///
/// `status` is `None` when no response arrived (network failure, timeout).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub message: String,
    pub status: Option<u16>,
    pub category: Option<Category>,
    pub context: UpstreamContext,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), status: None, category: None, context: UpstreamContext::default() }
    }

    /// Non-success HTTP response. The message comes from the upstream
    /// `detail` field when the body carries one.
    pub fn from_response(url: &str, status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .unwrap_or_else(|| format!("upstream returned HTTP {status}"));

        Self {
            message,
            status: Some(status),
            category: None,
            context: UpstreamContext { url: Some(url.to_string()), body: Some(truncated(body)) },
        }
    }

    /// No response was received.
    pub fn from_transport(url: &str, err: &TransportError) -> Self {
        Self {
            message: err.to_string(),
            status: None,
            category: None,
            context: UpstreamContext { url: Some(url.to_string()), body: None },
        }
    }

    /// Successful response whose body did not decode.
    pub fn malformed(url: &str, status: u16, err: &serde_json::Error, body: &[u8]) -> Self {
        Self {
            message: format!("malformed upstream response: {err}"),
            status: Some(status),
            category: None,
            context: UpstreamContext { url: Some(url.to_string()), body: Some(truncated(body)) },
        }
    }

    /// Attach the category involved. A category that is already set is kept.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category.get_or_insert(category);
        self
    }

    /// 4xx: the request itself was rejected and retrying will not help.
    pub fn is_client_error(&self) -> bool {
        matches!(self.status, Some(400..=499))
    }
}

fn truncated(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(MAX_CONTEXT_BODY) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.into_owned(),
    }
}

impl From<UpstreamError> for Error {
    fn from(err: UpstreamError) -> Self {
        Error::Upstream { message: err.message, status: err.status }
    }
}
