//! HTTP transport seam.
//!
//! The client talks to upstream through [`Transport`] so tests can script
//! responses without a network.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};
use url::Url;

/// A response that arrived, whatever its status.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

/// No response was received.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { TransportError::Timeout } else { TransportError::Network(err.to_string()) }
    }
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError>;
}

/// Production transport over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        let response = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(TransportResponse { status, body })
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Respond { status: u16, body: Bytes },
    Fail(TransportError),
}

/// Scripted transport for tests.
///
/// Each URL has a queue of replies consumed in order; the last reply
/// repeats once the queue is down to one. Unrouted URLs answer 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<MockReply>>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `url`.
    pub fn respond(&self, url: &str, status: u16, body: impl Into<Bytes>) -> &Self {
        self.push(url, MockReply::Respond { status, body: body.into() })
    }

    /// Queue a JSON response for `url`.
    pub fn respond_json(&self, url: &str, status: u16, body: &serde_json::Value) -> &Self {
        self.respond(url, status, body.to_string())
    }

    /// Queue a network failure for `url`.
    pub fn fail(&self, url: &str) -> &Self {
        self.push(url, MockReply::Fail(TransportError::Network("connection reset".into())))
    }

    /// Every URL requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    fn push(&self, url: &str, reply: MockReply) -> &Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes.entry(url.to_string()).or_default().push_back(reply);
        }
        self
    }

    fn next_reply(&self, url: &str) -> Option<MockReply> {
        let mut routes = self.routes.lock().ok()?;
        let queue = routes.get_mut(url)?;
        if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }

        match self.next_reply(url.as_str()) {
            Some(MockReply::Respond { status, body }) => Ok(TransportResponse { status, body }),
            Some(MockReply::Fail(err)) => Err(err),
            None => Ok(TransportResponse { status: 404, body: Bytes::from_static(br#"{"detail":"Not found."}"#) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_queue_then_repeats_last() {
        let mock = MockTransport::new();
        mock.fail("https://api.test/v1/races/").respond("https://api.test/v1/races/", 200, "[]");

        let url = Url::parse("https://api.test/v1/races/").unwrap();
        assert!(mock.get(&url).await.is_err());
        assert_eq!(mock.get(&url).await.unwrap().status, 200);
        assert_eq!(mock.get(&url).await.unwrap().status, 200);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_unrouted_is_404() {
        let mock = MockTransport::new();
        let url = Url::parse("https://api.test/v1/feats/").unwrap();
        assert_eq!(mock.get(&url).await.unwrap().status, 404);
        assert_eq!(mock.calls(), vec!["https://api.test/v1/feats/".to_string()]);
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new("grimoire-test/0.1", Duration::from_secs(5)).is_ok());
    }
}
