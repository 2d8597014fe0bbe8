//! Unified error types for grimoire.
//!
//! Every variant carries a stable code prefix so log lines and MCP error
//! payloads can be matched without parsing free text.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the reference-data core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., both slug and search given).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Category name that does not map to an upstream endpoint.
    #[error("UNKNOWN_CATEGORY: {0}")]
    UnknownCategory(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Persisted cache payload could not be decoded.
    ///
    /// Never returned from a cache read; the tiered cache logs it and
    /// reports a miss instead.
    #[error("CACHE_READ: {0}")]
    CacheRead(String),

    /// A bulk upsert failed and its transaction was rolled back.
    #[error("STORE_WRITE: {0}")]
    StoreWrite(String),

    /// The upstream reference API failed.
    ///
    /// The message is safe to show to untrusted callers; diagnostic detail
    /// stays in the logs.
    #[error("UPSTREAM_ERROR: {message}")]
    Upstream { message: String, status: Option<u16> },

    /// Value could not be serialized for storage.
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("serialization failed: {err}"))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::UnknownCategory(name) => (-32602, format!("invalid category: {name}")),
            Error::Upstream { .. } => (-32600, "upstream reference data unavailable".to_string()),
            Error::Database(_)
            | Error::MigrationFailed(_)
            | Error::CacheRead(_)
            | Error::StoreWrite(_)
            | Error::Internal(_) => (-32603, "failed to fetch reference data".to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
