//! Client code for grimoire.
//!
//! This crate provides the upstream reference API client, cache warmup and
//! bulk ingestion, and the shared service context used by the server and CLI.

pub mod context;
pub mod ingest;
pub mod open5e;

pub use context::Context;
pub use ingest::{BulkLoader, IngestError, ResolveOutcome, Resolver, Warmup, WarmupPlan, WarmupReport};
pub use open5e::{DataQuery, Open5eClient, Open5eConfig, UpstreamError};
