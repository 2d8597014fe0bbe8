//! Core types and shared functionality for grimoire.
//!
//! This crate provides:
//! - Reference-data categories and typed records
//! - The persistent reference store and the tiered response cache, both on SQLite
//! - Unified error types
//! - Configuration loading

pub mod cache;
pub mod category;
pub mod config;
pub mod db;
pub mod error;
pub mod store;

pub use cache::{CacheKey, TieredCache};
pub use category::Category;
pub use config::AppConfig;
pub use db::Database;
pub use error::Error;
pub use store::ReferenceStore;
