//! SQLite database shared by the reference store and the cache.
//!
//! One file holds both the normalized reference tables and the persisted
//! cache tier. Access goes through tokio-rusqlite, which runs every
//! statement on a dedicated background thread, so writers serialize there
//! and transactions are the only durability boundary.

pub mod connection;
pub mod migrations;

pub use connection::Database;
