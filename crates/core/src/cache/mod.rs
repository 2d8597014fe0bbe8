//! TTL cache for upstream reference responses.
//!
//! A [`TieredCache`] keeps decoded-on-demand JSON payloads in memory in
//! front of a [`CacheBackend`]. The SQLite backend lets entries survive a
//! restart; the memory tier saves the round trip on hot keys.

mod backend;
mod key;
mod tiered;

pub use backend::{CACHE_FORMAT_VERSION, CacheBackend, CacheEntry, CacheMetadata};
pub use key::CacheKey;
pub use tiered::TieredCache;
