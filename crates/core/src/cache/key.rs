//! Cache key construction.
//!
//! Keys are built by the caller from the request shape so that two requests
//! that would return different data never share an entry:
//!
//! - `{path}:{slug}` for a single record
//! - `{path}:search:{term}:{limit|all}` for a search
//! - `{path}:all:{limit|all}` for a listing

use std::fmt;

use crate::Category;

/// A cache key together with the category it is tagged with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    category: Category,
    key: String,
}

impl CacheKey {
    pub fn slug(category: Category, slug: &str) -> Self {
        Self { category, key: format!("{}:{slug}", category.path()) }
    }

    pub fn search(category: Category, term: &str, limit: Option<usize>) -> Self {
        Self { category, key: format!("{}:search:{term}:{}", category.path(), limit_part(limit)) }
    }

    pub fn all(category: Category, limit: Option<usize>) -> Self {
        Self { category, key: format!("{}:all:{}", category.path(), limit_part(limit)) }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }
}

fn limit_part(limit: Option<usize>) -> String {
    match limit {
        Some(n) => n.to_string(),
        None => "all".to_string(),
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
