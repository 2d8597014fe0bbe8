//! Inbound reference-data query validation.

use std::sync::LazyLock;

use grimoire_core::{CacheKey, Category, Error};
use regex::Regex;

static SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]{0,127}$").expect("slug pattern is valid"));

/// Largest `limit` a caller may ask for.
pub const MAX_LIMIT: usize = 100;

/// How a query selects records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    All,
    Slug(String),
    Search(String),
}

/// A validated request for one category's reference data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataQuery {
    pub category: Category,
    pub lookup: Lookup,
    pub limit: Option<usize>,
}

impl DataQuery {
    /// Validate raw request parameters.
    ///
    /// Empty `slug`/`search` values count as absent. `slug` and `search`
    /// are mutually exclusive and `limit` must be in `1..=100`.
    pub fn parse(
        category: &str, slug: Option<&str>, search: Option<&str>, limit: Option<usize>,
    ) -> Result<Self, Error> {
        let category: Category = category.parse()?;
        let slug = slug.map(str::trim).filter(|s| !s.is_empty());
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let lookup = match (slug, search) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidInput("cannot specify both 'search' and 'slug'".to_string()));
            }
            (Some(slug), None) => {
                if !SLUG.is_match(slug) {
                    return Err(Error::InvalidInput(format!("invalid slug: {slug}")));
                }
                Lookup::Slug(slug.to_string())
            }
            (None, Some(term)) => Lookup::Search(term.to_string()),
            (None, None) => Lookup::All,
        };

        if let Some(limit) = limit
            && !(1..=MAX_LIMIT).contains(&limit)
        {
            return Err(Error::InvalidInput(format!("limit must be 1-{MAX_LIMIT}, got {limit}")));
        }

        Ok(Self { category, lookup, limit })
    }

    /// Cache key for this query's full (untrimmed) result.
    pub fn cache_key(&self) -> CacheKey {
        match &self.lookup {
            Lookup::Slug(slug) => CacheKey::slug(self.category, slug),
            Lookup::Search(term) => CacheKey::search(self.category, term, self.limit),
            Lookup::All => CacheKey::all(self.category, self.limit),
        }
    }
}
