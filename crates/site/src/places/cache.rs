//! Cache types for Places API responses.

use super::types::{PlaceDetails, Suggestion};

/// Cache key, normalized so equivalent inputs share an entry.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Autocomplete(String),
    TextSearch(String),
    Details(String),
}

impl CacheKey {
    /// Key for a free-text query: trimmed and lower-cased.
    pub fn query(kind: fn(String) -> Self, input: &str) -> Self {
        kind(input.trim().to_lowercase())
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Suggestions(Vec<Suggestion>),
    Details(PlaceDetails),
}
