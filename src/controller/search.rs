use std::time::Duration;

use crate::mfapi::Scheme;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_MIN_QUERY_LEN: usize = 3;
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Tuning for the search-as-you-type pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    pub debounce: Duration,    // Quiet period before a filter pass runs
    pub min_query_len: usize,  // Counted in chars, not bytes
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchSettings {
    pub fn is_searchable(&self, query: &str) -> bool {
        query.chars().count() >= self.min_query_len
    }
}

/// Match schemes whose name contains `query` (case-insensitive) or whose code
/// rendered as text contains it. List order is kept and at most `limit`
/// schemes are returned.
pub fn filter_schemes(schemes: &[Scheme], query: &str, limit: usize) -> Vec<Scheme> {
    let needle = query.to_lowercase();
    schemes
        .iter()
        .filter(|scheme| {
            scheme.scheme_name.to_lowercase().contains(&needle)
                || scheme.scheme_code.to_string().contains(query)
        })
        .take(limit)
        .cloned()
        .collect()
}
