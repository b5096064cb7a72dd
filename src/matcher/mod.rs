//! Match engine: scoring, filtering and ranking inventory entries.
//!
//! # Ranking
//!
//! Entries that pass the word-coverage check and reach the threshold are
//! ordered by:
//!
//! 1. Source priority, descending
//! 2. Similarity score, descending
//! 3. File size, descending
//! 4. Path, ascending (keeps the order total and reproducible)
//!
//! The list is then truncated to `max_results`.
//!
//! # Example
//!
//! ```
//! use romsearch::matcher::{match_entries, MatchConfig};
//!
//! let results = match_entries("super mario world", &[], &MatchConfig::default());
//! assert!(results.is_empty());
//! ```

pub mod score;

use std::cmp::Ordering;
use std::path::PathBuf;

use serde::Serialize;

use crate::config::{DEFAULT_MAX_RESULTS, DEFAULT_THRESHOLD};
use crate::scanner::{normalize_query, InventoryEntry};

pub use score::{covers_query_words, similarity, DEFAULT_WORD_COVERAGE};

/// Match engine settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchConfig {
    /// Minimum similarity (0-100) a result must reach.
    pub threshold: f64,
    /// Maximum number of results returned.
    pub max_results: usize,
    /// Fraction of query words a title must contain before it is scored.
    pub word_coverage: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_MAX_RESULTS)
    }
}

impl MatchConfig {
    /// Create a configuration with the default word coverage.
    #[must_use]
    pub fn new(threshold: f64, max_results: usize) -> Self {
        Self {
            threshold,
            max_results,
            word_coverage: DEFAULT_WORD_COVERAGE,
        }
    }

    /// Set the word coverage fraction. `0.0` disables the prefilter.
    #[must_use]
    pub fn with_word_coverage(mut self, word_coverage: f64) -> Self {
        self.word_coverage = word_coverage;
        self
    }
}

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Original filename
    pub display_name: String,
    /// Full path to the file
    pub path: PathBuf,
    /// Similarity score, 0-100
    pub score: f64,
    /// Name of the source the file came from
    pub source: String,
    /// Priority of that source
    pub priority: u32,
    /// File size in bytes
    pub size: u64,
}

impl MatchResult {
    fn from_entry(entry: &InventoryEntry, score: f64) -> Self {
        Self {
            display_name: entry.filename.clone(),
            path: entry.path.clone(),
            score,
            source: entry.source.clone(),
            priority: entry.priority,
            size: entry.size,
        }
    }
}

/// Score `entries` against `query` and return the ranked, capped results.
///
/// A query that normalizes to an empty string matches nothing. Entries
/// without a title are skipped.
#[must_use]
pub fn match_entries(
    query: &str,
    entries: &[InventoryEntry],
    config: &MatchConfig,
) -> Vec<MatchResult> {
    let query = normalize_query(query);
    if query.is_empty() || entries.is_empty() || config.max_results == 0 {
        return Vec::new();
    }

    let mut skipped = 0usize;
    let mut results: Vec<MatchResult> = entries
        .iter()
        .filter(|entry| {
            if entry.title.is_empty() {
                skipped += 1;
                return false;
            }
            covers_query_words(&query, &entry.title, config.word_coverage)
        })
        .filter_map(|entry| {
            let score = similarity(&query, &entry.title);
            (score >= config.threshold).then(|| MatchResult::from_entry(entry, score))
        })
        .collect();

    if skipped > 0 {
        log::debug!("Skipped {} entries without a title", skipped);
    }

    results.sort_by(compare_results);
    results.truncate(config.max_results);

    log::debug!(
        "Matched {} of {} entries for '{}'",
        results.len(),
        entries.len(),
        query
    );
    results
}

/// Ranking order: priority desc, score desc, size desc, path asc.
fn compare_results(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| b.size.cmp(&a.size))
        .then_with(|| a.path.cmp(&b.path))
}
