//! Search results and per-search statistics.

use std::time::Duration;

use crate::matcher::MatchResult;

/// Result of one search.
///
/// "Nothing matched" is a distinct variant instead of an empty list carrying
/// a marker entry, so callers never inspect the data channel for sentinels.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// At least one entry reached the threshold, ranked best first.
    Matches(Vec<MatchResult>),
    /// No entry reached the threshold.
    NoResults,
}

impl SearchOutcome {
    /// Wrap ranked results, mapping an empty list to [`SearchOutcome::NoResults`].
    #[must_use]
    pub fn from_results(results: Vec<MatchResult>) -> Self {
        if results.is_empty() {
            Self::NoResults
        } else {
            Self::Matches(results)
        }
    }

    /// Ranked results, empty for [`SearchOutcome::NoResults`].
    #[must_use]
    pub fn results(&self) -> &[MatchResult] {
        match self {
            Self::Matches(results) => results,
            Self::NoResults => &[],
        }
    }

    /// Consume the outcome, returning the ranked results.
    #[must_use]
    pub fn into_results(self) -> Vec<MatchResult> {
        match self {
            Self::Matches(results) => results,
            Self::NoResults => Vec::new(),
        }
    }

    /// Whether anything matched.
    #[must_use]
    pub fn has_matches(&self) -> bool {
        matches!(self, Self::Matches(_))
    }
}

/// Counters collected during one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    /// Sources configured for the search
    pub sources_total: usize,
    /// Sources served from the cache
    pub sources_cached: usize,
    /// Sources that were rescanned
    pub sources_scanned: usize,
    /// Names of sources that could not be read
    pub degraded_sources: Vec<String>,
    /// Entries in the pooled inventory
    pub candidates: usize,
    /// Results returned
    pub matched: usize,
    /// Whether the cache file was rewritten
    pub cache_written: bool,
    /// Wall-clock time of the search
    pub elapsed: Duration,
}

impl SearchStats {
    /// Number of sources that contributed nothing because of a scan error.
    #[must_use]
    pub fn sources_degraded(&self) -> usize {
        self.degraded_sources.len()
    }

    /// Whether any source was degraded.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degraded_sources.is_empty()
    }
}

/// Outcome plus statistics, as returned by
/// [`SearchEngine::search_with_stats`](super::SearchEngine::search_with_stats).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    /// Ranked results or the no-results marker
    pub outcome: SearchOutcome,
    /// Counters for this search
    pub stats: SearchStats,
}
