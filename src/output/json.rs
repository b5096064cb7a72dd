//! JSON output formatter for search results.
//!
//! Used by `romsearch search --output json` so frontends can read results
//! and degradation details without parsing text lines.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "outcome": "matches",
//!   "results": [
//!     {
//!       "display_name": "Super Mario World (Spanish).zip",
//!       "path": "/roms/Translations/SNES/Super Mario World (Spanish).zip",
//!       "score": 100.0,
//!       "source": "Translations",
//!       "priority": 200,
//!       "size": 524288
//!     }
//!   ],
//!   "stats": {
//!     "sources_total": 2,
//!     "sources_cached": 2,
//!     "sources_scanned": 0,
//!     "sources_degraded": 0,
//!     "degraded_sources": [],
//!     "candidates": 1532,
//!     "matched": 2,
//!     "cache_written": false,
//!     "elapsed_ms": 12,
//!     "exit_code": 0,
//!     "exit_code_name": "RS000"
//!   }
//! }
//! ```
//!
//! # Example
//!
//! ```
//! use romsearch::error::ExitCode;
//! use romsearch::output::json::JsonOutput;
//! use romsearch::search::{SearchOutcome, SearchStats};
//!
//! let output = JsonOutput::new(&SearchOutcome::NoResults, &SearchStats::default(), ExitCode::NoMatches);
//! let json = output.to_json().unwrap();
//! assert!(json.contains("\"outcome\":\"no_results\""));
//! ```

use std::io::Write;

use serde::Serialize;

use crate::error::ExitCode;
use crate::matcher::MatchResult;
use crate::search::{SearchOutcome, SearchStats};

/// Outcome tag in JSON form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonOutcome {
    /// At least one result
    Matches,
    /// Nothing matched
    NoResults,
}

/// Search statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonStats {
    /// Sources configured
    pub sources_total: usize,
    /// Sources served from cache
    pub sources_cached: usize,
    /// Sources rescanned
    pub sources_scanned: usize,
    /// Sources that could not be read
    pub sources_degraded: usize,
    /// Names of unreadable sources
    pub degraded_sources: Vec<String>,
    /// Entries considered
    pub candidates: usize,
    /// Results returned
    pub matched: usize,
    /// Whether the cache file was rewritten
    pub cache_written: bool,
    /// Duration of the search in milliseconds
    pub elapsed_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "RS000")
    pub exit_code_name: String,
}

impl JsonStats {
    /// Create JSON stats from search statistics and an exit code.
    #[must_use]
    pub fn from_search_stats(stats: &SearchStats, exit_code: ExitCode) -> Self {
        Self {
            sources_total: stats.sources_total,
            sources_cached: stats.sources_cached,
            sources_scanned: stats.sources_scanned,
            sources_degraded: stats.sources_degraded(),
            degraded_sources: stats.degraded_sources.clone(),
            candidates: stats.candidates,
            matched: stats.matched,
            cache_written: stats.cache_written,
            elapsed_ms: stats.elapsed.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// The document printed for one search.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Whether anything matched
    pub outcome: JsonOutcome,
    /// Ranked results, best first
    pub results: Vec<MatchResult>,
    /// Search statistics
    pub stats: JsonStats,
}

impl JsonOutput {
    /// Create a new JSON output from a search outcome, statistics and exit code.
    ///
    /// # Arguments
    ///
    /// * `outcome` - The search outcome
    /// * `stats` - The statistics collected during the search
    /// * `exit_code` - Code the process will exit with
    #[must_use]
    pub fn new(outcome: &SearchOutcome, stats: &SearchStats, exit_code: ExitCode) -> Self {
        let tag = if outcome.has_matches() {
            JsonOutcome::Matches
        } else {
            JsonOutcome::NoResults
        };
        Self {
            outcome: tag,
            results: outcome.results().to_vec(),
            stats: JsonStats::from_search_stats(stats, exit_code),
        }
    }

    /// Render as a single-line JSON document.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Render as an indented JSON document.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` failures.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the document followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns [`JsonOutputError`] if rendering or the write fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Failure to emit the JSON document.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// Rendering failed
    #[error("failed to render search results as JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing to the destination failed
    #[error("failed to write JSON results: {0}")]
    Io(#[from] std::io::Error),
}
