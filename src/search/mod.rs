//! Search orchestration.
//!
//! # Overview
//!
//! [`SearchEngine`] is the entry point callers integrate against. One search:
//!
//! 1. Validates the request (system name, threshold, result cap)
//! 2. Loads the system's cache record, if caching is enabled
//! 3. Resolves every source in parallel: reuse cached entries when the
//!    fingerprint is unchanged, otherwise rescan that source only
//! 4. Pools all entries in configured source order and runs the matcher once
//! 5. Writes the merged cache record if any source was rescanned
//!
//! Only configuration problems fail a search. Unreadable sources contribute
//! nothing and are reported in [`SearchStats::degraded_sources`]; cache read
//! and write failures are logged and otherwise ignored.
//!
//! # Example
//!
//! ```no_run
//! use romsearch::config::Config;
//! use romsearch::search::{SearchEngine, SearchRequest};
//! use std::path::Path;
//!
//! let config = Config::default();
//! let engine = SearchEngine::from_config(&config, Path::new("/roms")).unwrap();
//! let results = engine.search(&SearchRequest::new("Super Mario World", "SNES")).unwrap();
//! for result in results {
//!     println!("{}|{}", result.display_name, result.path.display());
//! }
//! ```

mod outcome;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;

use crate::cache::{CacheError, CacheRecord, CacheStore};
use crate::config::{validate_system_name, Config, ConfigError, Source, SourceSet};
use crate::matcher::{match_entries, MatchConfig, MatchResult};
use crate::progress::ScanProgress;
use crate::scanner::{Fingerprint, FsScanner, InventoryEntry, InventoryScanner};

pub use outcome::{SearchOutcome, SearchReport, SearchStats};

/// Errors that reject a search.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The request or engine configuration is invalid. Nothing was scanned.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A single query against one system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text query
    pub query: String,
    /// System folder name, e.g. `SNES`
    pub system: String,
}

impl SearchRequest {
    /// Create a request.
    #[must_use]
    pub fn new(query: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            system: system.into(),
        }
    }
}

/// How a source's inventory was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Cached,
    Scanned,
    Degraded,
}

/// Inventory of one source for one search.
#[derive(Debug)]
struct SourceInventory {
    fingerprint: Fingerprint,
    entries: Vec<InventoryEntry>,
    origin: Origin,
}

/// Stateless search orchestrator over a validated source set.
#[derive(Debug)]
pub struct SearchEngine<S: InventoryScanner = FsScanner> {
    sources: SourceSet,
    scanner: S,
    store: Option<CacheStore>,
    match_config: MatchConfig,
}

impl SearchEngine<FsScanner> {
    /// Build an engine from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration or its sources are
    /// invalid.
    pub fn from_config(config: &Config, base_dir: &Path) -> Result<Self, ConfigError> {
        config.validate()?;
        let sources = config.source_set(base_dir)?;
        let mut engine = Self::new(sources, FsScanner::new(config.scan_config()))
            .with_match_config(config.match_config());
        if config.use_cache {
            engine = engine.with_cache(CacheStore::new(config.cache_dir_for(base_dir)));
        }
        Ok(engine)
    }

    /// Report source rescans to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ScanProgress>) -> Self {
        self.scanner = self.scanner.with_progress(progress);
        self
    }

    /// System folder names found under any source, sorted.
    #[must_use]
    pub fn list_systems(&self) -> Vec<String> {
        self.scanner.list_systems(&self.sources)
    }
}

impl<S: InventoryScanner> SearchEngine<S> {
    /// Create an engine without a cache, using default match settings.
    #[must_use]
    pub fn new(sources: SourceSet, scanner: S) -> Self {
        Self {
            sources,
            scanner,
            store: None,
            match_config: MatchConfig::default(),
        }
    }

    /// Persist inventories through `store`.
    #[must_use]
    pub fn with_cache(mut self, store: CacheStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the match settings.
    #[must_use]
    pub fn with_match_config(mut self, match_config: MatchConfig) -> Self {
        self.match_config = match_config;
        self
    }

    /// Configured sources.
    #[must_use]
    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Cache store, if caching is enabled.
    #[must_use]
    pub fn store(&self) -> Option<&CacheStore> {
        self.store.as_ref()
    }

    /// Underlying scanner.
    #[must_use]
    pub fn scanner(&self) -> &S {
        &self.scanner
    }

    /// Run a search and return the ranked results.
    ///
    /// An empty list means nothing matched or nothing could be read; use
    /// [`SearchEngine::search_with_stats`] to tell the two apart.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid system name or match
    /// settings.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<MatchResult>, SearchError> {
        Ok(self.search_with_stats(request)?.outcome.into_results())
    }

    /// Run a search and return its outcome together with statistics.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for an invalid system name or match
    /// settings. Scan and cache problems never fail the search.
    pub fn search_with_stats(&self, request: &SearchRequest) -> Result<SearchReport, SearchError> {
        let start = Instant::now();
        let system = request.system.trim();
        validate_system_name(system)?;
        self.validate_match_config()?;

        let stored = self.store.as_ref().and_then(|store| store.load(system));

        let inventories: Vec<SourceInventory> = self
            .sources
            .as_slice()
            .par_iter()
            .map(|source| self.resolve_source(source, system, stored.as_ref()))
            .collect();

        let mut stats = SearchStats {
            sources_total: inventories.len(),
            ..SearchStats::default()
        };
        for (source, inventory) in self.sources.iter().zip(&inventories) {
            match inventory.origin {
                Origin::Cached => stats.sources_cached += 1,
                Origin::Scanned => stats.sources_scanned += 1,
                Origin::Degraded => stats.degraded_sources.push(source.name().to_string()),
            }
        }

        // Degraded sources only force a write when they still have stored entries.
        let drops_stored = stored.as_ref().is_some_and(|record| {
            stats
                .degraded_sources
                .iter()
                .any(|name| record.fingerprint(name).is_some())
        });
        if stats.sources_scanned > 0 || drops_stored {
            stats.cache_written = self.write_cache(system, stored, &inventories);
        }

        let pool: Vec<InventoryEntry> = inventories
            .into_iter()
            .flat_map(|inventory| inventory.entries)
            .collect();
        stats.candidates = pool.len();

        let results = match_entries(&request.query, &pool, &self.match_config);
        stats.matched = results.len();
        stats.elapsed = start.elapsed();

        log::debug!(
            "Search '{}' in {}: {} sources ({} cached, {} scanned, {} degraded), {} candidates, {} matches in {:?}",
            request.query,
            system,
            stats.sources_total,
            stats.sources_cached,
            stats.sources_scanned,
            stats.sources_degraded(),
            stats.candidates,
            stats.matched,
            stats.elapsed
        );

        Ok(SearchReport {
            outcome: SearchOutcome::from_results(results),
            stats,
        })
    }

    /// Remove the cache file for `system`, or all cache files.
    ///
    /// Returns the number of files removed; always 0 without a cache.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if a cache file exists but cannot be removed.
    pub fn clear_cache(&self, system: Option<&str>) -> Result<usize, CacheError> {
        match &self.store {
            Some(store) => store.clear(system),
            None => Ok(0),
        }
    }

    fn validate_match_config(&self) -> Result<(), ConfigError> {
        let threshold = self.match_config.threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if self.match_config.max_results == 0 {
            return Err(ConfigError::InvalidMaxResults);
        }
        Ok(())
    }

    /// Obtain one source's inventory from the cache or a rescan.
    fn resolve_source(
        &self,
        source: &Source,
        system: &str,
        stored: Option<&CacheRecord>,
    ) -> SourceInventory {
        if let (Some(store), Some(record)) = (&self.store, stored) {
            // An unreadable folder falls through to the scan, which reports it.
            if let Ok(fresh) = self.scanner.fingerprint(source, system) {
                if store.is_valid(source, record.fingerprint(source.name()), &fresh) {
                    if let Some(entries) = record.source_entries(source.name()) {
                        return SourceInventory {
                            fingerprint: fresh,
                            entries: restamp(entries, source),
                            origin: Origin::Cached,
                        };
                    }
                }
            }
        }

        let scan = self.scanner.scan(source, system);
        let origin = if scan.errors.is_empty() {
            log::info!(
                "Indexed {} files for {} in source '{}'",
                scan.entries.len(),
                system,
                source.name()
            );
            Origin::Scanned
        } else if scan.entries.is_empty() {
            log::warn!(
                "Source '{}' unavailable for {}: {}",
                source.name(),
                system,
                scan.errors[0]
            );
            Origin::Degraded
        } else {
            log::warn!(
                "Source '{}' partially indexed for {}: {} errors",
                source.name(),
                system,
                scan.errors.len()
            );
            Origin::Scanned
        };

        SourceInventory {
            fingerprint: scan.fingerprint,
            entries: scan.entries,
            origin,
        }
    }

    /// Merge rescanned sources into the stored record and persist it.
    ///
    /// Returns whether the write succeeded.
    fn write_cache(
        &self,
        system: &str,
        stored: Option<CacheRecord>,
        inventories: &[SourceInventory],
    ) -> bool {
        let Some(store) = &self.store else {
            return false;
        };

        let mut record = stored.unwrap_or_else(|| CacheRecord::new(system));
        for (source, inventory) in self.sources.iter().zip(inventories) {
            match inventory.origin {
                Origin::Cached => {}
                Origin::Scanned => record.insert_source(
                    source.name(),
                    inventory.fingerprint.clone(),
                    inventory.entries.clone(),
                ),
                Origin::Degraded => record.remove_source(source.name()),
            }
        }
        record.updated_at = Utc::now();

        match store.save(&record) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to write cache for {}: {}", system, e);
                false
            }
        }
    }
}

/// Copy cached entries, applying the source's current name and priority.
fn restamp(entries: &[InventoryEntry], source: &Source) -> Vec<InventoryEntry> {
    entries
        .iter()
        .cloned()
        .map(|mut entry| {
            entry.source = source.name().to_string();
            entry.priority = source.priority();
            entry
        })
        .collect()
}
