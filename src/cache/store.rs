//! File-backed cache store.
//!
//! One JSON file per system lives under the cache directory. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so concurrent readers see either the old or the new record and
//! never a partial one. Concurrent writers resolve by last rename wins.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use super::{CacheError, CacheRecord, CacheResult};
use crate::config::Source;
use crate::scanner::Fingerprint;

/// Extension of cache files.
const CACHE_FILE_EXTENSION: &str = "json";

/// Size and freshness of one system's cache file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSummary {
    /// System name
    pub system: String,
    /// Sources stored in the record
    pub sources: usize,
    /// Entries across all sources
    pub entries: usize,
    /// Total size of the indexed files in bytes
    pub total_size: u64,
    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}

/// Loads and persists [`CacheRecord`]s.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    ///
    /// # Example
    ///
    /// ```
    /// use romsearch::cache::CacheStore;
    /// use std::path::Path;
    ///
    /// let store = CacheStore::new("/roms/.rom_cache");
    /// assert_eq!(store.path_for("SNES"), Path::new("/roms/.rom_cache/SNES.json"));
    /// ```
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the record for `system`.
    #[must_use]
    pub fn path_for(&self, system: &str) -> PathBuf {
        self.dir.join(format!("{system}.{CACHE_FILE_EXTENSION}"))
    }

    /// Load the record for `system`, treating any failure as a miss.
    ///
    /// Missing files are silent; unreadable or invalid files are logged.
    #[must_use]
    pub fn load(&self, system: &str) -> Option<CacheRecord> {
        match self.try_load(system) {
            Ok(record) => record,
            Err(e) => {
                log::warn!(
                    "Ignoring cache file {}: {}",
                    self.path_for(system).display(),
                    e
                );
                None
            }
        }
    }

    /// Load the record for `system`.
    ///
    /// Returns `Ok(None)` when no cache file exists.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the file cannot be read, fails its
    /// integrity or version check, or belongs to another system.
    pub fn try_load(&self, system: &str) -> CacheResult<Option<CacheRecord>> {
        let path = self.path_for(system);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No cache file at {}", path.display());
                return Ok(None);
            }
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let record = CacheRecord::from_json(&content)?;
        if record.system != system {
            return Err(CacheError::SystemMismatch {
                expected: system.to_string(),
                found: record.system,
            });
        }

        log::debug!(
            "Loaded cache for {} ({} sources, {} entries)",
            system,
            record.source_count(),
            record.entry_count()
        );
        Ok(Some(record))
    }

    /// Persist `record` atomically, creating the cache directory if needed.
    ///
    /// # Errors
    ///
    /// Returns a [`CacheError`] if the directory cannot be created or the
    /// file cannot be written or moved into place. The previous file, if
    /// any, is left untouched on failure.
    pub fn save(&self, record: &CacheRecord) -> CacheResult<()> {
        let path = self.path_for(&record.system);
        let json = record.to_json()?;

        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let io_err = |source| CacheError::Io {
            path: path.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        staged.write_all(json.as_bytes()).map_err(io_err)?;
        staged.as_file().sync_all().map_err(io_err)?;
        staged.persist(&path).map_err(|e| io_err(e.error))?;

        log::debug!(
            "Wrote cache for {} ({} entries) to {}",
            record.system,
            record.entry_count(),
            path.display()
        );
        Ok(())
    }

    /// Whether a source's stored inventory can be reused.
    ///
    /// Valid only when a fingerprint was stored and equals the fresh one.
    #[must_use]
    pub fn is_valid(
        &self,
        source: &Source,
        stored: Option<&Fingerprint>,
        fresh: &Fingerprint,
    ) -> bool {
        match stored {
            Some(stored) if stored == fresh => {
                log::debug!("Cache hit for source {}", source.name());
                true
            }
            Some(_) => {
                log::info!("Source {} changed since last scan", source.name());
                false
            }
            None => {
                log::debug!("No cached inventory for source {}", source.name());
                false
            }
        }
    }

    /// Delete the cache file for `system`, or every cache file when `None`.
    ///
    /// Returns the number of files removed. A missing cache directory counts
    /// as already clear.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if a file cannot be removed.
    pub fn clear(&self, system: Option<&str>) -> CacheResult<usize> {
        let targets = match system {
            Some(system) => vec![self.path_for(system)],
            None => self
                .cached_systems()?
                .iter()
                .map(|s| self.path_for(s))
                .collect(),
        };

        let mut removed = 0;
        for path in targets {
            match fs::remove_file(&path) {
                Ok(()) => {
                    log::info!("Removed cache file {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(source) => return Err(CacheError::Io { path, source }),
            }
        }
        Ok(removed)
    }

    /// Systems with a cache file, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the cache directory exists but cannot be
    /// listed.
    pub fn cached_systems(&self) -> CacheResult<Vec<String>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut systems: Vec<String> = read_dir
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|e| e.to_str()) == Some(CACHE_FILE_EXTENSION)
            })
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .collect();
        systems.sort();
        Ok(systems)
    }

    /// Summaries of every readable cache file, sorted by system.
    ///
    /// Invalid files are logged and left out.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the cache directory cannot be listed.
    pub fn summaries(&self) -> CacheResult<Vec<CacheSummary>> {
        Ok(self
            .cached_systems()?
            .into_iter()
            .filter_map(|system| self.load(&system))
            .map(|record| CacheSummary {
                sources: record.source_count(),
                entries: record.entry_count(),
                total_size: record.total_size(),
                updated_at: record.updated_at,
                system: record.system,
            })
            .collect())
    }
}
