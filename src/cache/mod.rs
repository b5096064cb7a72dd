//! Per-system inventory cache.
//!
//! Scanning every source folder on each search is the slow path, so the
//! inventory of each system is persisted as one JSON file per system under
//! the cache directory (`<cache dir>/<system>.json`).
//!
//! # Architecture
//!
//! * [`record`]: The persisted [`CacheRecord`] and its checksummed envelope.
//! * [`store`]: [`CacheStore`], which loads, validates, writes and clears
//!   cache files.
//!
//! # Cache Invalidation
//!
//! Each source's inventory is stored next to the fingerprint of its folder
//! taken at scan time. On the next search the fingerprint is recomputed and
//! compared per source: a mismatch triggers a rescan of that source only.
//!
//! Unreadable, corrupted or foreign-version files count as a miss and are
//! rebuilt on the next write. They never fail a search.

pub mod record;
pub mod store;

use std::path::PathBuf;

pub use record::{CacheRecord, CACHE_VERSION};
pub use store::{CacheStore, CacheSummary};

/// Errors that can occur while reading or writing cache files.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// An I/O error occurred on a cache file or directory.
    #[error("Cache I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The cache content could not be encoded or decoded.
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The stored checksum does not match the record.
    #[error("Cache integrity check failed: checksum mismatch")]
    ChecksumMismatch,

    /// The file was written by a different cache format version.
    #[error("Cache version mismatch: found {found}, expected {expected}")]
    VersionMismatch {
        /// Version found in the file
        found: u32,
        /// Version this build writes
        expected: u32,
    },

    /// The file holds a record for another system.
    #[error("Cache file belongs to system '{found}', expected '{expected}'")]
    SystemMismatch {
        /// System requested
        expected: String,
        /// System found in the record
        found: String,
    },
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
