//! Scanner module for source inventories.
//!
//! This module provides functionality for:
//! - Walking `<source>/<system>/` folders and collecting candidate files
//! - Fingerprinting folder contents for cache validation
//! - Normalizing filenames into comparable titles
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`normalize`]: Pure filename and query normalization
//! - [`fingerprint`]: BLAKE3 digests over sorted file listings
//! - [`walker`]: The filesystem-backed [`InventoryScanner`] implementation
//!
//! # Example
//!
//! ```no_run
//! use romsearch::config::{SourceSet, SourceSpec};
//! use romsearch::scanner::{FsScanner, InventoryScanner, ScanConfig};
//! use std::path::Path;
//!
//! let sources = SourceSet::resolve(
//!     Path::new("/roms"),
//!     &[SourceSpec::new("Official", "Official", 100)],
//! ).unwrap();
//! let scanner = FsScanner::new(ScanConfig::default());
//!
//! for source in sources.iter() {
//!     let scan = scanner.scan(source, "SNES");
//!     println!("{}: {} files ({})", source.name(), scan.entries.len(), scan.fingerprint);
//! }
//! ```

pub mod fingerprint;
pub mod normalize;
pub mod walker;

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::config::{Source, DEFAULT_EXTENSIONS};

// Re-export main types
pub use fingerprint::{Fingerprint, FingerprintBuilder};
pub use normalize::{normalize_query, normalize_title};
pub use walker::FsScanner;

/// One candidate file discovered under a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Original filename, used for display
    pub filename: String,
    /// Full path to the file
    pub path: PathBuf,
    /// Name of the owning source
    pub source: String,
    /// Priority of the owning source
    pub priority: u32,
    /// Normalized title derived from `filename`
    #[serde(default)]
    pub title: String,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl InventoryEntry {
    /// Create an entry for a file owned by `source`, deriving its title.
    #[must_use]
    pub fn new(path: PathBuf, source: &Source, size: u64, modified: SystemTime) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = normalize_title(&filename);
        Self {
            filename,
            path,
            source: source.name().to_string(),
            priority: source.priority(),
            title,
            size,
            modified,
        }
    }
}

/// Scanner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Lowercased candidate extensions, without the dot.
    pub extensions: Vec<String>,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS)
    }
}

impl ScanConfig {
    /// Create a configuration recognizing the given extensions.
    ///
    /// Extensions are trimmed, lowercased and stripped of a leading dot.
    #[must_use]
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let mut extensions: Vec<String> = extensions
            .iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        extensions.sort_unstable();
        extensions.dedup();

        Self {
            extensions,
            skip_hidden: true,
            follow_symlinks: false,
        }
    }

    /// Set whether hidden files are skipped.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip_hidden: bool) -> Self {
        self.skip_hidden = skip_hidden;
        self
    }

    /// Set whether symlinks are followed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow_symlinks: bool) -> Self {
        self.follow_symlinks = follow_symlinks;
        self
    }

    /// Whether `filename` carries a candidate extension.
    #[must_use]
    pub fn is_candidate(&self, filename: &str) -> bool {
        normalize::extension_of(filename).is_some_and(|ext| self.extensions.contains(&ext))
    }
}

/// Result of scanning one source for one system.
///
/// Errors are collected rather than returned: a source that cannot be read
/// contributes no entries and an empty fingerprint.
#[derive(Debug, Default)]
pub struct SourceScan {
    /// Fingerprint over the entries found
    pub fingerprint: Fingerprint,
    /// Candidate files in path order
    pub entries: Vec<InventoryEntry>,
    /// Non-fatal problems encountered while walking
    pub errors: Vec<ScanError>,
}

/// Produces inventories and fingerprints for a source's system folder.
///
/// The cache layer only calls [`InventoryScanner::scan`] for sources whose
/// fingerprint changed, so implementations should keep
/// [`InventoryScanner::fingerprint`] cheaper than a full scan.
pub trait InventoryScanner: Send + Sync {
    /// Compute the current fingerprint of `source`'s folder for `system`.
    ///
    /// A readable folder without candidates has the empty fingerprint.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] when the folder is missing or unreadable.
    fn fingerprint(&self, source: &Source, system: &str) -> Result<Fingerprint, ScanError>;

    /// Enumerate candidate files of `source`'s folder for `system`.
    fn scan(&self, source: &Source, system: &str) -> SourceScan;
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
