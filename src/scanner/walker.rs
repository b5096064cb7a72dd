//! Filesystem-backed inventory scanner using jwalk.
//!
//! # Overview
//!
//! [`FsScanner`] walks `<source root>/<system>/` recursively, keeps files
//! whose extension is in the candidate set, and turns them into
//! [`InventoryEntry`] values. The same walk, minus title normalization, backs
//! [`InventoryScanner::fingerprint`].
//!
//! A missing or unreadable folder is not an error for the caller: the scan
//! yields no entries, an empty fingerprint, and the problem is recorded in
//! [`SourceScan::errors`].
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
//! let scan = scanner.scan(&sources.as_slice()[0], "SNES");
//! for entry in &scan.entries {
//!     println!("{} -> {}", entry.filename, entry.title);
//! }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use jwalk::{Parallelism, WalkDir};

use super::{
    Fingerprint, FingerprintBuilder, InventoryEntry, InventoryScanner, ScanConfig, ScanError,
    SourceScan,
};
use crate::config::{Source, SourceSet};
use crate::progress::{should_report, ScanProgress};

/// A candidate file found by the walk.
#[derive(Debug)]
struct WalkedFile {
    path: PathBuf,
    relative: String,
    size: u64,
    modified: SystemTime,
}

/// Scanner reading source folders from the local filesystem.
#[derive(Clone)]
pub struct FsScanner {
    config: ScanConfig,
    progress: Option<Arc<dyn ScanProgress>>,
}

impl std::fmt::Debug for FsScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsScanner")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl FsScanner {
    /// Create a scanner with the given configuration.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    /// Report rescans to a progress callback.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ScanProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Names of system folders across all sources, sorted and deduplicated.
    ///
    /// Unreadable source roots are logged and skipped.
    #[must_use]
    pub fn list_systems(&self, sources: &SourceSet) -> Vec<String> {
        let mut systems = BTreeSet::new();

        for source in sources.iter() {
            let read_dir = match std::fs::read_dir(source.root()) {
                Ok(read_dir) => read_dir,
                Err(e) => {
                    log::warn!(
                        "Cannot list systems in source '{}' ({}): {}",
                        source.name(),
                        source.root().display(),
                        e
                    );
                    continue;
                }
            };

            for entry in read_dir.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if self.config.skip_hidden && name.starts_with('.') {
                    continue;
                }
                if entry.path().is_dir() {
                    systems.insert(name);
                }
            }
        }

        systems.into_iter().collect()
    }

    /// Check the system folder before walking it.
    fn check_dir(&self, dir: &Path) -> Result<(), ScanError> {
        match std::fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(dir.to_path_buf())),
            Err(e) => Err(io_to_scan_error(dir, e)),
        }
    }

    /// Walk `dir`, yielding candidate files in sorted order.
    fn walk<'a>(
        &'a self,
        dir: &'a Path,
    ) -> impl Iterator<Item = Result<WalkedFile, ScanError>> + 'a {
        // Sources already run on the rayon pool; a nested parallel walk would
        // compete with them for the same workers.
        let walk_dir = WalkDir::new(dir)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .sort(true)
            .parallelism(Parallelism::Serial);

        walk_dir.into_iter().filter_map(move |entry_result| match entry_result {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_dir() {
                    return None;
                }

                let filename = entry.file_name().to_string_lossy();
                if !self.config.is_candidate(&filename) {
                    log::trace!("Skipping non-candidate file: {}", path.display());
                    return None;
                }

                let metadata = if self.config.follow_symlinks {
                    std::fs::metadata(&path)
                } else {
                    std::fs::symlink_metadata(&path)
                };
                let metadata = match metadata {
                    Ok(m) => m,
                    Err(e) => return Some(Err(io_to_scan_error(&path, e))),
                };
                if !metadata.is_file() {
                    return None;
                }

                let relative = path
                    .strip_prefix(dir)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");

                Some(Ok(WalkedFile {
                    size: metadata.len(),
                    modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                    relative,
                    path,
                }))
            }
            Err(e) => {
                let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                let err = match e.io_error().map(std::io::Error::kind) {
                    Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
                    Some(std::io::ErrorKind::NotFound) => ScanError::NotFound(path),
                    _ => ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    },
                };
                Some(Err(err))
            }
        })
    }
}

impl InventoryScanner for FsScanner {
    fn fingerprint(&self, source: &Source, system: &str) -> Result<Fingerprint, ScanError> {
        let dir = source.system_dir(system);
        self.check_dir(&dir)?;

        let mut builder = FingerprintBuilder::new(&dir, &self.config.extensions);
        for file in self.walk(&dir).flatten() {
            builder.add(&file.relative, file.size, file.modified);
        }
        Ok(builder.finish())
    }

    fn scan(&self, source: &Source, system: &str) -> SourceScan {
        let dir = source.system_dir(system);
        if let Err(e) = self.check_dir(&dir) {
            log::debug!("Source '{}' has no folder for {}: {}", source.name(), system, e);
            return SourceScan {
                fingerprint: Fingerprint::empty(),
                entries: Vec::new(),
                errors: vec![e],
            };
        }

        if let Some(progress) = &self.progress {
            progress.on_scan_start(source.name());
        }

        let mut builder = FingerprintBuilder::new(&dir, &self.config.extensions);
        let mut entries = Vec::new();
        let mut errors = Vec::new();

        for result in self.walk(&dir) {
            match result {
                Ok(file) => {
                    builder.add(&file.relative, file.size, file.modified);
                    entries.push(InventoryEntry::new(file.path, source, file.size, file.modified));
                    if let Some(progress) = &self.progress {
                        if should_report(entries.len()) {
                            progress.on_files(source.name(), entries.len());
                        }
                    }
                }
                Err(e) => {
                    log::warn!("{}", e);
                    errors.push(e);
                }
            }
        }

        if let Some(progress) = &self.progress {
            progress.on_scan_end(source.name(), entries.len());
        }

        SourceScan {
            fingerprint: builder.finish(),
            entries,
            errors,
        }
    }
}

/// Map an I/O error to the matching [`ScanError`] variant.
fn io_to_scan_error(path: &Path, error: std::io::Error) -> ScanError {
    use std::io::ErrorKind;

    match error.kind() {
        ErrorKind::PermissionDenied => ScanError::PermissionDenied(path.to_path_buf()),
        ErrorKind::NotFound => ScanError::NotFound(path.to_path_buf()),
        _ => ScanError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}
