//! Source fingerprints for cache validation.
//!
//! A fingerprint is a BLAKE3 digest over the sorted list of
//! `(relative path, size, mtime)` tuples of every candidate file under a
//! source's system folder. Sorting makes it independent of filesystem
//! iteration order; any addition, removal, rename, size change or mtime change
//! produces a different digest.
//!
//! The digest is seeded with the scanned root and the candidate extension set,
//! so pointing a source somewhere else or changing which files count as
//! candidates also invalidates cached entries.

use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Fingerprint value used when a source folder is missing or holds no candidates.
pub const EMPTY_FINGERPRINT: &str = "empty";

/// Hex-encoded digest summarizing a source folder's candidate files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The fingerprint of a folder without candidates.
    #[must_use]
    pub fn empty() -> Self {
        Self(EMPTY_FINGERPRINT.to_string())
    }

    /// Whether this is the fingerprint of an empty or missing folder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == EMPTY_FINGERPRINT
    }

    /// Hex string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accumulates file tuples and produces a [`Fingerprint`].
#[derive(Debug)]
pub struct FingerprintBuilder {
    seed: Vec<u8>,
    files: Vec<(String, u64, u128)>,
}

impl FingerprintBuilder {
    /// Start a fingerprint for `root`, scoped to the given extension set.
    #[must_use]
    pub fn new(root: &Path, extensions: &[String]) -> Self {
        let mut exts: Vec<&str> = extensions.iter().map(String::as_str).collect();
        exts.sort_unstable();
        exts.dedup();

        let mut seed = Vec::new();
        seed.extend_from_slice(root.to_string_lossy().as_bytes());
        seed.push(0);
        for ext in exts {
            seed.extend_from_slice(ext.as_bytes());
            seed.push(b',');
        }

        Self {
            seed,
            files: Vec::new(),
        }
    }

    /// Record one candidate file.
    pub fn add(&mut self, relative_path: &str, size: u64, modified: SystemTime) {
        let mtime = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        self.files.push((relative_path.to_string(), size, mtime));
    }

    /// Whether no files were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Finish and produce the fingerprint.
    #[must_use]
    pub fn finish(mut self) -> Fingerprint {
        if self.files.is_empty() {
            return Fingerprint::empty();
        }

        self.files.sort_unstable();

        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed);
        for (path, size, mtime) in &self.files {
            hasher.update(path.as_bytes());
            hasher.update(&[0]);
            hasher.update(&size.to_le_bytes());
            hasher.update(&mtime.to_le_bytes());
        }
        Fingerprint(hasher.finalize().to_hex().to_string())
    }
}
