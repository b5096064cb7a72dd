//! Cache record definitions and on-disk envelope.
//!
//! A [`CacheRecord`] holds, for one system, the fingerprint and inventory of
//! every source that contributed to it. Source keys are lowercased so lookups
//! follow the case-insensitive source naming rule.
//!
//! On disk the record is wrapped in an envelope carrying the format version
//! and a SHA-256 checksum of the serialized record:
//!
//! ```json
//! {
//!   "version": 1,
//!   "checksum": "9f86d0...",
//!   "record": {
//!     "system": "SNES",
//!     "updated_at": "2024-05-01T12:00:00Z",
//!     "fingerprints": { "official": "a1b2..." },
//!     "entries": { "official": [ { "filename": "...", "path": "...", ... } ] }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{CacheError, CacheResult};
use crate::scanner::{Fingerprint, InventoryEntry};

/// Current version of the cache file format.
pub const CACHE_VERSION: u32 = 1;

/// Persisted inventory for one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// System the record belongs to.
    pub system: String,
    /// When the record was last written.
    pub updated_at: DateTime<Utc>,
    /// Fingerprint per source key.
    pub fingerprints: BTreeMap<String, Fingerprint>,
    /// Inventory per source key.
    pub entries: BTreeMap<String, Vec<InventoryEntry>>,
}

/// File wrapper adding versioning and an integrity check.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope {
    version: u32,
    checksum: String,
    record: serde_json::Value,
}

impl CacheRecord {
    /// Create an empty record for `system`.
    #[must_use]
    pub fn new(system: &str) -> Self {
        Self {
            system: system.to_string(),
            updated_at: Utc::now(),
            fingerprints: BTreeMap::new(),
            entries: BTreeMap::new(),
        }
    }

    /// Map key for a source name.
    #[must_use]
    pub fn source_key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Stored fingerprint for a source.
    #[must_use]
    pub fn fingerprint(&self, source: &str) -> Option<&Fingerprint> {
        self.fingerprints.get(&Self::source_key(source))
    }

    /// Stored inventory for a source.
    #[must_use]
    pub fn source_entries(&self, source: &str) -> Option<&[InventoryEntry]> {
        self.entries
            .get(&Self::source_key(source))
            .map(Vec::as_slice)
    }

    /// Replace a source's fingerprint and inventory.
    pub fn insert_source(
        &mut self,
        source: &str,
        fingerprint: Fingerprint,
        entries: Vec<InventoryEntry>,
    ) {
        let key = Self::source_key(source);
        self.fingerprints.insert(key.clone(), fingerprint);
        self.entries.insert(key, entries);
    }

    /// Drop a source from the record.
    pub fn remove_source(&mut self, source: &str) {
        let key = Self::source_key(source);
        self.fingerprints.remove(&key);
        self.entries.remove(&key);
    }

    /// Number of sources with a stored fingerprint.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.fingerprints.len()
    }

    /// Total entries across all sources.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Total size in bytes of all entries.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.entries.values().flatten().map(|e| e.size).sum()
    }

    /// Serialize to the enveloped on-disk JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Serialization`] if the record cannot be encoded.
    pub fn to_json(&self) -> CacheResult<String> {
        let record = serde_json::to_value(self)?;
        let envelope = CacheEnvelope {
            version: CACHE_VERSION,
            checksum: checksum(&record)?,
            record,
        };
        Ok(serde_json::to_string_pretty(&envelope)?)
    }

    /// Parse and verify the enveloped on-disk JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::VersionMismatch`] for other format versions,
    /// [`CacheError::ChecksumMismatch`] when the record was altered, or
    /// [`CacheError::Serialization`] for malformed content.
    pub fn from_json(content: &str) -> CacheResult<Self> {
        let envelope: CacheEnvelope = serde_json::from_str(content)?;

        if envelope.version != CACHE_VERSION {
            return Err(CacheError::VersionMismatch {
                found: envelope.version,
                expected: CACHE_VERSION,
            });
        }

        if checksum(&envelope.record)? != envelope.checksum {
            return Err(CacheError::ChecksumMismatch);
        }

        Ok(serde_json::from_value(envelope.record)?)
    }
}

/// SHA-256 over the compact serialization of `record`.
///
/// Must stay compact regardless of how the envelope itself is written.
fn checksum(record: &serde_json::Value) -> CacheResult<String> {
    let compact = serde_json::to_string(record)?;
    let mut hasher = Sha256::new();
    hasher.update(compact.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
