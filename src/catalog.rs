//! Catalog persistence: the durable per-source-file record of assigned indices.
//!
//! One catalog file exists per scanned source file, mirrored under the export
//! root (`locales/app/greet.js` -> `locales/app/greet.json`). The file is
//! read once at session start, consulted read-only to pre-seed index reuse,
//! and entirely replaced at session end. A corrupted catalog must never block
//! extraction, only cost index reuse, so loading is lenient.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::hasher;
use crate::types::Location;

/// Exclusive upper bound for per-file indices. Indices live in
/// `[1, MAX_INDEX_COUNT)` and wrap back to 1 when exhausted.
pub const MAX_INDEX_COUNT: u32 = 1000;

/// The persisted catalog for one source file.
/// Serialized field names follow the interchange shape consumed by the
/// runtime lookup side (`callIndex`, `hashPrefix`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Last-assigned index counter, carried across sessions so new strings
    /// continue numbering instead of restarting at 1.
    pub call_index: u32,
    /// Per-file constant added to every index to form the globally
    /// referenced number: CRC-32 of `source` times `MAX_INDEX_COUNT`.
    pub hash_prefix: i64,
    /// Catalog-relative path of the source file; doubles as the
    /// `hash_prefix` seed.
    pub source: String,
    /// Occurrences keyed by fingerprint rendered as a decimal string.
    pub text: BTreeMap<String, Occurrence>,
}

/// One distinct fingerprint's record within a file: every call site that
/// produced it plus its stable index and canonical text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Assigned slot number within this file's catalog.
    pub index: u32,
    /// Explicit locale tag, absent for the default locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Every call-site span that produced this fingerprint, in scan order.
    pub locations: Vec<Location>,
    /// Canonical text: the first-seen fragment content.
    pub text: String,
}

impl Catalog {
    /// Read and parse a catalog, treating any failure as "no prior catalog".
    ///
    /// Malformed or unreadable content degrades to `None` rather than
    /// failing the run; the session then numbers from scratch.
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        return serde_json::from_str(&content).ok();
    }

    /// Delete a persisted catalog, tolerating one that never existed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` for removal failures other than not-found.
    pub fn remove(path: &Path) -> Result<(), Error> {
        return match std::fs::remove_file(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
            Ok(()) => Ok(()),
        };
    }

    /// Serialize deterministically: `BTreeMap` keys give a stable entry
    /// order, so equal catalogs produce byte-identical files.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails.
    pub fn serialize(&self) -> Result<String, Error> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        return Ok(out);
    }

    /// Atomically replace the catalog file with a fresh serialization.
    ///
    /// Parents are created first (`create_dir_all` is idempotent and treats
    /// a concurrently created directory as success), then the content is
    /// written to a sibling temp file and renamed into place so a reader
    /// never observes a partially written catalog.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if serialization fails, or `Error::Io` if the
    /// file cannot be written or renamed.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let content = self.serialize()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        return Ok(());
    }
}

/// Compute the catalog path for a source file: the relative path mirrored
/// under the export root with the extension swapped to `.json`.
pub fn catalog_path(export_dir: &Path, source: &str) -> PathBuf {
    return export_dir.join(source).with_extension("json");
}

/// Per-file reference prefix: CRC-32 of the catalog-relative path, widened
/// past the index range. Same path, same prefix, on every machine.
pub fn hash_prefix(source: &str) -> i64 {
    return i64::from(hasher::path_checksum(source)).saturating_mul(i64::from(MAX_INDEX_COUNT));
}
