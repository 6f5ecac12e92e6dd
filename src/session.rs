//! Per-file extraction session: fingerprint bookkeeping and stable index reuse.
//!
//! A session owns the in-memory catalog for exactly one source file, from
//! prior-catalog load to commit. All running state lives here rather than in
//! process-wide globals; sessions for different files are fully independent.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, MAX_INDEX_COUNT, Occurrence, catalog_path, hash_prefix};
use crate::error::Error;
use crate::hasher;
use crate::types::{Fingerprint, Location};

/// One pass of the engine over one source file.
pub struct Session {
    /// Fingerprint -> position in `occurrences`, for repeat sightings.
    by_fingerprint: HashMap<Fingerprint, usize>,
    /// Running last-assigned index, seeded from the prior catalog.
    call_index: u32,
    /// Where the catalog for this source lives.
    catalog_path: PathBuf,
    /// Per-file reference prefix, computed lazily on first occurrence and
    /// then held fixed for the rest of the session.
    hash_prefix: Option<i64>,
    /// Occurrences in first-seen order, which exports must preserve.
    occurrences: Vec<(Fingerprint, Occurrence)>,
    /// Indices assigned by previous sessions, consulted read-only.
    prior: HashMap<Fingerprint, u32>,
    /// Catalog-relative path of the source file being processed.
    source: String,
}

impl Session {
    /// Start a session for one source file, loading any prior catalog at
    /// the deterministic path under the export root. A missing or corrupt
    /// prior catalog just means numbering starts fresh at 1.
    pub fn begin(export_dir: &Path, source: &str) -> Self {
        let path = catalog_path(export_dir, source);
        let prior_catalog = Catalog::load(&path);

        let mut prior = HashMap::new();
        let mut call_index = 0;
        if let Some(catalog) = prior_catalog {
            call_index = catalog.call_index;
            for (key, occurrence) in catalog.text {
                if let Ok(value) = key.parse::<i32>() {
                    prior.insert(Fingerprint(value), occurrence.index);
                }
            }
        }

        return Self {
            by_fingerprint: HashMap::new(),
            call_index,
            catalog_path: path,
            hash_prefix: None,
            occurrences: Vec::new(),
            prior,
            source: source.to_string(),
        };
    }

    /// Persist the session's final state.
    ///
    /// A non-empty session entirely replaces the catalog file; an empty one
    /// deletes any stale catalog so dead entries cannot be mistaken for
    /// live ones.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` or `Error::Json` from the catalog write.
    pub fn commit(mut self) -> Result<(), Error> {
        if self.occurrences.is_empty() {
            return Catalog::remove(&self.catalog_path);
        }

        let prefix = self.prefix();
        let text = self
            .occurrences
            .into_iter()
            .map(|(fingerprint, occurrence)| return (fingerprint.to_string(), occurrence))
            .collect();

        let catalog = Catalog {
            call_index: self.call_index,
            hash_prefix: prefix,
            source: self.source,
            text,
        };
        return catalog.write(&self.catalog_path);
    }

    /// The globally referenced number for an assigned index.
    pub fn global_index(&mut self, index: u32) -> i64 {
        return self.prefix().saturating_add(i64::from(index));
    }

    /// Record one accepted call site. Must be called exactly once per call
    /// site, in source scan order.
    ///
    /// A repeat fingerprint appends the location to the existing occurrence
    /// and returns its index; a new fingerprint reuses the prior catalog's
    /// index when present, otherwise takes the next fresh one. Returns the
    /// index and whether the occurrence was newly created.
    pub fn observe(&mut self, text: &str, locale: Option<&str>, location: Location) -> (u32, bool) {
        let fingerprint = hasher::fingerprint(text);

        if let Some(&slot) = self.by_fingerprint.get(&fingerprint) {
            let Some((_, occurrence)) = self.occurrences.get_mut(slot) else {
                // by_fingerprint only ever holds valid slots.
                return (0, false);
            };
            occurrence.locations.push(location);
            return (occurrence.index, false);
        }

        let index = self.reserve_index(fingerprint);
        self.by_fingerprint.insert(fingerprint, self.occurrences.len());
        self.occurrences.push((
            fingerprint,
            Occurrence {
                index,
                locale: locale.map(str::to_string),
                locations: vec![location],
                text: text.to_string(),
            },
        ));
        return (index, true);
    }

    /// Compute the per-file prefix on first use, then hold it fixed.
    fn prefix(&mut self) -> i64 {
        if let Some(prefix) = self.hash_prefix {
            return prefix;
        }
        let prefix = hash_prefix(&self.source);
        self.hash_prefix = Some(prefix);
        return prefix;
    }

    /// Prior index if the fingerprint was cataloged before; otherwise the
    /// next fresh index. Fresh numbering wraps to 1 when it would reach
    /// `MAX_INDEX_COUNT` — colliding with a long-lived index after enough
    /// churn is an accepted limitation, kept as-is deliberately.
    fn reserve_index(&mut self, fingerprint: Fingerprint) -> u32 {
        if let Some(&index) = self.prior.get(&fingerprint) {
            return index;
        }
        let mut next = self.call_index.wrapping_add(1);
        if next >= MAX_INDEX_COUNT {
            next = 1;
        }
        self.call_index = next;
        return next;
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::catalog;

    fn loc(line: u32) -> Location {
        return Location::from([line, 4, line, 20]);
    }

    #[test]
    fn fresh_fingerprints_number_monotonically_from_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::begin(dir.path(), "app/greet.js");

        assert_eq!(session.observe("Hello", None, loc(3)), (1, true));
        assert_eq!(session.observe("Bye", None, loc(4)), (2, true));
        assert_eq!(session.observe("Welcome", None, loc(5)), (3, true));
    }

    #[test]
    fn repeat_text_aggregates_into_one_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::begin(dir.path(), "app/greet.js");

        assert_eq!(session.observe("Hello", None, loc(3)), (1, true));
        assert_eq!(session.observe("Hello", None, loc(10)), (1, false));
        session.commit().unwrap();

        let persisted =
            Catalog::load(&catalog::catalog_path(dir.path(), "app/greet.js")).unwrap();
        assert_eq!(persisted.text.len(), 1);
        let entry = persisted.text.values().next().unwrap();
        assert_eq!(entry.locations.len(), 2);
        assert_eq!(entry.locations[0].start_line, 3);
        assert_eq!(entry.locations[1].start_line, 10);
    }

    #[test]
    fn second_session_reuses_persisted_indices() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = Session::begin(dir.path(), "app/greet.js");
        first.observe("Hello", None, loc(3));
        first.observe("Hello", None, loc(10));
        first.commit().unwrap();

        // Hello keeps index 1 even though a new string arrives first.
        let mut second = Session::begin(dir.path(), "app/greet.js");
        assert_eq!(second.observe("Bye", None, loc(1)), (2, true));
        assert_eq!(second.observe("Hello", None, loc(3)), (1, true));
        second.commit().unwrap();

        let persisted =
            Catalog::load(&catalog::catalog_path(dir.path(), "app/greet.js")).unwrap();
        assert_eq!(persisted.call_index, 2);
    }

    #[test]
    fn vanished_strings_are_dropped_on_commit() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = Session::begin(dir.path(), "app/greet.js");
        first.observe("Hello", None, loc(3));
        first.observe("Bye", None, loc(4));
        first.commit().unwrap();

        let mut second = Session::begin(dir.path(), "app/greet.js");
        second.observe("Hello", None, loc(3));
        second.commit().unwrap();

        let persisted =
            Catalog::load(&catalog::catalog_path(dir.path(), "app/greet.js")).unwrap();
        assert_eq!(persisted.text.len(), 1);
        let entry = persisted.text.values().next().unwrap();
        assert_eq!(entry.text, "Hello");
        assert_eq!(entry.index, 1);
    }

    #[test]
    fn empty_session_deletes_stale_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog::catalog_path(dir.path(), "app/greet.js");

        let mut first = Session::begin(dir.path(), "app/greet.js");
        first.observe("Hello", None, loc(3));
        first.commit().unwrap();
        assert!(path.exists());

        let second = Session::begin(dir.path(), "app/greet.js");
        second.commit().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn fresh_index_wraps_to_one_at_the_boundary() {
        let dir = tempfile::tempdir().unwrap();

        // Persist a catalog whose counter sits just below the wrap point.
        let catalog = Catalog {
            call_index: MAX_INDEX_COUNT - 1,
            hash_prefix: catalog::hash_prefix("app/greet.js"),
            source: "app/greet.js".to_string(),
            text: std::collections::BTreeMap::new(),
        };
        catalog.write(&catalog::catalog_path(dir.path(), "app/greet.js")).unwrap();

        let mut session = Session::begin(dir.path(), "app/greet.js");
        assert_eq!(session.observe("Overflow", None, loc(1)), (1, true));
    }

    #[test]
    fn corrupt_prior_catalog_degrades_to_fresh_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let path = catalog::catalog_path(dir.path(), "app/greet.js");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json at all").unwrap();

        let mut session = Session::begin(dir.path(), "app/greet.js");
        assert_eq!(session.observe("Hello", None, loc(3)), (1, true));
    }

    #[test]
    fn global_index_folds_in_the_file_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::begin(dir.path(), "app/greet.js");
        let (index, _) = session.observe("Hello", None, loc(3));
        let expected = catalog::hash_prefix("app/greet.js") + i64::from(index);
        assert_eq!(session.global_index(index), expected);
    }

    #[test]
    fn two_runs_over_the_same_input_are_byte_identical() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();

        for dir in [&dir_a, &dir_b] {
            let mut session = Session::begin(dir.path(), "app/greet.js");
            session.observe("Hello", None, loc(3));
            session.observe("Bye", Some("zh_CN"), loc(7));
            session.observe("Hello", None, loc(10));
            session.commit().unwrap();
        }

        let a = std::fs::read_to_string(catalog::catalog_path(dir_a.path(), "app/greet.js"))
            .unwrap();
        let b = std::fs::read_to_string(catalog::catalog_path(dir_b.path(), "app/greet.js"))
            .unwrap();
        assert_eq!(a, b);
    }
}
