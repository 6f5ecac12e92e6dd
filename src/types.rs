/// Core domain types for phrasebook call sites, locations, and fingerprints.
use std::ops::Range;

/// One localization call discovered in a source file.
/// Produced by the scanner in source order; consumed exactly once by a session.
#[derive(Debug, Clone)]
pub struct CallSite {
    /// Byte offset range of the whole call expression, for in-place rewriting.
    pub byte_range: Range<u32>,
    /// De-quoted string-literal arguments, in argument order.
    pub fragments: Vec<String>,
    /// Explicit locale tag, when the last argument named a recognized locale.
    pub locale: Option<String>,
    /// Source span of the call expression.
    pub location: Location,
}

impl CallSite {
    /// The canonical text of this call site: all fragments concatenated.
    pub fn text(&self) -> String {
        return self.fragments.concat();
    }
}

/// A 32-bit integer identity for a text fragment.
/// Content-addressed: derived from the fragment text alone, so the same
/// string at two call sites shares one fingerprint. Uniqueness is scoped
/// to a single source file's catalog, never global.
/// Newtype prevents mixing with assigned indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(
    /// The non-negative folded hash value.
    pub i32,
);

impl std::fmt::Display for Fingerprint {
    /// Render as the decimal string used as the catalog map key.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "{}", self.0);
    }
}

/// A source span. Lines are 1-based, columns 0-based.
/// Invariant: `(start_line, start_column) <= (end_line, end_column)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct Location {
    /// Column where the span ends (exclusive).
    pub end_column: u32,
    /// Line where the span ends.
    pub end_line: u32,
    /// Column where the span starts.
    pub start_column: u32,
    /// Line where the span starts.
    pub start_line: u32,
}

impl Location {
    /// Render the canonical short form used in exports and diagnostics.
    ///
    /// Single-line spans render as `line[start:end]`, multi-line spans as
    /// `startLine[startCol]-endLine[endCol]`.
    pub fn display(&self) -> String {
        if self.start_line == self.end_line {
            return format!("{}[{}:{}]", self.start_line, self.start_column, self.end_column);
        }
        return format!(
            "{}[{}]-{}[{}]",
            self.start_line, self.start_column, self.end_line, self.end_column,
        );
    }
}

impl From<[u32; 4]> for Location {
    /// Build from the persisted `[startLine, startCol, endLine, endCol]` tuple.
    fn from(v: [u32; 4]) -> Self {
        return Self {
            end_column: v[3],
            end_line: v[2],
            start_column: v[1],
            start_line: v[0],
        };
    }
}

impl From<Location> for [u32; 4] {
    /// Flatten to the persisted `[startLine, startCol, endLine, endCol]` tuple.
    fn from(loc: Location) -> Self {
        return [loc.start_line, loc.start_column, loc.end_line, loc.end_column];
    }
}
