/// Crate-level error types for phrasebook diagnostics.
use std::path::PathBuf;

/// All errors in phrasebook carry enough context to produce a useful
/// diagnostic without a debugger. Each variant names the file, format, or
/// reason for failure. Catalog-side defects deliberately never surface
/// here: a corrupt prior catalog degrades to fresh numbering instead of
/// failing the run.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A scanned source file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// An export format name is not one of `csv`, `md`, or `json`.
    #[error("invalid export format: `{name}` (expected csv, md, or json)")]
    InvalidFormat {
        /// The unrecognized format name.
        name: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed while writing a catalog or export.
    #[error("json serialize: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// Tree-sitter failed to parse a source file.
    #[error("parse failed: {}: {reason}", file.display())]
    ParseFailed {
        /// File that failed to parse.
        file: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// TOML deserialization of the config file failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No tree-sitter grammar registered for this file extension.
    #[error("no grammar for extension: .{ext}")]
    UnsupportedLanguage {
        /// File extension without the leading dot.
        ext: String,
    },

    /// The filesystem watcher could not be created or started.
    #[error("watch failed: {reason}")]
    Watch {
        /// Description of the watcher failure.
        reason: String,
    },
}
