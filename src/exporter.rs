//! Catalog export backends: tabular CSV, markdown tables, and JSON.
//!
//! Two granularities exist. Per-source-file exports mirror the source tree
//! under the export root and fully replace their destination. The legacy
//! shared destination appends one block of per-call-site rows per processed
//! file instead, so a whole tree accumulates into a single file.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, Occurrence};
use crate::error::Error;
use crate::types::{Fingerprint, Location};

/// Selectable export backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Machine-parseable comma-separated rows.
    Csv,
    /// The catalog interchange document itself.
    Json,
    /// Human-readable pipe table.
    Markdown,
}

impl ExportFormat {
    /// File extension written for this backend.
    pub const fn extension(self) -> &'static str {
        return match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        };
    }

    /// Pick a backend from a destination file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(|e| return e.to_str())?;
        return Self::parse(ext).ok();
    }

    /// Parse a configured format name.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidFormat` for anything but csv, md/markdown, or json.
    pub fn parse(name: &str) -> Result<Self, Error> {
        return match name {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(Error::InvalidFormat {
                name: other.to_string(),
            }),
        };
    }
}

/// One accepted call site, flattened for the shared-append export path.
#[derive(Debug, Clone)]
pub struct CallRow {
    /// Content fingerprint of the call's text.
    pub fingerprint: Fingerprint,
    /// Prefixed reference number written into the replacement call.
    pub global_index: i64,
    /// Explicit locale tag, absent for the default locale.
    pub locale: Option<String>,
    /// Span of the original call expression.
    pub location: Location,
    /// Concatenated literal text.
    pub text: String,
}

/// Append one file's rows to the shared destination, creating it (and its
/// parents) on first use. CSV gets a header row only when the file is new.
///
/// # Errors
///
/// Returns `Error::Io` on filesystem failures or `Error::Json` when a row
/// cannot be serialized.
pub fn append_shared(
    dest: &Path,
    format: ExportFormat,
    source: &str,
    rows: &[CallRow],
) -> Result<(), Error> {
    if rows.is_empty() {
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let is_fresh = std::fs::metadata(dest).map(|m| return m.len() == 0).unwrap_or(true);
    let block = match format {
        ExportFormat::Csv => render_shared_csv(source, rows, is_fresh),
        ExportFormat::Json => render_shared_json(source, rows)?,
        ExportFormat::Markdown => render_shared_markdown(source, rows),
    };

    let mut file = std::fs::OpenOptions::new().append(true).create(true).open(dest)?;
    file.write_all(block.as_bytes())?;
    return Ok(());
}

/// Render a whole catalog as CSV, one row per occurrence in index order.
pub fn render_csv(catalog: &Catalog) -> String {
    let mut out = String::from("location,fingerprint,index,locale,text\n");
    for (fingerprint, occurrence) in ordered_entries(catalog) {
        let locations = join_locations(&occurrence.locations);
        out.push_str(&csv_field(&locations));
        out.push(',');
        out.push_str(&fingerprint);
        out.push(',');
        out.push_str(&occurrence.index.to_string());
        out.push(',');
        out.push_str(occurrence.locale.as_deref().unwrap_or("default"));
        out.push(',');
        out.push_str(&csv_field(&occurrence.text));
        out.push('\n');
    }
    return out;
}

/// Render a whole catalog as the JSON interchange document.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
pub fn render_json(catalog: &Catalog) -> Result<String, Error> {
    return catalog.serialize();
}

/// Render a whole catalog as a markdown table titled with the source path.
pub fn render_markdown(catalog: &Catalog) -> String {
    let mut out = format!("{}\n\n", catalog.source);
    out.push_str("| location | fingerprint | index | locale | text |\n");
    out.push_str("| --- | --- | --- | --- | --- |\n");
    for (fingerprint, occurrence) in ordered_entries(catalog) {
        let locations = join_locations(&occurrence.locations);
        let locale = occurrence.locale.as_deref().unwrap_or("default");
        let text = markdown_field(&occurrence.text);
        let index = occurrence.index;
        out.push_str(&format!(
            "| {locations} | {fingerprint} | {index} | {locale} | {text} |\n"
        ));
    }
    out.push('\n');
    return out;
}

/// Write a per-source-file export mirrored under the export root, fully
/// replacing any previous destination.
///
/// # Errors
///
/// Returns `Error::Io` on filesystem failures.
pub fn write_per_file(
    export_dir: &Path,
    source: &str,
    format: ExportFormat,
    content: &str,
) -> Result<PathBuf, Error> {
    let path = export_dir.join(source).with_extension(format.extension());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, content)?;
    return Ok(path);
}

/// Quote a CSV value when it contains the delimiter, a quote, or
/// whitespace; internal quotes are doubled.
fn csv_field(value: &str) -> String {
    let escaped = value.replace('"', "\"\"");
    if escaped.chars().any(|c| return c == ',' || c == '"' || c.is_whitespace()) {
        return format!("\"{escaped}\"");
    }
    return escaped;
}

/// Join occurrence locations into one display cell, scan order preserved.
fn join_locations(locations: &[Location]) -> String {
    return locations
        .iter()
        .map(Location::display)
        .collect::<Vec<_>>()
        .join("; ");
}

/// Escape pipes so text cannot break the table.
fn markdown_field(value: &str) -> String {
    return value.replace('|', "\\|");
}

/// Catalog entries sorted by assigned index for stable, readable output.
fn ordered_entries(catalog: &Catalog) -> Vec<(String, &Occurrence)> {
    let mut entries: Vec<(String, &Occurrence)> = catalog
        .text
        .iter()
        .map(|(key, occurrence)| return (key.clone(), occurrence))
        .collect();
    entries.sort_by_key(|(_, occurrence)| return occurrence.index);
    return entries;
}

/// Per-call-site CSV rows: source, fingerprint, location, reference, locale, text.
fn render_shared_csv(source: &str, rows: &[CallRow], with_header: bool) -> String {
    let mut out = String::new();
    if with_header {
        out.push_str("source,fingerprint,location,reference,locale,text\n");
    }
    for row in rows {
        out.push_str(&csv_field(source));
        out.push(',');
        out.push_str(&row.fingerprint.to_string());
        out.push(',');
        out.push_str(&csv_field(&row.location.display()));
        out.push(',');
        out.push_str(&row.global_index.to_string());
        out.push(',');
        out.push_str(row.locale.as_deref().unwrap_or("default"));
        out.push(',');
        out.push_str(&csv_field(&row.text));
        out.push('\n');
    }
    return out;
}

/// One JSON record per call site, newline-delimited so appends stay valid.
fn render_shared_json(source: &str, rows: &[CallRow]) -> Result<String, Error> {
    let mut out = String::new();
    for row in rows {
        let record = serde_json::json!({
            "source": source,
            "fingerprint": row.fingerprint.0,
            "location": row.location,
            "reference": row.global_index,
            "locale": row.locale.as_deref().unwrap_or("default"),
            "text": row.text,
        });
        out.push_str(&serde_json::to_string(&record)?);
        out.push('\n');
    }
    return Ok(out);
}

/// A titled markdown block per processed file, appended as a unit.
fn render_shared_markdown(source: &str, rows: &[CallRow]) -> String {
    let mut out = format!("{source}\n\n");
    out.push_str("| location | fingerprint | reference | locale | text |\n");
    out.push_str("| --- | --- | --- | --- | --- |\n");
    for row in rows {
        let location = row.location.display();
        let fingerprint = row.fingerprint;
        let reference = row.global_index;
        let locale = row.locale.as_deref().unwrap_or("default");
        let text = markdown_field(&row.text);
        out.push_str(&format!(
            "| {location} | {fingerprint} | {reference} | {locale} | {text} |\n"
        ));
    }
    out.push('\n');
    return out;
}
