//! Core CLI commands for phrasebook: extract, status, export.

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::encoder;
use crate::error::Error;
use crate::exporter::{self, CallRow, ExportFormat};
use crate::hasher;
use crate::scanner;
use crate::session::Session;

/// Scan the source tree, rewrite accepted calls in place, and update the
/// per-file catalogs. With `dry_run`, nothing is written — the run only
/// reports what extraction would do.
///
/// Catalog commits and shared exports are bookkeeping side channels:
/// failures there are reported and skipped, never allowed to abort the
/// run, since replacement generation has already completed independently.
///
/// # Errors
///
/// Returns errors from config loading, file reading, or source parsing.
pub fn extract(dry_run: bool) -> Result<(), Error> {
    let root = PathBuf::from(".");
    let config = Config::load(&root)?;
    let scan_root = root.join(&config.source_root);
    let sources = scanner::collect_sources(&scan_root, &config);

    let mut file_count = 0_usize;
    let mut call_count = 0_usize;

    for relative in &sources {
        let disk_path = scan_root.join(relative);
        let source_text = std::fs::read_to_string(&disk_path)
            .map_err(|_err| return Error::FileNotFound { path: disk_path.clone() })?;
        let label = catalog_label(relative);

        let mut session = Session::begin(&config.export_dir, &label);
        let mut edits: Vec<(Range<u32>, String)> = Vec::new();
        let mut rows: Vec<CallRow> = Vec::new();

        if let Some(scanned) = scanner::scan_file(&disk_path, &source_text, &config)? {
            for site in &scanned.call_sites {
                let text = site.text();
                let (index, _) = session.observe(&text, site.locale.as_deref(), site.location);
                let reference = session.global_index(index);
                edits.push((
                    site.byte_range.clone(),
                    encoder::replacement(&scanned.local_name, reference, site.locale.as_deref()),
                ));
                rows.push(CallRow {
                    fingerprint: hasher::fingerprint(&text),
                    global_index: reference,
                    locale: site.locale.clone(),
                    location: site.location,
                    text,
                });
            }
        }

        call_count = call_count.saturating_add(edits.len());
        if !edits.is_empty() {
            file_count = file_count.saturating_add(1);
        }

        if dry_run {
            continue;
        }

        if !edits.is_empty() {
            rewrite_file(&disk_path, &source_text, edits)?;
        }

        if let Err(e) = session.commit() {
            eprintln!("warn: catalog not updated for {label}: {e}");
        }

        if let Some(dest) = &config.export_file
            && !rows.is_empty()
        {
            let dest = root.join(dest);
            let format = ExportFormat::from_path(&dest).unwrap_or(config.format);
            if let Err(e) = exporter::append_shared(&dest, format, &label, &rows) {
                eprintln!("warn: export skipped for {label}: {e}");
            }
        }
    }

    if dry_run {
        eprintln!("dry run: would extract {call_count} calls from {file_count} files");
    } else {
        eprintln!("Extracted {call_count} calls from {file_count} files");
    }
    return Ok(());
}

/// Regenerate per-file exports from the persisted catalogs. No source
/// rescan and no rewriting — the catalogs are the source of truth here.
///
/// # Errors
///
/// Returns errors from config loading, format parsing, or export writing.
pub fn export(format_flag: Option<&str>) -> Result<(), Error> {
    let config = Config::load(Path::new("."))?;
    let format = match format_flag {
        None => config.format,
        Some(name) => ExportFormat::parse(name)?,
    };

    let catalogs = load_all_catalogs(&config.export_dir);
    for catalog in &catalogs {
        let content = match format {
            ExportFormat::Csv => exporter::render_csv(catalog),
            ExportFormat::Json => exporter::render_json(catalog)?,
            ExportFormat::Markdown => exporter::render_markdown(catalog),
        };
        exporter::write_per_file(&config.export_dir, &catalog.source, format, &content)?;
    }

    let count = catalogs.len();
    let ext = format.extension();
    eprintln!("Exported {count} catalogs as .{ext}");
    return Ok(());
}

/// List every persisted catalog under the export root with its counters.
/// Always exits 0; malformed catalog files are simply not listed.
///
/// # Errors
///
/// Returns errors from config loading.
pub fn status() -> Result<(), Error> {
    let config = Config::load(Path::new("."))?;
    let catalogs = load_all_catalogs(&config.export_dir);

    if catalogs.is_empty() {
        println!("No catalogs under {}", config.export_dir.display());
        return Ok(());
    }

    for catalog in &catalogs {
        println!(
            "{}  {} strings  callIndex={}  hashPrefix={}",
            catalog.source,
            catalog.text.len(),
            catalog.call_index,
            catalog.hash_prefix,
        );
    }
    return Ok(());
}

/// Catalog-relative label for a source file: components joined with `/`
/// regardless of platform, so the hash prefix is stable across machines.
fn catalog_label(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .iter()
        .map(|c| return c.to_string_lossy().into_owned())
        .collect();
    return parts.join("/");
}

/// Load every parseable catalog under the export root, sorted by source
/// path for deterministic output.
fn load_all_catalogs(export_dir: &Path) -> Vec<Catalog> {
    let mut catalogs: Vec<Catalog> = walkdir::WalkDir::new(export_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.path().extension().is_some_and(|ext| return ext == "json"))
        .filter_map(|e| return Catalog::load(e.path()))
        .collect();
    catalogs.sort_by(|a, b| return a.source.cmp(&b.source));
    return catalogs;
}

/// Splice replacement text over each call's byte range, last edit first so
/// earlier offsets stay valid, then write the file back.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be written.
fn rewrite_file(
    path: &Path,
    source: &str,
    mut edits: Vec<(Range<u32>, String)>,
) -> Result<(), Error> {
    let mut content = source.to_string();
    edits.sort_by_key(|(range, _)| return std::cmp::Reverse(range.start));

    for (range, replacement) in edits {
        let start = usize::try_from(range.start).unwrap_or(usize::MAX);
        let end = usize::try_from(range.end).unwrap_or(usize::MAX);
        if start <= end && end <= content.len() {
            content.replace_range(start..end, &replacement);
        }
    }

    std::fs::write(path, content)?;
    return Ok(());
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn catalog_label_uses_forward_slashes() {
        let relative: PathBuf = ["app", "views", "greet.js"].iter().collect();
        assert_eq!(catalog_label(&relative), "app/views/greet.js");
    }

    #[test]
    fn rewrite_applies_edits_without_shifting_earlier_spans() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greet.js");
        let source = "a(t(\"Hello\"));\nb(t(\"Bye\"));\n";
        let edits = vec![
            (2_u32..12_u32, "t(42001)".to_string()),
            (17_u32..25_u32, "t(42002)".to_string()),
        ];

        rewrite_file(&path, source, edits).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "a(t(42001));\nb(t(42002));\n"
        );
    }
}
