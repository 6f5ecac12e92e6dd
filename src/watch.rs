//! File watcher: runs extract on startup, then re-runs on source changes.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands;
use crate::config;
use crate::error;
use crate::scanner;

/// Debounce delay between filesystem events and re-extraction.
const DEBOUNCE_MS: u64 = 100;

/// Parent directories of every scannable source file, plus the scan root.
fn collect_watch_dirs(
    root: &std::path::Path,
    config: &config::Config,
) -> HashSet<PathBuf> {
    let mut dirs = HashSet::new();
    dirs.insert(root.to_path_buf());
    for relative in scanner::collect_sources(root, config) {
        if let Some(parent) = relative.parent() {
            dirs.insert(root.join(parent));
        }
    }
    return dirs;
}

/// Create a filesystem watcher that sends events on the given channel.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
) -> Result<notify::RecommendedWatcher, error::Error> {
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| {
        return error::Error::Watch {
            reason: format!("watcher setup failed: {e}"),
        };
    });
}

/// Entry point for the watch command.
///
/// Runs an initial extraction, then watches the source directories and
/// re-extracts on changes. Extraction is idempotent — rewritten calls carry
/// no string literal, so a re-run over an already-extracted file is a no-op.
///
/// # Errors
///
/// Returns errors from config loading or watcher setup.
pub fn run() -> Result<(), error::Error> {
    let root = PathBuf::from(".");
    let config = config::Config::load(&root)?;

    eprintln!("watch: initial extraction");
    run_extract();

    let scan_root = root.join(&config.source_root);
    let watch_dirs = collect_watch_dirs(&scan_root, &config);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;

    for dir in &watch_dirs {
        if dir.exists() {
            let _ = watcher.watch(dir, RecursiveMode::NonRecursive);
        }
    }

    let dir_count = watch_dirs.len();
    eprintln!("watch: monitoring {dir_count} directories, press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-extracting...");
        run_extract();
        // Drain events our own rewrites just produced.
        while rx.try_recv().is_ok() {}
    }

    return Ok(());
}

/// Run extract once, reporting failures without stopping the watch loop.
fn run_extract() {
    if let Err(e) = commands::extract(false) {
        eprintln!("error: {e}");
    }
    return;
}
