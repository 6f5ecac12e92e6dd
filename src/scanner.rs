use std::path::{Path, PathBuf};

use tree_sitter::{Node, Parser, Tree};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;
use crate::grammar;
use crate::types::{CallSite, Location};

/// Result of scanning one source file that imports the localization module.
pub struct ScannedSource {
    /// Accepted call sites in source scan order.
    pub call_sites: Vec<CallSite>,
    /// Local binding name of the module's default import.
    pub local_name: String,
}

/// Collect the relative paths of all scannable source files under `root`,
/// applying the config's include/exclude filters. Sorted walk order keeps
/// runs deterministic.
pub fn collect_sources(root: &Path, config: &Config) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && grammar::is_supported(e.path()))
    {
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        if !config.should_scan(&relative.to_string_lossy()) {
            continue;
        }
        sources.push(relative);
    }
    sources
}

/// Parse one source file and discover localization call sites.
///
/// Returns `None` when the file does not default-import the configured
/// module — without that import there is no localization function to find,
/// so the file is skipped entirely.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown extensions or
/// `Error::ParseFailed` if tree-sitter cannot parse the source.
pub fn scan_file(
    file_path: &Path,
    source: &str,
    config: &Config,
) -> Result<Option<ScannedSource>, Error> {
    let language = grammar::language_for_path(file_path)?;
    let tree = parse_source(file_path, source, &language)?;

    let Some(local_name) = find_default_import_local(tree.root_node(), source, &config.module)
    else {
        return Ok(None);
    };

    let mut call_sites = Vec::new();
    collect_calls(tree.root_node(), source, &local_name, config, &mut call_sites);

    Ok(Some(ScannedSource {
        call_sites,
        local_name,
    }))
}

/// Parse source into a tree-sitter tree.
///
/// # Errors
///
/// Returns `Error::ParseFailed` if the language cannot be set or parsing fails.
fn parse_source(
    file_path: &Path,
    source: &str,
    language: &tree_sitter::Language,
) -> Result<Tree, Error> {
    let mut parser = Parser::new();
    parser.set_language(language).map_err(|e| Error::ParseFailed {
        file: file_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parser.parse(source, None).ok_or_else(|| Error::ParseFailed {
        file: file_path.to_path_buf(),
        reason: "tree-sitter returned None".to_string(),
    })
}

/// Depth-first pre-order walk collecting matching call expressions,
/// which yields call sites in source scan order.
fn collect_calls(
    node: Node<'_>,
    source: &str,
    fn_name: &str,
    config: &Config,
    out: &mut Vec<CallSite>,
) {
    if node.kind() == "call_expression"
        && let Some(site) = parse_call(node, source, fn_name, config)
    {
        out.push(site);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_calls(child, source, fn_name, config, out);
    }
}

/// Find the local binding of the configured module's default import.
/// Matches the import specifier by basename with any JS/TS extension
/// stripped, so `"./lib/langutils.js"` matches module `langutils`.
fn find_default_import_local(root: Node<'_>, source: &str, module: &str) -> Option<String> {
    let mut cursor = root.walk();
    for node in root.named_children(&mut cursor) {
        if node.kind() != "import_statement" {
            continue;
        }
        let Some(src) = node.child_by_field_name("source") else {
            continue;
        };
        let Some(specifier) = string_content(src, source) else {
            continue;
        };
        if module_basename(&specifier) != module {
            continue;
        }

        // The default import is a bare identifier directly under the clause.
        let mut clause_cursor = node.walk();
        for child in node.named_children(&mut clause_cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut spec_cursor = child.walk();
            for spec in child.named_children(&mut spec_cursor) {
                if spec.kind() == "identifier" {
                    return spec.utf8_text(source.as_bytes()).ok().map(str::to_string);
                }
            }
        }
    }
    None
}

/// The source span of a node, 1-based lines and 0-based columns.
fn location_of(node: Node<'_>) -> Location {
    let start = node.start_position();
    let end = node.end_position();
    Location {
        end_column: u32::try_from(end.column).unwrap_or(u32::MAX),
        end_line: u32::try_from(end.row).unwrap_or(u32::MAX).saturating_add(1),
        start_column: u32::try_from(start.column).unwrap_or(u32::MAX),
        start_line: u32::try_from(start.row).unwrap_or(u32::MAX).saturating_add(1),
    }
}

/// Strip the path and any JS/TS extension from an import specifier.
fn module_basename(specifier: &str) -> &str {
    let base = specifier.rsplit('/').next().unwrap_or(specifier);
    for ext in [".js", ".mjs", ".jsx", ".ts", ".tsx"] {
        if let Some(stripped) = base.strip_suffix(ext) {
            return stripped;
        }
    }
    base
}

/// Try to turn one call expression into an accepted call site.
///
/// Only string-literal arguments count as fragments; a call with none
/// (including zero-argument calls and already-rewritten numeric calls) is
/// silently ignored. When the call has more than one argument and the last
/// is a string naming a recognized locale, it becomes the explicit locale
/// instead of a fragment; unrecognized tags stay fragments.
fn parse_call(
    node: Node<'_>,
    source: &str,
    fn_name: &str,
    config: &Config,
) -> Option<CallSite> {
    let callee = node.child_by_field_name("function")?;
    if callee.kind() != "identifier" || callee.utf8_text(source.as_bytes()).ok()? != fn_name {
        return None;
    }

    let args = node.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let arg_nodes: Vec<Node<'_>> = args
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    if arg_nodes.is_empty() {
        return None;
    }

    let mut locale = None;
    let mut fragment_count = arg_nodes.len();
    if arg_nodes.len() > 1
        && let Some(last) = arg_nodes.last()
        && last.kind() == "string"
        && let Some(tag) = string_content(*last, source)
        && config.is_locale(&tag)
    {
        locale = Some(tag);
        fragment_count = fragment_count.saturating_sub(1);
    }

    let fragments: Vec<String> = arg_nodes
        .iter()
        .take(fragment_count)
        .filter(|n| n.kind() == "string")
        .filter_map(|n| string_content(*n, source))
        .collect();
    if fragments.is_empty() {
        return None;
    }

    Some(CallSite {
        byte_range: u32::try_from(node.start_byte()).unwrap_or(u32::MAX)
            ..u32::try_from(node.end_byte()).unwrap_or(u32::MAX),
        fragments,
        locale,
        location: location_of(node),
    })
}

/// De-quoted raw text of a string-literal node. Escape sequences are kept
/// as written in the source.
fn string_content(node: Node<'_>, source: &str) -> Option<String> {
    let raw = node.utf8_text(source.as_bytes()).ok()?;
    let mut chars = raw.chars();
    let first = chars.next()?;
    if matches!(first, '"' | '\'' | '`') && raw.len() >= 2 && raw.ends_with(first) {
        return raw.get(1..raw.len().saturating_sub(1)).map(str::to_string);
    }
    Some(raw.to_string())
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn default_config() -> Config {
        let dir = tempfile::tempdir().unwrap();
        Config::load(dir.path()).unwrap()
    }

    fn scan_snippet(source: &str) -> Option<ScannedSource> {
        scan_file(Path::new("app/greet.js"), source, &default_config()).unwrap()
    }

    #[test]
    fn file_without_the_import_is_skipped() {
        let scanned = scan_snippet("const t = (s) => s;\nt(\"Hello\");\n");
        assert!(scanned.is_none());
    }

    #[test]
    fn default_import_alias_is_honored() {
        let scanned = scan_snippet(
            "import translate from \"./lib/langutils.js\";\ntranslate(\"Hello\");\n",
        )
        .unwrap();
        assert_eq!(scanned.local_name, "translate");
        assert_eq!(scanned.call_sites.len(), 1);
        assert_eq!(scanned.call_sites[0].text(), "Hello");
    }

    #[test]
    fn fragments_concatenate_and_locale_splits_off() {
        let scanned = scan_snippet(
            "import t from \"../langutils\";\nt(\"Good\", \" morning\", \"zh_CN\");\n",
        )
        .unwrap();
        let site = &scanned.call_sites[0];
        assert_eq!(site.text(), "Good morning");
        assert_eq!(site.locale.as_deref(), Some("zh_CN"));
    }

    #[test]
    fn unrecognized_locale_tag_stays_a_fragment() {
        let scanned =
            scan_snippet("import t from \"./langutils\";\nt(\"Hi\", \"fr_FR\");\n").unwrap();
        let site = &scanned.call_sites[0];
        assert_eq!(site.text(), "Hifr_FR");
        assert!(site.locale.is_none());
    }

    #[test]
    fn invalid_and_rewritten_calls_are_ignored() {
        let scanned = scan_snippet(
            "import t from \"./langutils\";\nt();\nt(9001001);\nt(9001002, \"zh_CN\");\n",
        )
        .unwrap();
        assert!(scanned.call_sites.is_empty());
    }

    #[test]
    fn call_sites_arrive_in_source_order_with_spans() {
        let scanned = scan_snippet(
            "import t from \"./langutils\";\nt(\"first\");\nconsole.log(t(\"second\"));\n",
        )
        .unwrap();
        assert_eq!(scanned.call_sites.len(), 2);
        assert_eq!(scanned.call_sites[0].text(), "first");
        assert_eq!(scanned.call_sites[0].location.start_line, 2);
        assert_eq!(scanned.call_sites[1].text(), "second");
        assert_eq!(scanned.call_sites[1].location.start_line, 3);
    }

    #[test]
    fn other_functions_with_string_arguments_are_not_extracted() {
        let scanned = scan_snippet(
            "import t from \"./langutils\";\nconsole.log(\"plain\");\nt(\"kept\");\n",
        )
        .unwrap();
        assert_eq!(scanned.call_sites.len(), 1);
        assert_eq!(scanned.call_sites[0].text(), "kept");
    }
}
