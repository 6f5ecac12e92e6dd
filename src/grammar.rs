/// Tree-sitter grammar resolution by file extension.
use std::path::Path;

use tree_sitter::Language;

use crate::error::Error;

/// Whether a path has an extension the scanner can parse.
pub fn is_supported(path: &Path) -> bool {
    return language_for_path(path).is_ok();
}

/// Map a file extension to its tree-sitter language.
/// Plain JavaScript parses fine under the TypeScript grammar.
///
/// # Errors
///
/// Returns `Error::UnsupportedLanguage` for unknown extensions.
pub fn language_for_path(path: &Path) -> Result<Language, Error> {
    let ext = path.extension().and_then(|e| return e.to_str()).unwrap_or("");

    return match ext {
        "js" | "mjs" | "ts" => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "jsx" | "tsx" => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
        _ => Err(Error::UnsupportedLanguage {
            ext: ext.to_string(),
        }),
    };
}
