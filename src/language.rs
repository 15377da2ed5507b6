//! Language Support - Shared tree-sitter language configuration
//!
//! Template resolution only analyzes the TypeScript/JavaScript family. ALL
//! grammar selection goes through this module so that `SourceUnit` and the
//! Python bindings agree on which files are analyzable.

use crate::error::ResolveError;
use std::path::Path;

/// File extensions analyzed by the resolver, in preference order
pub const SUPPORTED_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Get tree-sitter language parser for a given language name
///
/// # Supported Languages
///
/// - `typescript`: `.ts`, `.mts`, `.cts`
/// - `tsx`: `.tsx`
/// - `javascript`: `.js`, `.jsx`, `.mjs`, `.cjs` (the JS grammar handles JSX)
pub fn get_tree_sitter_language(language: &str) -> Result<tree_sitter::Language, ResolveError> {
    match language {
        "typescript" => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        "tsx" => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
        "javascript" => Ok(tree_sitter_javascript::LANGUAGE.into()),
        _ => Err(ResolveError::UnsupportedLanguage(language.to_string())),
    }
}

/// Detect language from file extension
///
/// Returns the language name that can be passed to `get_tree_sitter_language()`.
pub fn detect_language_from_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "ts" | "mts" | "cts" => Some("typescript"),
        "tsx" => Some("tsx"),
        "js" | "jsx" | "mjs" | "cjs" => Some("javascript"),
        _ => None,
    }
}

/// Detect language from a file path (declaration files `.d.ts` are TypeScript)
pub fn detect_language(path: &Path) -> Option<&'static str> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(detect_language_from_extension)
}
