//! Error types for template resolution
//!
//! Only the outer surfaces (opening files, parsing, loading project configuration)
//! report errors. Everything below the orchestrator absorbs failures and reports
//! an empty literal set instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported source file: '{}'", .0.display())]
    UnsupportedFile(PathBuf),

    #[error("unsupported language: '{0}'. Supported languages: typescript, tsx, javascript")]
    UnsupportedLanguage(String),

    #[error("failed to set parser language for {language}: {source}")]
    Language {
        language: String,
        #[source]
        source: tree_sitter::LanguageError,
    },

    #[error("failed to parse file: {}", .0.display())]
    Parse(PathBuf),

    #[error("malformed project configuration '{}': {source}", path.display())]
    ProjectConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
