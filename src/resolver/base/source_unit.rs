// SourceUnit - a parsed TypeScript/JavaScript file
//
// Owns the text and the tree-sitter tree so nodes borrowed from it can be
// handed around the resolver without re-reading or re-parsing the file.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser, Point, Tree};

use super::types::Position;
use crate::error::ResolveError;
use crate::language::{detect_language, get_tree_sitter_language};
use crate::utils::file_utils::read_file_content_with_retry;

pub struct SourceUnit {
    path: PathBuf,
    language: &'static str,
    content: String,
    tree: Tree,
}

impl std::fmt::Debug for SourceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceUnit")
            .field("path", &self.path)
            .field("language", &self.language)
            .finish()
    }
}

impl SourceUnit {
    /// Parse in-memory content, choosing the grammar from the path's extension
    pub fn parse(path: impl AsRef<Path>, content: impl Into<String>) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let language = detect_language(path)
            .ok_or_else(|| ResolveError::UnsupportedFile(path.to_path_buf()))?;
        Self::parse_with_language(path, language, content)
    }

    pub fn parse_with_language(
        path: impl AsRef<Path>,
        language: &'static str,
        content: impl Into<String>,
    ) -> Result<Self, ResolveError> {
        let path = canonical_or_original(path.as_ref());
        let content = content.into();

        let grammar = get_tree_sitter_language(language)?;
        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|source| ResolveError::Language {
                language: language.to_string(),
                source,
            })?;

        let tree = parser
            .parse(&content, None)
            .ok_or_else(|| ResolveError::Parse(path.clone()))?;

        // Partial trees are still useful: unaffected declarations resolve normally
        if tree.root_node().has_error() {
            debug!("Syntax errors in '{}', continuing with partial tree", path.display());
        }

        Ok(Self {
            path,
            language,
            content,
            tree,
        })
    }

    /// Read and parse a file, retrying the read once after `retry_delay`
    pub fn open(path: impl AsRef<Path>, retry_delay: Duration) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let content =
            read_file_content_with_retry(path, retry_delay).map_err(|source| ResolveError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(path, content)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> &'static str {
        self.language
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by a node; empty if the node lies outside the content
    pub fn node_text<'a>(&'a self, node: &Node) -> &'a str {
        self.content
            .get(node.start_byte()..node.end_byte())
            .unwrap_or_default()
    }

    pub fn position_of(&self, node: &Node) -> Position {
        node.start_position().into()
    }

    /// Smallest named node covering `position`
    pub fn node_at(&self, position: Position) -> Option<Node<'_>> {
        let point: Point = position.into();
        self.root().named_descendant_for_point_range(point, point)
    }

    /// Column just past the last character of a line (in bytes)
    pub fn line_end_column(&self, line: usize) -> usize {
        self.content
            .lines()
            .nth(line)
            .map(|text| text.trim_end_matches('\r').len())
            .unwrap_or(0)
    }
}

fn canonical_or_original(path: &Path) -> PathBuf {
    match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(e) => {
            if path.is_absolute() {
                warn!(
                    "Failed to canonicalize path '{}': {} - using original",
                    path.display(),
                    e
                );
            }
            path.to_path_buf()
        }
    }
}
