// Base Resolver Types
//
// Data structures shared by the scanner, the extractor and the batch API:
// positions, template parts/sites, literal value sets, results, configuration.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for literal resolution and combination display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum values a single variable contributes to the expansion (K)
    pub max_values_per_variable: usize,
    /// Maximum combinations generated per template site (N)
    pub max_combinations: usize,
    /// Delay before retrying an oracle query that reported "not ready"
    pub oracle_retry_delay_ms: u64,
    /// Delay before retrying a file read that failed
    pub file_retry_delay_ms: u64,
    /// Maximum nesting of declarations resolved for one variable
    pub max_resolution_depth: usize,
    /// Maximum `export ... from` hops followed when locating an export
    pub max_reexport_hops: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_values_per_variable: 10,
            max_combinations: 20,
            oracle_retry_delay_ms: 150,
            file_retry_delay_ms: 50,
            max_resolution_depth: 48,
            max_reexport_hops: 8,
        }
    }
}

impl ResolverConfig {
    /// Load a configuration from JSON; missing fields keep their defaults
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn oracle_retry_delay(&self) -> Duration {
        Duration::from_millis(self.oracle_retry_delay_ms)
    }

    pub fn file_retry_delay(&self) -> Duration {
        Duration::from_millis(self.file_retry_delay_ms)
    }
}

/// Zero-based line and byte column (tree-sitter `Point` convention)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl From<tree_sitter::Point> for Position {
    fn from(point: tree_sitter::Point) -> Self {
        Self {
            line: point.row,
            column: point.column,
        }
    }
}

impl From<Position> for tree_sitter::Point {
    fn from(position: Position) -> Self {
        tree_sitter::Point {
            row: position.line,
            column: position.column,
        }
    }
}

/// A position inside some file, as reported by the symbol oracle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub path: PathBuf,
    pub position: Position,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, position: Position) -> Self {
        Self {
            path: path.into(),
            position,
        }
    }
}

/// One piece of a template literal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplatePart {
    /// Verbatim text between substitutions
    Static { text: String },
    /// An interpolated expression (normalized text) and the position used to query it
    Variable {
        expression: String,
        position: Position,
    },
}

impl TemplatePart {
    pub fn is_variable(&self) -> bool {
        matches!(self, TemplatePart::Variable { .. })
    }
}

/// A template literal with at least one interpolated expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSite {
    pub parts: Vec<TemplatePart>,
    /// Start of the template literal itself
    pub start: Position,
    /// End of the last line of the enclosing statement; where the annotation goes
    pub anchor: Position,
}

impl TemplateSite {
    /// Distinct variable expressions, in first-appearance order
    pub fn variables(&self) -> Vec<(&str, Position)> {
        let mut seen = IndexSet::new();
        let mut variables = Vec::new();
        for part in &self.parts {
            if let TemplatePart::Variable {
                expression,
                position,
            } = part
            {
                if seen.insert(expression.as_str()) {
                    variables.push((expression.as_str(), *position));
                }
            }
        }
        variables
    }
}

/// Ordered, de-duplicated literal strings a declaration can take
///
/// Empty means "could not be resolved"; it is never an error.
#[derive(Debug, Clone, Default, Eq)]
pub struct LiteralValueSet {
    values: IndexSet<String>,
}

impl LiteralValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(value: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.insert(value);
        set
    }

    /// Insert keeping first-insertion order; returns false for duplicates
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        self.values.insert(value.into())
    }

    pub fn extend(&mut self, other: LiteralValueSet) {
        self.values.extend(other.values);
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.values.iter().cloned().collect()
    }
}

// Order is part of the value: ["a","b"] and ["b","a"] are different results
impl PartialEq for LiteralValueSet {
    fn eq(&self, other: &Self) -> bool {
        self.values.iter().eq(other.values.iter())
    }
}

impl<S: Into<String>> FromIterator<S> for LiteralValueSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl IntoIterator for LiteralValueSet {
    type Item = String;
    type IntoIter = indexmap::set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// A template site expanded into display-ready combinations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteResolution {
    pub anchor: Position,
    pub start: Position,
    pub combinations: Vec<String>,
    /// More combinations exist than are listed
    pub truncated: bool,
    pub resolved_variables: usize,
    pub total_variables: usize,
}

impl SiteResolution {
    /// Combinations joined for inline display; an ellipsis marks truncation
    pub fn display_text(&self) -> String {
        let mut text = self.combinations.join(", ");
        if self.truncated {
            text.push_str(", …");
        }
        text
    }
}

/// Display text for one anchor, merged from every site ending on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub anchor: Position,
    pub text: String,
}

/// All resolved sites of one file in a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResolution {
    /// Relative Unix-style path from the workspace root
    pub file_path: String,
    pub sites: Vec<SiteResolution>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_set_keeps_insertion_order_and_dedupes() {
        let mut set = LiteralValueSet::new();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert_eq!(set.to_vec(), vec!["b", "a"]);
        assert_ne!(set, LiteralValueSet::from_iter(["a", "b"]));
        assert_eq!(set, LiteralValueSet::from_iter(["b", "a"]));
    }

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config = ResolverConfig::from_json_str(r#"{ "max_combinations": 5 }"#).unwrap();
        assert_eq!(config.max_combinations, 5);
        assert_eq!(config.max_values_per_variable, 10);
        assert_eq!(config.oracle_retry_delay(), Duration::from_millis(150));
    }

    #[test]
    fn test_site_variables_are_distinct() {
        let site = TemplateSite {
            parts: vec![
                TemplatePart::Variable {
                    expression: "a".into(),
                    position: Position::new(0, 3),
                },
                TemplatePart::Static { text: "-".into() },
                TemplatePart::Variable {
                    expression: "a".into(),
                    position: Position::new(0, 9),
                },
            ],
            start: Position::new(0, 0),
            anchor: Position::new(0, 12),
        };
        assert_eq!(site.variables(), vec![("a", Position::new(0, 3))]);
    }

    #[test]
    fn test_display_text_marks_truncation() {
        let site = SiteResolution {
            anchor: Position::new(1, 10),
            start: Position::new(1, 2),
            combinations: vec!["a.x".into(), "b.x".into()],
            truncated: true,
            resolved_variables: 1,
            total_variables: 1,
        };
        assert_eq!(site.display_text(), "a.x, b.x, …");
    }
}
