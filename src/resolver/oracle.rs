// External Oracle Adapter
//
// Consults an editor-side symbol service (a language server, typically) when
// static analysis cannot see through a reference. Everything it returns is
// treated as untrusted text or as a location to analyze ourselves.

use regex::Regex;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::base::{LiteralValueSet, Location, Position, ResolutionContext, SourceUnit};
use super::typescript::helpers::unquote;
use super::typescript::imports_exports::open_unit;
use super::typescript::{extract_literal_values, Declaration};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The service is still starting or indexing; worth one retry
    #[error("symbol oracle is not ready")]
    NotReady,

    #[error("symbol oracle request failed: {0}")]
    Failed(String),
}

/// Symbol intelligence supplied by the host environment
pub trait SymbolOracle: Send + Sync {
    /// Hover text (usually markdown) for the symbol at `position`
    fn hover_text_at(&self, path: &Path, position: Position) -> Result<Option<String>, OracleError>;

    fn definition_locations_at(
        &self,
        path: &Path,
        position: Position,
    ) -> Result<Vec<Location>, OracleError>;

    fn type_definition_locations_at(
        &self,
        path: &Path,
        position: Position,
    ) -> Result<Vec<Location>, OracleError>;
}

/// A complete `: "a" | "b"` / `= "a" | "b"` tail made only of quoted literals
static LITERAL_UNION_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[:=])\s*((?:"[^"\n]*"|'[^'\n]*')(?:\s*\|\s*(?:"[^"\n]*"|'[^'\n]*'))*)\s*;?\s*$"#,
    )
    .expect("literal union pattern is valid")
});

static QUOTED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"\n]*"|'[^'\n]*'"#).expect("quoted literal pattern is valid"));

/// Literal values spelled out in hover text
///
/// Only the signature is read: the lines inside markdown code fences, or the
/// first line when there are none. Documentation after a `---` rule is never
/// read. Each line is matched on its own; any other shape yields nothing.
pub fn parse_hover_literals(hover: &str) -> LiteralValueSet {
    let mut values = LiteralValueSet::new();
    for line in signature_lines(hover) {
        let Some(captures) = LITERAL_UNION_TAIL.captures(line) else {
            continue;
        };
        for literal in QUOTED_LITERAL.find_iter(&captures[1]) {
            if let Some(value) = unquote(literal.as_str()) {
                values.insert(value);
            }
        }
    }
    values
}

fn signature_lines(hover: &str) -> Vec<&str> {
    let lines = hover
        .lines()
        .map(str::trim)
        .take_while(|line| *line != "---");
    if !hover.contains("```") {
        return lines.filter(|line| !line.is_empty()).take(1).collect();
    }

    let mut fenced = false;
    let mut signature = Vec::new();
    for line in lines {
        if line.starts_with("```") {
            fenced = !fenced;
        } else if fenced && !line.is_empty() {
            signature.push(line);
        }
    }
    signature
}

#[derive(Clone)]
pub struct OracleAdapter {
    oracle: Arc<dyn SymbolOracle>,
    retry_delay: Duration,
}

impl std::fmt::Debug for OracleAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleAdapter")
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

impl OracleAdapter {
    pub fn new(oracle: Arc<dyn SymbolOracle>, retry_delay: Duration) -> Self {
        Self {
            oracle,
            retry_delay,
        }
    }

    /// Literal values of the symbol at `position` in `unit`
    ///
    /// Hover text first, then type definitions, then definitions. A failing
    /// query does not stop the later ones; the error is returned only when
    /// every query failed.
    pub fn resolve(
        &self,
        unit: &SourceUnit,
        position: Position,
        ctx: &mut ResolutionContext,
    ) -> Result<LiteralValueSet, OracleError> {
        let path = unit.path();
        let mut last_error = None;
        let mut any_answer = false;

        match self.query(|| self.oracle.hover_text_at(path, position)) {
            Ok(hover) => {
                any_answer = true;
                let values = hover.as_deref().map(parse_hover_literals).unwrap_or_default();
                if !values.is_empty() {
                    debug!("Oracle hover resolved {} values", values.len());
                    return Ok(values);
                }
            }
            Err(e) => {
                debug!("Oracle hover failed: {}", e);
                last_error = Some(e);
            }
        }

        let lookups: [(&str, &dyn Fn() -> Result<Vec<Location>, OracleError>); 2] = [
            ("type definition", &|| {
                self.oracle.type_definition_locations_at(path, position)
            }),
            ("definition", &|| self.oracle.definition_locations_at(path, position)),
        ];
        for (label, lookup) in lookups {
            match self.query(lookup) {
                Ok(locations) => {
                    any_answer = true;
                    let values = self.values_at_locations(unit, &locations, ctx);
                    if !values.is_empty() {
                        debug!("Oracle {} resolved {} values", label, values.len());
                        return Ok(values);
                    }
                }
                Err(e) => {
                    debug!("Oracle {} lookup failed: {}", label, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_answer => Err(e),
            _ => Ok(LiteralValueSet::new()),
        }
    }

    /// Run a query, retrying once after the configured delay on `NotReady`
    fn query<T>(&self, call: impl Fn() -> Result<T, OracleError>) -> Result<T, OracleError> {
        match call() {
            Err(OracleError::NotReady) => {
                debug!("Oracle not ready, retrying in {:?}", self.retry_delay);
                thread::sleep(self.retry_delay);
                call()
            }
            result => result,
        }
    }

    fn values_at_locations(
        &self,
        unit: &SourceUnit,
        locations: &[Location],
        ctx: &mut ResolutionContext,
    ) -> LiteralValueSet {
        for location in locations {
            let opened;
            let target = if is_same_file(unit, &location.path) {
                unit
            } else {
                match open_unit(&location.path, ctx) {
                    Some(other) => {
                        opened = other;
                        &opened
                    }
                    None => continue,
                }
            };

            let Some(declaration) = target
                .node_at(location.position)
                .and_then(Declaration::enclosing)
            else {
                debug!(
                    "No declaration at {}:{}:{}",
                    location.path.display(),
                    location.position.line,
                    location.position.column
                );
                continue;
            };

            let values = extract_literal_values(target, declaration, ctx);
            if !values.is_empty() {
                return values;
            }
        }
        LiteralValueSet::new()
    }
}

fn is_same_file(unit: &SourceUnit, path: &Path) -> bool {
    path == unit.path() || path.canonicalize().is_ok_and(|canonical| canonical == unit.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::base::ResolverConfig;
    use crate::resolver::module_path::ModuleResolver;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Scripted oracle: fixed answers, optional leading `NotReady` replies
    #[derive(Default)]
    struct ScriptedOracle {
        hover: Option<String>,
        definitions: Vec<Location>,
        type_definitions: Vec<Location>,
        not_ready_replies: usize,
        calls: AtomicUsize,
    }

    impl ScriptedOracle {
        fn answer<T>(&self, value: T) -> Result<T, OracleError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.not_ready_replies {
                Err(OracleError::NotReady)
            } else {
                Ok(value)
            }
        }
    }

    impl SymbolOracle for ScriptedOracle {
        fn hover_text_at(&self, _: &Path, _: Position) -> Result<Option<String>, OracleError> {
            self.answer(self.hover.clone())
        }

        fn definition_locations_at(&self, _: &Path, _: Position) -> Result<Vec<Location>, OracleError> {
            self.answer(self.definitions.clone())
        }

        fn type_definition_locations_at(
            &self,
            _: &Path,
            _: Position,
        ) -> Result<Vec<Location>, OracleError> {
            self.answer(self.type_definitions.clone())
        }
    }

    struct FailingOracle;

    impl SymbolOracle for FailingOracle {
        fn hover_text_at(&self, _: &Path, _: Position) -> Result<Option<String>, OracleError> {
            Err(OracleError::Failed("no server".to_string()))
        }

        fn definition_locations_at(&self, _: &Path, _: Position) -> Result<Vec<Location>, OracleError> {
            Err(OracleError::Failed("no server".to_string()))
        }

        fn type_definition_locations_at(
            &self,
            _: &Path,
            _: Position,
        ) -> Result<Vec<Location>, OracleError> {
            Err(OracleError::NotReady)
        }
    }

    fn context() -> ResolutionContext {
        ResolutionContext::new(
            Arc::new(ResolverConfig::default()),
            Arc::new(ModuleResolver::relative_only()),
        )
    }

    fn adapter(oracle: impl SymbolOracle + 'static) -> OracleAdapter {
        OracleAdapter::new(Arc::new(oracle), Duration::from_millis(1))
    }

    #[test]
    fn test_parse_hover_literals() {
        let hover = "```typescript\n(property) kind: \"open\" | 'close'\n```";
        assert_eq!(parse_hover_literals(hover).to_vec(), vec!["open", "close"]);

        let alias = "```ts\ntype Mode = \"tcp\" | \"udp\";\n```";
        assert_eq!(parse_hover_literals(alias).to_vec(), vec!["tcp", "udp"]);

        let pipe_inside = "const sep: \"a|b\"";
        assert_eq!(parse_hover_literals(pipe_inside).to_vec(), vec!["a|b"]);

        assert!(parse_hover_literals("(property) kind: Mode").is_empty());
        assert!(parse_hover_literals("let x: \"a\" | string").is_empty());
        assert!(parse_hover_literals("").is_empty());
    }

    #[test]
    fn test_hover_documentation_is_not_read() {
        let documented = "```typescript\nlet level: string\n```\n---\nLog level. Default: 'info'";
        assert!(parse_hover_literals(documented).is_empty());

        let prose_after_fence = "```ts\n(property) kind: \"open\" | \"close\"\n```\nSee also: \"legacy\"";
        assert_eq!(parse_hover_literals(prose_after_fence).to_vec(), vec!["open", "close"]);

        let plain = "(property) kind: \"open\" | \"close\"\n\nSee also: \"legacy\"";
        assert_eq!(parse_hover_literals(plain).to_vec(), vec!["open", "close"]);

        let ruled = "const mode: string\n---\nOne of: 'a'";
        assert!(parse_hover_literals(ruled).is_empty());
    }

    #[test]
    fn test_hover_answer_short_circuits() {
        let unit = SourceUnit::parse("mem/hover.ts", "const x = y;").unwrap();
        let oracle = adapter(ScriptedOracle {
            hover: Some("const y: \"on\" | \"off\"".to_string()),
            ..Default::default()
        });
        let values = oracle.resolve(&unit, Position::new(0, 10), &mut context()).unwrap();
        assert_eq!(values.to_vec(), vec!["on", "off"]);
    }

    #[test]
    fn test_not_ready_is_retried_once() {
        let unit = SourceUnit::parse("mem/retry.ts", "const x = y;").unwrap();
        let scripted = Arc::new(ScriptedOracle {
            hover: Some("const y: \"ready\"".to_string()),
            not_ready_replies: 1,
            ..Default::default()
        });
        let oracle = OracleAdapter::new(scripted.clone(), Duration::from_millis(1));
        let values = oracle.resolve(&unit, Position::new(0, 10), &mut context()).unwrap();
        assert_eq!(values.to_vec(), vec!["ready"]);
        assert_eq!(scripted.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_all_queries_failing_is_an_error() {
        let unit = SourceUnit::parse("mem/fail.ts", "const x = y;").unwrap();
        let result = adapter(FailingOracle).resolve(&unit, Position::new(0, 10), &mut context());
        assert_eq!(result, Err(OracleError::Failed("no server".to_string())));
    }

    #[test]
    fn test_definition_in_same_unit_is_extracted() {
        let content = "interface Msg {\n  kind: 'a' | 'b';\n}\nconst k = msg.kind;\n";
        let unit = SourceUnit::parse("mem/same.ts", content).unwrap();
        let oracle = adapter(ScriptedOracle {
            definitions: vec![Location::new(unit.path(), Position::new(1, 2))],
            ..Default::default()
        });
        let values = oracle.resolve(&unit, Position::new(3, 14), &mut context()).unwrap();
        assert_eq!(values.to_vec(), vec!["a", "b"]);
    }

    #[test]
    fn test_type_definition_in_other_file_is_opened() {
        let temp_dir = TempDir::new().unwrap();
        let types = temp_dir.path().join("types.ts");
        fs::write(&types, "export enum Venue { Lse = 'LSE', Nyse = 'NYSE' }\n").unwrap();

        let unit = SourceUnit::parse(PathBuf::from("mem/main.ts"), "let v = venue;").unwrap();
        let oracle = adapter(ScriptedOracle {
            type_definitions: vec![Location::new(&types, Position::new(0, 12))],
            ..Default::default()
        });
        let values = oracle.resolve(&unit, Position::new(0, 8), &mut context()).unwrap();
        assert_eq!(values.to_vec(), vec!["LSE", "NYSE"]);
    }
}
