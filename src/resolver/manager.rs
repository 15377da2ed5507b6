//! TemplateResolver - Public API for template literal expansion
//!
//! Scans a file for template sites, resolves each variable through the
//! strategy chain and expands the site into bounded combinations. Holds no
//! per-request state, so one resolver can serve many threads.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use super::base::{
    Annotation, CancellationFlag, FileResolution, LiteralValueSet, Position, ResolutionContext,
    ResolverConfig, SiteResolution, SourceUnit, TemplateSite,
};
use super::combinations::generate_combinations;
use super::module_path::ModuleResolver;
use super::oracle::{OracleAdapter, SymbolOracle};
use super::strategies::{StrategyOrchestrator, VariableRequest};
use super::typescript::scan_template_sites;
use crate::error::ResolveError;
use crate::utils::file_utils::is_supported_file;
use crate::utils::paths::{to_absolute_native, to_relative_unix_style};

/// Separator between sites that share an annotation anchor
const SITE_SEPARATOR: &str = "  |  ";

pub struct TemplateResolver {
    config: Arc<ResolverConfig>,
    modules: Arc<ModuleResolver>,
    orchestrator: StrategyOrchestrator,
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl TemplateResolver {
    /// Static analysis only; module specifiers resolve through the nearest tsconfig/jsconfig
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config: Arc::new(config),
            modules: Arc::new(ModuleResolver::new()),
            orchestrator: StrategyOrchestrator::new(None),
        }
    }

    /// Consult `oracle` after property access and before declaration lookup
    pub fn with_oracle(mut self, oracle: Arc<dyn SymbolOracle>) -> Self {
        let adapter = OracleAdapter::new(oracle, self.config.oracle_retry_delay());
        self.orchestrator = StrategyOrchestrator::new(Some(adapter));
        self
    }

    pub fn with_module_resolver(mut self, modules: ModuleResolver) -> Self {
        self.modules = Arc::new(modules);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn context(&self) -> ResolutionContext {
        ResolutionContext::new(Arc::clone(&self.config), Arc::clone(&self.modules))
    }

    /// Literal values of one expression at `position` in `unit`
    pub fn resolve_variable(
        &self,
        unit: &SourceUnit,
        expression: &str,
        position: Position,
    ) -> LiteralValueSet {
        let request = VariableRequest::new(unit, expression, position);
        self.orchestrator.resolve(&request, &self.context())
    }

    /// Expand one site; `None` when none of its variables resolved
    pub fn resolve_site(&self, unit: &SourceUnit, site: &TemplateSite) -> Option<SiteResolution> {
        let variables = site.variables();
        let mut resolved: HashMap<String, LiteralValueSet> = HashMap::new();
        for (expression, position) in &variables {
            let values = self.resolve_variable(unit, expression, *position);
            if !values.is_empty() {
                resolved.insert(expression.to_string(), values);
            }
        }

        if resolved.is_empty() {
            debug!(
                "No variable resolved in template at {}:{}",
                site.start.line, site.start.column
            );
            return None;
        }

        let combinations = generate_combinations(
            &site.parts,
            &resolved,
            self.config.max_values_per_variable,
            self.config.max_combinations,
        );
        Some(SiteResolution {
            anchor: site.anchor,
            start: site.start,
            combinations: combinations.values,
            truncated: combinations.truncated,
            resolved_variables: resolved.len(),
            total_variables: variables.len(),
        })
    }

    /// Resolve every site of a parsed file, stopping early when cancelled
    ///
    /// Sites completed before cancellation are kept.
    pub fn resolve_file(&self, unit: &SourceUnit, cancel: &CancellationFlag) -> Vec<SiteResolution> {
        let sites = scan_template_sites(unit);
        let mut resolutions = Vec::new();
        for site in &sites {
            if cancel.is_cancelled() {
                debug!("Resolution of '{}' cancelled", unit.path().display());
                break;
            }
            if let Some(resolution) = self.resolve_site(unit, site) {
                resolutions.push(resolution);
            }
        }
        debug!(
            "{}/{} template sites resolved in '{}'",
            resolutions.len(),
            sites.len(),
            unit.path().display()
        );
        resolutions
    }

    /// Parse in-memory content (an unsaved editor buffer) and resolve it
    pub fn resolve_content(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<String>,
        cancel: &CancellationFlag,
    ) -> Result<Vec<SiteResolution>, ResolveError> {
        let unit = SourceUnit::parse(path, content)?;
        Ok(self.resolve_file(&unit, cancel))
    }

    /// Read, parse and resolve a file on disk
    pub fn resolve_path(&self, path: &Path, cancel: &CancellationFlag) -> Result<Vec<SiteResolution>> {
        let unit = SourceUnit::open(path, self.config.file_retry_delay())
            .with_context(|| format!("Failed to load '{}'", path.display()))?;
        Ok(self.resolve_file(&unit, cancel))
    }

    /// Resolve many files in parallel
    ///
    /// Relative paths are taken from `workspace_root`. Files that cannot be
    /// read or parsed are logged and left out; output follows input order.
    pub fn resolve_files(
        &self,
        workspace_root: &Path,
        paths: &[PathBuf],
        cancel: &CancellationFlag,
    ) -> Vec<FileResolution> {
        paths
            .par_iter()
            .filter_map(|path| {
                if cancel.is_cancelled() {
                    return None;
                }
                let absolute = match path.to_str() {
                    Some(relative) if !path.is_absolute() => to_absolute_native(relative, workspace_root),
                    _ => workspace_root.join(path),
                };
                if !is_supported_file(&absolute) {
                    debug!("Skipping unsupported file '{}'", absolute.display());
                    return None;
                }

                let sites = match self.resolve_path(&absolute, cancel) {
                    Ok(sites) => sites,
                    Err(e) => {
                        warn!("Skipping '{}': {:#}", absolute.display(), e);
                        return None;
                    }
                };

                let file_path = to_relative_unix_style(&absolute, workspace_root).unwrap_or_else(|e| {
                    debug!("{}", e);
                    absolute.to_string_lossy().replace('\\', "/")
                });
                Some(FileResolution { file_path, sites })
            })
            .collect()
    }
}

/// Merge site resolutions into one display annotation per anchor
///
/// Anchors keep the order of their first site.
pub fn annotations(sites: &[SiteResolution]) -> Vec<Annotation> {
    let mut grouped: IndexMap<Position, Vec<String>> = IndexMap::new();
    for site in sites {
        grouped.entry(site.anchor).or_default().push(site.display_text());
    }
    grouped
        .into_iter()
        .map(|(anchor, texts)| Annotation {
            anchor,
            text: texts.join(SITE_SEPARATOR),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample(relative: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("test_samples")
            .join(relative)
    }

    fn hermetic() -> TemplateResolver {
        TemplateResolver::default().with_module_resolver(ModuleResolver::relative_only())
    }

    #[test]
    fn test_exchange_type_end_to_end() {
        let resolver = TemplateResolver::default();
        let sites = resolver
            .resolve_path(&sample("exchange.ts"), &CancellationFlag::new())
            .unwrap();

        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].combinations, vec!["X.A.Y", "X.B.Y", "X.C.Y"]);
        assert!(!sites[0].truncated);
        assert_eq!(sites[0].resolved_variables, 1);
        assert_eq!(sites[0].anchor.line, 2);
    }

    #[test]
    fn test_cross_file_enum_and_key_idiom() {
        let resolver = TemplateResolver::default();
        let sites = resolver
            .resolve_path(&sample("trading/orders.ts"), &CancellationFlag::new())
            .unwrap();

        let route = sites.iter().find(|site| site.start.line == 3).unwrap();
        assert_eq!(
            route.combinations,
            vec!["orders.BUY.lse", "orders.BUY.nyse", "orders.SELL.lse", "orders.SELL.nyse"]
        );

        let queue = sites.iter().find(|site| site.start.line == 7).unwrap();
        assert_eq!(queue.combinations, vec!["queue.BUY.{region}", "queue.SELL.{region}"]);
        assert_eq!((queue.resolved_variables, queue.total_variables), (1, 2));
    }

    #[test]
    fn test_cross_file_cycle_terminates_unresolved() {
        let sites = TemplateResolver::default()
            .resolve_path(&sample("trading/cycle_a.ts"), &CancellationFlag::new())
            .unwrap();
        assert!(sites.is_empty());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = TemplateResolver::default();
        let path = sample("trading/orders.ts");
        let first = resolver.resolve_path(&path, &CancellationFlag::new()).unwrap();
        let second = resolver.resolve_path(&path, &CancellationFlag::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unresolvable_sites_produce_nothing() {
        let sites = hermetic()
            .resolve_content(
                "mem/plain.ts",
                "const a = `${window.location}`;\nconst b = `${Math.random()}`;\n",
                &CancellationFlag::new(),
            )
            .unwrap();
        assert!(sites.is_empty());
    }

    #[test]
    fn test_cancellation_stops_between_sites() {
        let cancel = CancellationFlag::new();
        cancel.cancel();
        let sites = hermetic()
            .resolve_content("mem/cancel.ts", "const k: 'a' = 'a';\nconst s = `${k}`;\n", &cancel)
            .unwrap();
        assert!(sites.is_empty());
    }

    #[test]
    fn test_unsupported_content_is_an_error() {
        let result = hermetic().resolve_content("notes.md", "`${x}`", &CancellationFlag::new());
        assert!(matches!(result, Err(ResolveError::UnsupportedFile(_))));
    }

    #[test]
    fn test_annotations_group_sites_on_one_anchor() {
        let content = "const level: 'info' | 'warn' = 'info';\nlog(`a.${level}`, `b.${level}`);\nconst c = `c.${level}`;\n";
        let sites = hermetic()
            .resolve_content("mem/annotate.ts", content, &CancellationFlag::new())
            .unwrap();
        assert_eq!(sites.len(), 3);

        let annotations = annotations(&sites);
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].anchor.line, 1);
        assert_eq!(annotations[0].text, "a.info, a.warn  |  b.info, b.warn");
        assert_eq!(annotations[1].text, "c.info, c.warn");
    }

    #[test]
    fn test_truncated_sites_display_an_ellipsis() {
        let mut config = ResolverConfig::default();
        config.max_combinations = 2;
        let resolver = TemplateResolver::new(config).with_module_resolver(ModuleResolver::relative_only());
        let sites = resolver
            .resolve_content(
                "mem/many.ts",
                "enum E { A, B, C }\nconst s = `${E.A}-${e}`;\nfunction f(e: E) {}\n",
                &CancellationFlag::new(),
            )
            .unwrap();
        assert_eq!(sites[0].combinations, vec!["A-A", "A-B"]);
        assert!(sites[0].truncated);
        assert_eq!(sites[0].display_text(), "A-A, A-B, …");
    }

    #[test]
    fn test_resolve_files_skips_failures_and_keeps_order() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.ts"), "const m: 'x' | 'y' = 'x';\nconst s = `${m}`;\n").unwrap();
        fs::write(root.join("src/b.js"), "const plain = 'no templates';\n").unwrap();

        fs::write(root.join("src/notes.md"), "`${x}`").unwrap();

        let paths = vec![
            PathBuf::from("src/a.ts"),
            PathBuf::from("src/missing.ts"),
            PathBuf::from("src/notes.md"),
            root.join("src/b.js"),
        ];
        let results = hermetic().resolve_files(root, &paths, &CancellationFlag::new());

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].file_path, "src/a.ts");
        assert_eq!(results[0].sites[0].combinations, vec!["x", "y"]);
        assert_eq!(results[1].file_path, "src/b.js");
        assert!(results[1].sites.is_empty());
    }
}
