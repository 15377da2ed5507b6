// Module Path Resolver
//
// Maps an import specifier to a source file on disk. Relative specifiers are
// resolved against the importing file; bare specifiers only through the
// project's tsconfig/jsconfig `baseUrl` and `paths`. Packages are never analyzed.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ResolveError;
use crate::utils::paths::normalize_lexically;

const PROJECT_CONFIG_FILES: &[&str] = &["tsconfig.json", "jsconfig.json"];
const MAX_EXTENDS_DEPTH: usize = 4;

/// Extensions appended to extension-less specifiers, in order
const APPENDED_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts", ".js", ".jsx", ".mjs", ".cjs"];

/// Extensions that mark a specifier as already naming a file
const KNOWN_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs", "json"];

#[derive(Debug, Clone, Default)]
pub struct ModuleResolver {
    project: Option<ProjectConfig>,
    discover: bool,
}

impl ModuleResolver {
    /// Resolver that discovers the nearest tsconfig/jsconfig for every importing file
    pub fn new() -> Self {
        Self {
            project: None,
            discover: true,
        }
    }

    /// Resolver with an explicit project configuration and no discovery
    pub fn with_project(project: ProjectConfig) -> Self {
        Self {
            project: Some(project),
            discover: false,
        }
    }

    /// Resolver for relative specifiers only
    pub fn relative_only() -> Self {
        Self::default()
    }

    /// Resolve `specifier` imported from `from_file`; `None` when no candidate exists
    pub fn resolve(&self, from_file: &Path, specifier: &str) -> Option<PathBuf> {
        let base_dir = from_file.parent().unwrap_or_else(|| Path::new("."));

        if is_relative_specifier(specifier) || Path::new(specifier).is_absolute() {
            let resolved = resolve_candidates(&base_dir.join(specifier));
            if resolved.is_none() {
                debug!(
                    "No file for '{}' imported from '{}'",
                    specifier,
                    from_file.display()
                );
            }
            return resolved;
        }

        let discovered;
        let project = match (&self.project, self.discover) {
            (Some(project), _) => project,
            (None, true) => {
                discovered = ProjectConfig::discover(base_dir)?;
                &discovered
            }
            (None, false) => return None,
        };

        project.resolve(specifier)
    }
}

fn is_relative_specifier(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Candidate files for a joined specifier, in resolution order
pub fn candidate_paths(base: &Path) -> Vec<PathBuf> {
    let base = normalize_lexically(base);
    let mut candidates = vec![base.clone()];

    let extension = base
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| KNOWN_EXTENSIONS.contains(ext));

    match extension {
        Some(script) if matches!(script, "js" | "jsx" | "mjs" | "cjs") => {
            let substitutes: &[&str] = match script {
                "js" => &["ts", "tsx", "d.ts"],
                "jsx" => &["tsx", "ts", "d.ts"],
                "mjs" => &["mts", "d.mts"],
                _ => &["cts", "d.cts"],
            };
            for substitute in substitutes {
                candidates.push(base.with_extension(substitute));
            }
        }
        Some(_) => {}
        None => {
            for extension in APPENDED_EXTENSIONS {
                candidates.push(with_appended(&base, extension));
            }
            for extension in APPENDED_EXTENSIONS {
                candidates.push(base.join(format!("index{}", extension)));
            }
        }
    }

    candidates
}

/// First existing file among the candidates for `base`
pub fn resolve_candidates(base: &Path) -> Option<PathBuf> {
    candidate_paths(base)
        .into_iter()
        .find(|candidate| candidate.is_file())
}

// `foo.service` + `.ts` = `foo.service.ts`; `with_extension` would replace `.service`
fn with_appended(base: &Path, extension: &str) -> PathBuf {
    let mut raw: OsString = base.as_os_str().to_os_string();
    raw.push(extension);
    PathBuf::from(raw)
}

/// One `compilerOptions.paths` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAlias {
    pub pattern: String,
    pub targets: Vec<String>,
}

impl PathAlias {
    /// The text captured by `*`, or "" for an exact match
    pub fn matches<'s>(&self, specifier: &'s str) -> Option<&'s str> {
        match self.pattern.split_once('*') {
            None => (self.pattern == specifier).then_some(""),
            Some((prefix, suffix)) => {
                if specifier.len() >= prefix.len() + suffix.len()
                    && specifier.starts_with(prefix)
                    && specifier.ends_with(suffix)
                {
                    Some(&specifier[prefix.len()..specifier.len() - suffix.len()])
                } else {
                    None
                }
            }
        }
    }

    fn prefix_len(&self) -> usize {
        self.pattern
            .split_once('*')
            .map_or(self.pattern.len(), |(prefix, _)| prefix.len())
    }

    fn is_exact(&self) -> bool {
        !self.pattern.contains('*')
    }
}

/// Module mapping from a tsconfig.json / jsconfig.json
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub base_url: Option<PathBuf>,
    /// Directory `paths` targets are relative to
    pub paths_base: PathBuf,
    /// Sorted most specific first
    pub paths: Vec<PathAlias>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProjectFile {
    extends: Option<String>,
    compiler_options: RawCompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawCompilerOptions {
    base_url: Option<String>,
    paths: Option<BTreeMap<String, Vec<String>>>,
}

impl ProjectConfig {
    /// Load a config file, following a relative `extends` chain
    pub fn load(path: &Path) -> Result<Self, ResolveError> {
        Self::load_with_depth(path, 0)
    }

    fn load_with_depth(path: &Path, depth: usize) -> Result<Self, ResolveError> {
        let text = std::fs::read_to_string(path).map_err(|source| ResolveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let raw = parse_raw(&text).map_err(|source| ResolveError::ProjectConfig {
            path: path.to_path_buf(),
            source,
        })?;

        let parent = match raw.extends.as_deref() {
            Some(extends) if is_relative_specifier(extends) && depth < MAX_EXTENDS_DEPTH => {
                let mut parent_path = normalize_lexically(&config_dir.join(extends));
                if parent_path.extension().is_none() {
                    parent_path = with_appended(&parent_path, ".json");
                }
                match Self::load_with_depth(&parent_path, depth + 1) {
                    Ok(parent) => Some(parent),
                    Err(e) => {
                        warn!("Ignoring extended project config: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(Self::from_raw(config_dir, raw.compiler_options, parent))
    }

    /// Build from JSON text (comments and trailing commas allowed)
    pub fn from_json_str(config_dir: impl Into<PathBuf>, text: &str) -> Result<Self, serde_json::Error> {
        let raw = parse_raw(text)?;
        Ok(Self::from_raw(config_dir.into(), raw.compiler_options, None))
    }

    fn from_raw(config_dir: PathBuf, options: RawCompilerOptions, parent: Option<Self>) -> Self {
        let base_url = options
            .base_url
            .map(|url| normalize_lexically(&config_dir.join(url)))
            .or_else(|| parent.as_ref().and_then(|p| p.base_url.clone()));

        let (paths_base, mut paths) = match options.paths {
            Some(raw_paths) => (
                base_url.clone().unwrap_or_else(|| config_dir.clone()),
                raw_paths
                    .into_iter()
                    .map(|(pattern, targets)| PathAlias { pattern, targets })
                    .collect::<Vec<_>>(),
            ),
            None => match &parent {
                Some(p) => (p.paths_base.clone(), p.paths.clone()),
                None => (config_dir.clone(), Vec::new()),
            },
        };

        paths.sort_by(|a, b| {
            b.is_exact()
                .cmp(&a.is_exact())
                .then(b.prefix_len().cmp(&a.prefix_len()))
                .then(a.pattern.cmp(&b.pattern))
        });

        Self {
            config_dir,
            base_url,
            paths_base,
            paths,
        }
    }

    /// Nearest tsconfig.json/jsconfig.json walking up from `start_dir`
    ///
    /// A malformed file is logged and ends the search with no mapping.
    pub fn discover(start_dir: &Path) -> Option<Self> {
        for dir in start_dir.ancestors() {
            for name in PROJECT_CONFIG_FILES {
                let candidate = dir.join(name);
                if !candidate.is_file() {
                    continue;
                }
                return match Self::load(&candidate) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        warn!("{}", e);
                        None
                    }
                };
            }
        }
        None
    }

    /// Unresolved file bases for a bare specifier, most specific mapping first
    pub fn candidate_bases(&self, specifier: &str) -> Vec<PathBuf> {
        let mut bases = Vec::new();
        for alias in &self.paths {
            if let Some(captured) = alias.matches(specifier) {
                for target in &alias.targets {
                    let mapped = target.replacen('*', captured, 1);
                    bases.push(self.paths_base.join(mapped));
                }
            }
        }
        if let Some(base_url) = &self.base_url {
            bases.push(base_url.join(specifier));
        }
        bases
    }

    /// Resolve a bare specifier to an existing file
    pub fn resolve(&self, specifier: &str) -> Option<PathBuf> {
        self.candidate_bases(specifier)
            .into_iter()
            .find_map(|base| resolve_candidates(&base))
    }
}

fn parse_raw(text: &str) -> Result<RawProjectFile, serde_json::Error> {
    let cleaned = strip_trailing_commas(&strip_json_comments(text));
    serde_json::from_str(&cleaned)
}

/// Remove `//` and `/* */` comments outside of string literals
pub fn strip_json_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for skipped in chars.by_ref() {
                    if previous == '*' && skipped == '/' {
                        break;
                    }
                    previous = skipped;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Remove commas that directly precede `}` or `]`, outside of strings
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            if !matches!(next, Some('}') | Some(']')) {
                out.push(c);
            }
        } else {
            out.push(c);
        }
        i += 1;
    }
    out
}
