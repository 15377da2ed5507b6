// Resolution context: cycle detection, depth limit and cancellation
//
// One context lives for exactly one strategy attempt on one variable. Every
// declaration the extractor steps into is entered here first; re-entering a
// declaration that is still being resolved is a cycle and yields nothing.
// Finished results are memoized per context so shared references resolve once.

use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;
use tree_sitter::Node;

use super::types::{LiteralValueSet, ResolverConfig};
use crate::resolver::module_path::ModuleResolver;

/// Identity of a declaration node across files
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclarationKey {
    pub file: PathBuf,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl DeclarationKey {
    pub fn new(file: &Path, node: &Node) -> Self {
        Self {
            file: file.to_path_buf(),
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
        }
    }
}

pub struct ResolutionContext {
    config: Arc<ResolverConfig>,
    modules: Arc<ModuleResolver>,
    in_progress: FxHashSet<DeclarationKey>,
    finished: FxHashMap<DeclarationKey, LiteralValueSet>,
    refusals: usize,
    depth: usize,
}

impl ResolutionContext {
    pub fn new(config: Arc<ResolverConfig>, modules: Arc<ModuleResolver>) -> Self {
        Self {
            config,
            modules,
            in_progress: FxHashSet::default(),
            finished: FxHashMap::default(),
            refusals: 0,
            depth: 0,
        }
    }

    /// A context sharing configuration and module resolution but no visit state
    pub fn fresh(&self) -> Self {
        Self::new(Arc::clone(&self.config), Arc::clone(&self.modules))
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn modules(&self) -> &ModuleResolver {
        &self.modules
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Mark a declaration as in progress
    ///
    /// Returns false (and changes nothing) when the declaration is already
    /// being resolved or the depth limit is reached. Every `true` must be
    /// paired with `leave` for the same key.
    pub fn enter(&mut self, key: DeclarationKey) -> bool {
        if self.depth >= self.config.max_resolution_depth {
            trace!("Resolution depth limit reached at {}:{}", key.file.display(), key.start_byte);
            self.refusals += 1;
            return false;
        }
        if !self.in_progress.insert(key) {
            trace!("Declaration cycle detected");
            self.refusals += 1;
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn leave(&mut self, key: &DeclarationKey) {
        if self.in_progress.remove(key) {
            self.depth -= 1;
        }
    }

    /// Number of `enter` calls refused so far (cycles and depth limit)
    ///
    /// A result computed while this count stayed unchanged is complete.
    pub fn refusals(&self) -> usize {
        self.refusals
    }

    /// Memoized values of a declaration already resolved in this context
    pub fn finished(&self, key: &DeclarationKey) -> Option<&LiteralValueSet> {
        self.finished.get(key)
    }

    /// Store the complete values of a declaration
    pub fn finish(&mut self, key: DeclarationKey, values: LiteralValueSet) {
        self.finished.insert(key, values);
    }
}

/// Cooperative cancellation shared between a caller and a running resolution
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
