//! Template literal value resolution
//!
//! - `base` - parsed files, shared types, per-request resolution state
//! - `module_path` - import specifiers to files, including tsconfig `paths`
//! - `typescript` - static analysis over the tree-sitter syntax tree
//! - `oracle` - optional external symbol intelligence (hover, definitions)
//! - `strategies` - the ordered fallback chain for one variable
//! - `combinations` - bounded Cartesian expansion of a template site
//! - `manager` - `TemplateResolver`, the public entry point

pub mod base;
pub mod combinations;
pub mod manager;
pub mod module_path;
pub mod oracle;
pub mod strategies;
pub mod typescript;

pub use base::{
    Annotation, CancellationFlag, FileResolution, LiteralValueSet, Location, Position,
    ResolverConfig, SiteResolution, SourceUnit, TemplatePart, TemplateSite,
};
pub use combinations::{generate_combinations, Combinations};
pub use manager::{annotations, TemplateResolver};
pub use module_path::{ModuleResolver, ProjectConfig};
pub use oracle::{OracleAdapter, OracleError, SymbolOracle};
pub use strategies::{ResolutionStrategy, StrategyOrchestrator, VariableRequest};
