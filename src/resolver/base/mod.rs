// Base resolver module
//
// Parsed files, tree navigation, shared types and per-attempt resolution state.

pub mod context;
pub mod source_unit;
pub mod tree_methods;
pub mod types;

pub use context::{CancellationFlag, DeclarationKey, ResolutionContext};
pub use source_unit::SourceUnit;
pub use types::{
    Annotation, FileResolution, LiteralValueSet, Location, Position, ResolverConfig,
    SiteResolution, TemplatePart, TemplateSite,
};
