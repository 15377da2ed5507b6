// Template Lens - literal-value resolution for TypeScript/JavaScript template strings
//
// Answers "which concrete strings can `X.${m.kind}.Y` produce?" by resolving
// each interpolated expression to a finite literal set with tree-sitter,
// following imports across files and, optionally, an editor's symbol oracle.
// Built as an rlib for Rust consumers and, with the `python` feature, as a
// PyO3 extension module.

pub mod error;
pub mod language;
pub mod resolver;
pub mod utils;

// PyO3 bindings layer
#[cfg(feature = "python")]
pub mod bindings;

pub use error::ResolveError;
pub use language::{detect_language, detect_language_from_extension, SUPPORTED_EXTENSIONS};
pub use resolver::{
    annotations, Annotation, CancellationFlag, FileResolution, LiteralValueSet, Location,
    ModuleResolver, OracleError, Position, ProjectConfig, ResolverConfig, SiteResolution,
    SourceUnit, SymbolOracle, TemplateResolver,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Template Lens Python module
///
/// Expands template strings in TypeScript/JavaScript files into the literal
/// strings they can produce.
#[cfg(feature = "python")]
#[pymodule]
fn template_lens(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    // Add Python functions
    m.add_function(wrap_pyfunction!(bindings::resolve_file, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::resolve_files_batch, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::detect_language, m)?)?;
    m.add_function(wrap_pyfunction!(bindings::supported_extensions, m)?)?;

    // Add Python classes
    m.add_class::<bindings::PySiteResolution>()?;
    m.add_class::<bindings::PyFileResolution>()?;

    Ok(())
}
