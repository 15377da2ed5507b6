// API Functions - PyO3-exposed functions for Python
//
// These functions provide the public API for template resolution.

use super::{PyFileResolution, PySiteResolution};
use crate::language::{detect_language_from_extension, SUPPORTED_EXTENSIONS};
use crate::resolver::{CancellationFlag, TemplateResolver};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::path::{Path, PathBuf};

/// Resolve every template string in one source buffer
///
/// Args:
///     content (str): Source code (may be an unsaved editor buffer)
///     file_path (str): Path of the buffer; picks the grammar and anchors relative imports
///
/// Returns:
///     list[SiteResolution]: Sites with at least one resolved variable, in document order
///
/// Raises:
///     ValueError: If the file type is not supported
#[pyfunction]
#[pyo3(signature = (content, file_path))]
pub fn resolve_file(py: Python<'_>, content: String, file_path: String) -> PyResult<Vec<PySiteResolution>> {
    let sites = py
        .detach(move || {
            TemplateResolver::default().resolve_content(&file_path, content, &CancellationFlag::new())
        })
        .map_err(|e| PyValueError::new_err(format!("Resolution failed: {}", e)))?;

    Ok(sites.into_iter().map(PySiteResolution::from_site).collect())
}

/// Resolve template strings in many files in parallel
///
/// Releases the GIL and fans the files out over Rayon's thread pool.
/// Files that cannot be read or parsed are logged and left out.
///
/// Args:
///     file_paths (list[str]): Paths, absolute or relative to workspace_root
///     workspace_root (str): Absolute path to the workspace root directory
///
/// Returns:
///     list[FileResolution]: One entry per successfully processed file, in input order
#[pyfunction]
#[pyo3(signature = (file_paths, workspace_root))]
pub fn resolve_files_batch(
    py: Python<'_>,
    file_paths: Vec<String>,
    workspace_root: String,
) -> Vec<PyFileResolution> {
    let results = py.detach(move || {
        let paths: Vec<PathBuf> = file_paths.iter().map(PathBuf::from).collect();
        TemplateResolver::default().resolve_files(
            Path::new(&workspace_root),
            &paths,
            &CancellationFlag::new(),
        )
    });

    results.into_iter().map(PyFileResolution::from_file).collect()
}

/// Detect the grammar used for a file
///
/// Args:
///     file_path (str): File path with extension (e.g., "app.ts", "view.jsx")
///
/// Returns:
///     str: "typescript", "tsx" or "javascript"; "text" for anything else
#[pyfunction]
#[pyo3(signature = (file_path))]
pub fn detect_language(file_path: &str) -> PyResult<String> {
    let path = Path::new(file_path);
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    let lang = detect_language_from_extension(extension).unwrap_or("text");

    Ok(lang.to_string())
}

/// Get the list of file extensions the resolver analyzes
///
/// Returns:
///     list[str]: Extensions without the leading dot
#[pyfunction]
pub fn supported_extensions() -> PyResult<Vec<String>> {
    Ok(SUPPORTED_EXTENSIONS.iter().map(|&s| s.to_string()).collect())
}
