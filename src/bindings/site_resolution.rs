// PySiteResolution / PyFileResolution - PyO3 wrappers for resolver results

use crate::resolver::{annotations, FileResolution, SiteResolution};
use pyo3::prelude::*;

/// Python-accessible SiteResolution wrapper
///
/// One template string expanded into its literal combinations.
/// All fields are read-only from Python.
#[pyclass(name = "SiteResolution")]
pub struct PySiteResolution {
    inner: SiteResolution,
}

impl PySiteResolution {
    pub fn from_site(site: SiteResolution) -> Self {
        PySiteResolution { inner: site }
    }
}

#[pymethods]
impl PySiteResolution {
    /// Zero-based line where the annotation belongs
    #[getter]
    fn anchor_line(&self) -> usize {
        self.inner.anchor.line
    }

    #[getter]
    fn anchor_column(&self) -> usize {
        self.inner.anchor.column
    }

    #[getter]
    fn start_line(&self) -> usize {
        self.inner.start.line
    }

    #[getter]
    fn start_column(&self) -> usize {
        self.inner.start.column
    }

    #[getter]
    fn combinations(&self) -> Vec<String> {
        self.inner.combinations.clone()
    }

    #[getter]
    fn truncated(&self) -> bool {
        self.inner.truncated
    }

    #[getter]
    fn resolved_variables(&self) -> usize {
        self.inner.resolved_variables
    }

    #[getter]
    fn total_variables(&self) -> usize {
        self.inner.total_variables
    }

    /// Combinations joined for inline display
    fn display_text(&self) -> String {
        self.inner.display_text()
    }

    fn __repr__(&self) -> String {
        format!(
            "SiteResolution(line={}, combinations={}, truncated={})",
            self.inner.start.line,
            self.inner.combinations.len(),
            self.inner.truncated
        )
    }
}

/// Python-accessible FileResolution wrapper
#[pyclass(name = "FileResolution")]
pub struct PyFileResolution {
    inner: FileResolution,
}

impl PyFileResolution {
    pub fn from_file(file: FileResolution) -> Self {
        PyFileResolution { inner: file }
    }
}

#[pymethods]
impl PyFileResolution {
    /// Relative Unix-style path from the workspace root
    #[getter]
    fn file_path(&self) -> String {
        self.inner.file_path.clone()
    }

    #[getter]
    fn sites(&self) -> Vec<PySiteResolution> {
        self.inner
            .sites
            .iter()
            .cloned()
            .map(PySiteResolution::from_site)
            .collect()
    }

    /// (line, column, text) per anchor, sites on the same line merged
    fn annotations(&self) -> Vec<(usize, usize, String)> {
        annotations(&self.inner.sites)
            .into_iter()
            .map(|annotation| (annotation.anchor.line, annotation.anchor.column, annotation.text))
            .collect()
    }

    fn __len__(&self) -> usize {
        self.inner.sites.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "FileResolution(file_path='{}', sites={})",
            self.inner.file_path,
            self.inner.sites.len()
        )
    }
}
