// PyO3 Bindings Module
//
// Python bindings for the template resolver. Results are wrapped in
// read-only PyO3 classes; resolution itself runs with the GIL released.

mod api;
mod site_resolution;

// Re-export for lib.rs
pub use api::{detect_language, resolve_file, resolve_files_batch, supported_extensions};
pub use site_resolution::{PyFileResolution, PySiteResolution};
