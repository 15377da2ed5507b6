// Utilities Module
//
// File access and path helpers shared by the resolver and the bindings.

use std::path::Path;

/// File utilities
pub mod file_utils {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tracing::debug;

    /// Check if a file has an extension the resolver analyzes
    pub fn is_supported_file(path: &Path) -> bool {
        crate::language::detect_language(path).is_some()
    }

    /// Read file content, retrying once after `retry_delay` on failure
    pub fn read_file_content_with_retry(
        path: &Path,
        retry_delay: Duration,
    ) -> std::io::Result<String> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(content),
            Err(first) => {
                debug!(
                    "Read of '{}' failed ({}), retrying in {:?}",
                    path.display(),
                    first,
                    retry_delay
                );
                std::thread::sleep(retry_delay);
                fs::read_to_string(path)
            }
        }
    }
}

/// Path conversion utilities (absolute ↔ relative Unix-style)
pub mod paths;

#[cfg(test)]
mod tests {
    use super::file_utils::*;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_supported_file_detection() {
        assert!(is_supported_file(Path::new("a/b.ts")));
        assert!(is_supported_file(Path::new("a/b.jsx")));
        assert!(!is_supported_file(Path::new("a/b.rs")));
    }

    #[test]
    fn test_read_with_retry() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.ts");
        std::fs::write(&file, "const a = 1;").unwrap();

        let content = read_file_content_with_retry(&file, Duration::from_millis(1)).unwrap();
        assert_eq!(content, "const a = 1;");

        let missing = temp_dir.path().join("missing.ts");
        assert!(read_file_content_with_retry(&missing, Duration::from_millis(1)).is_err());
    }
}
