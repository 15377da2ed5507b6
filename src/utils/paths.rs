// Path Conversion Utilities
//
// Batch results report files as relative Unix-style paths from the workspace
// root; module specifiers are joined and normalized without touching the disk.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Convert an absolute path to a relative Unix-style path (with `/` separators)
///
/// Both paths are canonicalized when possible so symlinked roots
/// (`/var` vs `/private/var` on macOS) still match.
///
/// # Errors
/// Fails when `absolute` is not inside `workspace_root`.
pub fn to_relative_unix_style(absolute: &Path, workspace_root: &Path) -> Result<String> {
    let (path_to_use, root_to_use) = match (absolute.canonicalize(), workspace_root.canonicalize())
    {
        (Ok(canonical_abs), Ok(canonical_root)) => (canonical_abs, canonical_root),
        _ => (absolute.to_path_buf(), workspace_root.to_path_buf()),
    };

    let normalized_path = strip_unc_prefix(&path_to_use);
    let normalized_root = strip_unc_prefix(&root_to_use);

    let relative = normalized_path
        .strip_prefix(&normalized_root)
        .with_context(|| {
            format!(
                "File path '{}' is not within workspace root '{}'",
                normalized_path.display(),
                normalized_root.display()
            )
        })?;

    let path_str = relative.to_str().context("Path contains invalid UTF-8")?;

    let unix_style = if MAIN_SEPARATOR == '\\' {
        path_str.replace('\\', "/")
    } else {
        path_str.to_string()
    };

    Ok(unix_style)
}

/// Join a relative Unix-style path onto the workspace root using native separators
pub fn to_absolute_native(relative_unix: &str, workspace_root: &Path) -> PathBuf {
    let mut path = workspace_root.to_path_buf();
    for segment in relative_unix.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
}

/// Resolve `.` and `..` components without requiring the path to exist
///
/// `..` above the root is dropped rather than reported; module specifiers
/// pointing outside the filesystem simply fail to resolve later.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() && !path.is_absolute() {
                    normalized.push("..");
                }
            }
            Component::Normal(name) => normalized.push(name),
        }
    }
    normalized
}

#[cfg(windows)]
fn strip_unc_prefix(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    match path_str.strip_prefix(r"\\?\") {
        Some(stripped) => PathBuf::from(stripped),
        None => path.to_path_buf(),
    }
}

#[cfg(not(windows))]
fn strip_unc_prefix(path: &Path) -> PathBuf {
    path.to_path_buf()
}
