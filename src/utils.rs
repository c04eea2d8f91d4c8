//! Path normalization utilities.
//!
//! Snapshot paths, hosted-editor paths and decoration document ids all
//! arrive from different processes and may disagree on symlinks or
//! relative segments. Everything is compared in normalized form.

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
///
/// Paths that do not exist on disk (in-memory documents, scratch copies)
/// keep their textual form, which is what the writing side used too.
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Normalize a path given as a string (the snapshot wire form).
#[inline]
pub fn normalize_path_str(path: &str) -> PathBuf {
    normalize_path(Path::new(path))
}
