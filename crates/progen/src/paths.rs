//! Path helpers: absolute resolution, root validation and qmake rendering.

use crate::error::{ProgenError, Result};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolve `path` against the working directory and drop `.`/`..`
/// components lexically. Symlinks are not resolved.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(clean_path(&joined))
}

/// Lexically normalize a path: remove `.` and fold `..` into its parent.
/// A `..` directly under the root stays at the root.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    cleaned.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    cleaned.pop();
                } else if !cleaned.has_root() {
                    cleaned.push(component.as_os_str());
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// Check that `root` exists and is a directory.
pub fn validate_project_root(root: &Path) -> Result<()> {
    if !root.is_dir() {
        return Err(ProgenError::InvalidProjectRoot(root.to_path_buf()));
    }
    Ok(())
}

/// Render `path` relative to `root` with `/` separators.
///
/// Returns `None` when `path` is not under `root`.
pub fn relative_to(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().map(to_forward_slashes)
}

/// Join path components with forward slashes regardless of platform.
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
