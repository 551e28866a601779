use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive entry path under `base`, rejecting anything that escapes it.
pub fn sanitize_path(entry_path: impl AsRef<Path>, base: impl AsRef<Path>) -> Result<PathBuf> {
    let entry_path = entry_path.as_ref();
    let base = base.as_ref();
    let normalized = normalize_path(entry_path);

    if normalized.is_absolute() || entry_path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(Error::ZipSlip {
            entry:    entry_path.to_path_buf(),
            resolved: normalized,
        });
    }

    let resolved = normalize_path(&base.join(normalized));
    if !resolved.starts_with(normalize_path(base)) {
        return Err(Error::ZipSlip {
            entry: entry_path.to_path_buf(),
            resolved,
        });
    }
    Ok(resolved)
}

/// Validate a symlink target relative to the link's location.
pub fn sanitize_symlink_target(target: &Path, link: &Path, base: &Path) -> Result<PathBuf> {
    let resolved = if target.is_absolute() {
        normalize_path(target)
    } else {
        let parent = link.parent().unwrap_or(base);
        normalize_path(&parent.join(target))
    };
    if !resolved.starts_with(normalize_path(base)) {
        return Err(Error::SymlinkEscape {
            target: target.to_path_buf(),
            resolved,
        });
    }
    Ok(resolved)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }
    result
}
