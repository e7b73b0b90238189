//! Path helpers for span attributes and for serving job artifacts.

use std::path::{Component, Path, PathBuf};

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Reduces an uploaded filename to its final component.
///
/// Returns `None` when nothing usable is left (empty, `.`, `..`).
pub fn upload_file_name(name: &str) -> Option<String> {
    let last = name.rsplit(|c: char| c == '/' || c == '\\').next()?.trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    Some(last.to_string())
}

/// Joins a relative artifact path (e.g. `chunks/chunk_000.wav`) onto a job
/// directory. Absolute paths and any `..` component are rejected.
pub fn resolve_asset_path(job_dir: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    let mut resolved = job_dir.to_path_buf();
    let mut pushed = false;

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    pushed.then_some(resolved)
}
