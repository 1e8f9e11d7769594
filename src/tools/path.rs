//! Path resolution shared by every file tool.
//!
//! Paths are not confined to the working directory: the model may read and
//! write anywhere the process can.

use std::path::{Component, Path, PathBuf};

/// Expands a leading `~`, anchors relative paths at `working_dir`, and
/// normalizes `.` and `..` lexically.
///
/// The target does not need to exist, so symlinks are left unresolved.
pub fn resolve_path(working_dir: &Path, raw: &str) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = Path::new(expanded.as_ref());
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    };
    normalize(&joined)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `pop` at the root is a no-op, matching how `/..` resolves.
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
