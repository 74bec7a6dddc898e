use crate::request::{ChangeKind, FileChange};
use std::path::{Component, Path};

/// Directories scanned when the CI platform did not supply a change set.
pub const SCAN_DIRECTORIES: &[&str] = &["src", "lib", "app", "components", "services", "api"];

/// Upper bound on change-set entries sent to the server.
pub const MAX_FILES: usize = 100;

/// Upper bound on captured content per file (1 MiB).
pub const MAX_CONTENT_BYTES: u64 = 1024 * 1024;

const SKIPPED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "vendor",
    "dist",
    "build",
    "__pycache__",
];

/// Best-effort listing of source files under the common source directories.
///
/// Entries are sorted by path and capped at [`MAX_FILES`]. Each entry carries
/// the file's UTF-8 content when it fits in [`MAX_CONTENT_BYTES`].
pub fn scan_source_tree(root: &Path) -> Vec<FileChange> {
    let mut paths = Vec::new();

    for dir in SCAN_DIRECTORIES {
        let base = root.join(dir);
        if !base.is_dir() {
            continue;
        }
        let pattern = format!("{}/**/*", base.display());
        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %base.display(), error = %e, "skipping unreadable scan pattern");
                continue;
            }
        };
        for entry in entries.flatten() {
            if !entry.is_file() {
                continue;
            }
            if let Ok(relative) = entry.strip_prefix(root) {
                if !is_skipped(relative) {
                    paths.push(relative.to_path_buf());
                }
            }
        }
    }

    paths.sort();
    paths.dedup();
    paths.truncate(MAX_FILES);

    paths
        .into_iter()
        .map(|relative| FileChange {
            content: read_capped_content(&root.join(&relative)),
            path: to_forward_slashes(&relative),
            kind: ChangeKind::Unknown,
        })
        .collect()
}

/// Read a file as UTF-8 if it is no larger than [`MAX_CONTENT_BYTES`].
pub fn read_capped_content(path: &Path) -> Option<String> {
    let metadata = std::fs::metadata(path).ok()?;
    if !metadata.is_file() || metadata.len() > MAX_CONTENT_BYTES {
        return None;
    }
    let bytes = std::fs::read(path).ok()?;
    String::from_utf8(bytes).ok()
}

fn is_skipped(relative: &Path) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(name) => {
            let name = name.to_string_lossy();
            name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
        }
        _ => false,
    })
}

fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
