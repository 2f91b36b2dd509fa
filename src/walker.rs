//! Discovery of working repositories below a root folder
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::git::VersionControl;

/// Directory-name substrings skipped by default (dependency, build and output folders)
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "vendor",
];

/// Whether the walker should enter this entry
fn is_allowed(entry: &DirEntry, excludes: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name != ".git" && !excludes.iter().any(|pattern| name.contains(pattern.as_str()))
}

/// Find every working repository below `root`, in file name order.
///
/// Repositories are not descended into, so nested repositories and submodules are not
/// reported separately. A `root` that is itself a working copy is the only result.
pub fn discover_repositories(
    root: &Path,
    excludes: &[String],
    vcs: &dyn VersionControl,
) -> Vec<PathBuf> {
    if vcs.is_repository(root) {
        log::debug!("{} is itself a repository", root.display());
        return vec![root.to_path_buf()];
    }
    let mut repositories = vec![];
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| is_allowed(entry, excludes));
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };
        if vcs.is_repository(entry.path()) {
            log::trace!("Found repository {}", entry.path().display());
            repositories.push(entry.into_path());
            walker.skip_current_dir();
        }
    }
    repositories
}
