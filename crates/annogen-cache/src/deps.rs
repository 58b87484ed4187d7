//! Dependency-file enumeration.
//!
//! Each folder is walked independently and yields its own set; callers
//! combine sets by union, so traversal order never matters.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Whether `path` has one of `extensions`, given with or without the dot.
fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|want| want.strip_prefix('.').unwrap_or(want) == ext)
}

/// Every file under `folder`, recursively, whose extension is allowed.
///
/// A folder that does not exist contributes nothing and logs a warning.
pub fn files_in_folder(folder: &Path, extensions: &[String]) -> BTreeSet<PathBuf> {
    if !folder.is_dir() {
        log::warn!(
            "dependency folder \"{}\" does not exist, skipping",
            folder.display()
        );
        return BTreeSet::new();
    }

    let mut files = BTreeSet::new();
    for result in WalkDir::new(folder) {
        match result {
            Ok(entry) => {
                if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                    files.insert(entry.into_path());
                }
            }
            Err(e) => log::warn!("Failed to read entry: {e}"),
        }
    }
    files
}

/// Union of [`files_in_folder`] over `folders`, resolved against
/// `base_dir`. Returned paths are relative to `base_dir`.
pub fn dependency_files(
    base_dir: &Path,
    folders: &[PathBuf],
    extensions: &[String],
) -> BTreeSet<PathBuf> {
    let files: BTreeSet<PathBuf> = folders
        .iter()
        .map(|folder| files_in_folder(&base_dir.join(folder), extensions))
        .fold(BTreeSet::new(), |mut all, found| {
            all.extend(found);
            all
        })
        .into_iter()
        .map(|path| match path.strip_prefix(base_dir) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => path,
        })
        .collect();

    log::debug!(
        "{} dependency file(s): {:?}",
        files.len(),
        files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>()
    );
    files
}
