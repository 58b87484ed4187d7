//! Filesystem-backed stamp store.

use std::ffi::OsStr;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::error::{CacheError, Result};

/// Suffix appended to a tracked path to form its stamp path.
pub const STAMP_SUFFIX: &str = ".stamp";

/// Stands in for a `..` component in a stamp path.
pub const PARENT_DIR_KEY: &str = "__parent__";

/// Stamps for files under one base directory.
#[derive(Debug, Clone)]
pub struct StampStore {
    /// Directory tracked paths are relative to.
    base_dir: PathBuf,
    /// Root directory holding the stamp files.
    root: PathBuf,
}

fn io_error(path: &Path, action: &str, e: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        detail: format!("{action}: {e}"),
    }
}

fn modified_time(path: &Path) -> Result<SystemTime> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CacheError::Missing {
            path: path.to_path_buf(),
        },
        _ => io_error(path, "reading metadata", e),
    })?;
    metadata
        .modified()
        .map_err(|e| io_error(path, "reading modification time", e))
}

impl StampStore {
    /// Create a store. A relative `root` is taken relative to `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, root: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.into();
        let root = base_dir.join(root);
        StampStore { base_dir, root }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the root directory of the stamps.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the stamp for `tracked` lives: the tracked path, relative to
    /// the base directory, under the root with [`STAMP_SUFFIX`] appended.
    /// Each `..` becomes [`PARENT_DIR_KEY`] so the stamp stays under the
    /// root.
    pub fn stamp_path(&self, tracked: &Path) -> PathBuf {
        let relative = tracked.strip_prefix(&self.base_dir).unwrap_or(tracked);
        let key: PathBuf = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                Component::ParentDir => Some(OsStr::new(PARENT_DIR_KEY)),
                _ => None,
            })
            .collect();
        let mut name = key.into_os_string();
        name.push(STAMP_SUFFIX);
        self.root.join(name)
    }

    /// Whether `tracked` changed since its stamp was last updated.
    ///
    /// True when no stamp exists or the file is strictly newer than it.
    /// Fails with [`CacheError::Missing`] when the tracked file is gone.
    pub fn is_modified(&self, tracked: &Path) -> Result<bool> {
        let current = modified_time(&self.base_dir.join(tracked))?;
        let stamp = self.stamp_path(tracked);
        if !stamp.is_file() {
            return Ok(true);
        }
        let stamped = modified_time(&stamp)?;
        Ok(current > stamped)
    }

    /// Record the current modification time of `tracked`.
    pub fn update(&self, tracked: &Path) -> Result<()> {
        let current = modified_time(&self.base_dir.join(tracked))?;
        let stamp = self.stamp_path(tracked);
        if let Some(parent) = stamp.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| io_error(parent, "creating stamp dir", e))?;
        }
        let file = File::create(&stamp).map_err(|e| io_error(&stamp, "writing stamp", e))?;
        file.set_modified(current)
            .map_err(|e| io_error(&stamp, "setting stamp time", e))?;
        log::debug!("stamped {}", tracked.display());
        Ok(())
    }

    /// Number of stamp files currently stored.
    pub fn count(&self) -> usize {
        if !self.root.is_dir() {
            return 0;
        }
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Failed to read stamp entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(STAMP_SUFFIX))
            .count()
    }

    /// Delete every stamp. Returns whether there was anything to delete.
    pub fn clear(&self) -> Result<bool> {
        if !self.root.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&self.root)
            .map_err(|e| io_error(&self.root, "removing stamps", e))?;
        log::debug!("cleared stamps under {}", self.root.display());
        Ok(true)
    }
}
