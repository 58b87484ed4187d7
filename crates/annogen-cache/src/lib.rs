//! Incremental regeneration tracking for annogen.
//!
//! A *stamp* records when a tracked file was last processed. A file is
//! modified when it has no stamp, or its modification time is newer than
//! the stamp's. Only stamps persist between runs.
//!
//! Layout:
//! ```text
//! <cache_root>/
//!   templates/binding.j2.stamp
//!   include/engine/core.h.stamp
//!   __parent__/shared/types.h.stamp   (for ../shared/types.h)
//! ```
//!
//! Stamp contents are empty; only existence and modification time matter.

pub mod deps;
pub mod error;
pub mod stamp;

// Re-exports for convenience.
pub use deps::{dependency_files, files_in_folder};
pub use error::{CacheError, Result};
pub use stamp::StampStore;
