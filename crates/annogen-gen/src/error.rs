//! Generation error types.

use std::path::PathBuf;

use annogen_cache::CacheError;
use annogen_core::CoreError;

/// Errors that abort a generation run.
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// A task's header does not exist.
    #[error("source file not found: {path}")]
    MissingSource { path: PathBuf },

    /// A task's template does not exist.
    #[error("template file not found: {path}")]
    MissingTemplate { path: PathBuf },

    /// Dependency folders were declared without an extension list.
    #[error("task '{task}' declares dependencies but no extensions")]
    DependenciesWithoutExtensions { task: String },

    /// No output declared and none can be derived from the template name.
    #[error("task '{task}' declares no outputs and its template does not end in '.in'")]
    NoOutputs { task: String },

    /// The header could not be turned into entities.
    #[error("reading declarations from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    /// The template failed to render.
    #[error("rendering {path}: {detail}")]
    Render { path: PathBuf, detail: String },

    /// Filesystem failure on a source, template or output.
    #[error("I/O error at {path}: {detail}")]
    Io { path: PathBuf, detail: String },

    /// Stamp store failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, GenError>;
