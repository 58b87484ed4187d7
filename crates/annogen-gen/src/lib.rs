//! Generation orchestrator for annogen.
//!
//! Runs configured [`Task`]s in order. For each one it decides from
//! stamps whether anything changed; if so it extracts entities from the
//! task's header, renders the task's template once and writes the result
//! to every declared output.
//!
//! ## Modules
//!
//! - [`task`]: Task configuration and output resolution
//! - [`render`]: Template environment and render-time functions
//! - [`generate`]: Staleness checks, output writing and stamping

pub mod error;
pub mod generate;
pub mod render;
pub mod task;

// Re-exports for convenience.
pub use error::{GenError, Result};
pub use generate::{Generator, TaskOutcome};
pub use render::Renderer;
pub use task::{Output, OutputSpec, Task};
