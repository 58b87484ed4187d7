//! Task execution.
//!
//! A task is *stale* when its template changed, any output is missing,
//! or any file under its dependency folders changed. Stale tasks are
//! regenerated and their template and dependency files stamped; the
//! header itself is never stamped. Fresh tasks are skipped without
//! reading, rendering or writing anything.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use annogen_cache::{dependency_files, StampStore};
use annogen_core::Entities;
use minijinja::Value;

use crate::error::{GenError, Result};
use crate::render::Renderer;
use crate::task::{Output, Task};

/// Default stamp directory, relative to the base directory.
pub const DEFAULT_CACHE_DIR: &str = ".annogen/stamps";

/// What running one task did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Nothing changed since the last run.
    Skipped,
    /// The template was rendered.
    Generated {
        /// Outputs written.
        written: Vec<PathBuf>,
        /// Outputs left alone because they exist and are flagged
        /// skip-if-exists.
        kept: Vec<PathBuf>,
    },
}

impl TaskOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TaskOutcome::Skipped)
    }
}

fn io_error(path: &Path, action: &str, e: std::io::Error) -> GenError {
    GenError::Io {
        path: path.to_path_buf(),
        detail: format!("{action}: {e}"),
    }
}

/// Runs tasks against one base directory and stamp store.
#[derive(Debug, Clone)]
pub struct Generator {
    base_dir: PathBuf,
    stamps: StampStore,
    renderer: Renderer,
}

impl Generator {
    /// A generator for `base_dir`, with stamps under `cache_dir`
    /// (relative to `base_dir` unless absolute).
    pub fn new(base_dir: impl Into<PathBuf>, cache_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.into();
        Generator {
            stamps: StampStore::new(base_dir.clone(), cache_dir),
            renderer: Renderer::new(base_dir.clone()),
            base_dir,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn stamps(&self) -> &StampStore {
        &self.stamps
    }

    /// Add or replace a template global.
    pub fn set_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.renderer.set_global(name, value);
    }

    /// Delete every stamp so the next run regenerates everything.
    pub fn clear_cache(&self) -> Result<bool> {
        Ok(self.stamps.clear()?)
    }

    /// Run `tasks` in order.
    ///
    /// Configuration errors in any task abort the run before anything is
    /// written. Source and template files are checked as each task runs,
    /// so an earlier task may generate a file a later task reads.
    pub fn run(&self, tasks: &[Task]) -> Result<Vec<TaskOutcome>> {
        for task in tasks {
            task.check_config()?;
        }
        tasks.iter().map(|task| self.run_task(task)).collect()
    }

    /// Run a single task.
    pub fn run_task(&self, task: &Task) -> Result<TaskOutcome> {
        task.validate(&self.base_dir)?;
        let outputs = task.resolved_outputs()?;
        let dependencies = self.dependencies(task)?;

        if !self.is_stale(task, &outputs, &dependencies)? {
            log::debug!(
                "\"{}\" and its dependencies have not been modified, skipping",
                task.label()
            );
            return Ok(TaskOutcome::Skipped);
        }

        let entities = match &task.source {
            Some(source) => self.extract(source)?,
            None => Entities::default(),
        };

        let template_path = self.base_dir.join(&task.template);
        let template = std::fs::read_to_string(&template_path)
            .map_err(|e| io_error(&template_path, "reading template", e))?;
        let name = task.template.to_string_lossy();
        let rendered = self
            .renderer
            .render(&name, &template, &entities)
            .map_err(|e| GenError::Render {
                path: task.template.clone(),
                detail: format!("{e:#}"),
            })?;

        let mut written = Vec::new();
        let mut kept = Vec::new();
        for output in outputs {
            let full = self.base_dir.join(&output.path);
            if output.skip_if_exists && full.exists() {
                log::debug!(
                    "\"{}\" already exists and is marked skip_if_exists, leaving it",
                    output.path.display()
                );
                kept.push(output.path);
                continue;
            }
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| io_error(parent, "creating output dir", e))?;
            }
            std::fs::write(&full, &rendered).map_err(|e| io_error(&full, "writing output", e))?;
            log::info!(
                "Generated \"{}\" from \"{}\" using \"{}\"",
                output.path.display(),
                task.label(),
                task.template.display()
            );
            written.push(output.path);
        }

        self.stamps.update(&task.template)?;
        for dependency in &dependencies {
            self.stamps.update(dependency)?;
        }

        Ok(TaskOutcome::Generated { written, kept })
    }

    fn dependencies(&self, task: &Task) -> Result<BTreeSet<PathBuf>> {
        match (&task.dependencies, &task.extensions) {
            (Some(folders), Some(extensions)) => {
                Ok(dependency_files(&self.base_dir, folders, extensions))
            }
            (Some(_), None) => Err(GenError::DependenciesWithoutExtensions { task: task.label() }),
            (None, _) => Ok(BTreeSet::new()),
        }
    }

    fn is_stale(
        &self,
        task: &Task,
        outputs: &[Output],
        dependencies: &BTreeSet<PathBuf>,
    ) -> Result<bool> {
        if self.stamps.is_modified(&task.template)? {
            log::debug!("template \"{}\" modified", task.template.display());
            return Ok(true);
        }
        if let Some(missing) = outputs
            .iter()
            .find(|o| !self.base_dir.join(&o.path).exists())
        {
            log::debug!("output \"{}\" missing", missing.path.display());
            return Ok(true);
        }
        for dependency in dependencies {
            if self.stamps.is_modified(dependency)? {
                log::debug!("dependency \"{}\" modified", dependency.display());
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn extract(&self, source: &Path) -> Result<Entities> {
        let path = self.base_dir.join(source);
        let text =
            std::fs::read_to_string(&path).map_err(|e| io_error(&path, "reading source", e))?;
        let entities = Entities::from_source(&text).map_err(|e| GenError::Parse {
            path: source.to_path_buf(),
            source: e,
        })?;
        log::debug!(
            "\"{}\": {} declaration(s) extracted",
            source.display(),
            entities.len()
        );
        Ok(entities)
    }
}
