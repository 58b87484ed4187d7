//! Task configuration.
//!
//! A task pairs an optional C header with a template and one or more
//! outputs. Tasks without a header are *template-only*: they render with
//! empty entity collections, which is how plain configuration files are
//! produced from `*.in` templates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GenError, Result};

/// Extension that marks a template whose output path can be derived.
pub const TEMPLATE_SUFFIX: &str = ".in";

/// One unit of generation work. All paths are relative to the base
/// directory the task runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// C header to extract declarations from.
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Template rendered once per run of the task.
    pub template: PathBuf,
    /// Output files, each receiving the same rendered text.
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    /// Folders whose files trigger regeneration when modified.
    #[serde(default)]
    pub dependencies: Option<Vec<PathBuf>>,
    /// Extensions of the dependency files to watch, e.g. `".h"`.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    /// Default for outputs that do not set their own flag.
    #[serde(default)]
    pub skip_if_exists: bool,
}

/// An output as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputSpec {
    /// Bare path.
    Path(PathBuf),
    /// Path with its own skip-if-exists flag.
    Detailed {
        path: PathBuf,
        #[serde(default)]
        skip_if_exists: Option<bool>,
    },
}

impl OutputSpec {
    pub fn path(&self) -> &Path {
        match self {
            OutputSpec::Path(path) => path,
            OutputSpec::Detailed { path, .. } => path,
        }
    }
}

/// An output with its flag resolved against the task default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub path: PathBuf,
    /// Leave the file alone when it already exists.
    pub skip_if_exists: bool,
}

impl Task {
    /// A template-only task.
    pub fn new(template: impl Into<PathBuf>) -> Self {
        Task {
            source: None,
            template: template.into(),
            outputs: Vec::new(),
            dependencies: None,
            extensions: None,
            skip_if_exists: false,
        }
    }

    /// Extract declarations from `source`.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(OutputSpec::Path(path.into()));
        self
    }

    /// Add an output that is only written when it does not exist yet.
    pub fn with_kept_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(OutputSpec::Detailed {
            path: path.into(),
            skip_if_exists: Some(true),
        });
        self
    }

    pub fn with_dependencies<E: Into<String>>(
        mut self,
        folders: impl IntoIterator<Item = impl Into<PathBuf>>,
        extensions: impl IntoIterator<Item = E>,
    ) -> Self {
        self.dependencies = Some(folders.into_iter().map(Into::into).collect());
        self.extensions = Some(extensions.into_iter().map(Into::into).collect());
        self
    }

    /// Short name used in messages: the header, or the template for
    /// template-only tasks.
    pub fn label(&self) -> String {
        self.source
            .as_deref()
            .unwrap_or(&self.template)
            .display()
            .to_string()
    }

    /// The outputs to write, with flags resolved.
    ///
    /// A task without outputs whose template ends in `.in` writes to the
    /// template path minus that suffix.
    pub fn resolved_outputs(&self) -> Result<Vec<Output>> {
        if self.outputs.is_empty() {
            let template = self.template.to_string_lossy();
            return match template.strip_suffix(TEMPLATE_SUFFIX) {
                Some(stem) if !stem.is_empty() => Ok(vec![Output {
                    path: PathBuf::from(stem),
                    skip_if_exists: self.skip_if_exists,
                }]),
                _ => Err(GenError::NoOutputs { task: self.label() }),
            };
        }

        Ok(self
            .outputs
            .iter()
            .map(|spec| Output {
                path: spec.path().to_path_buf(),
                skip_if_exists: match spec {
                    OutputSpec::Detailed {
                        skip_if_exists: Some(flag),
                        ..
                    } => *flag,
                    _ => self.skip_if_exists,
                },
            })
            .collect())
    }

    /// Check the configuration errors that do not depend on the
    /// filesystem.
    pub fn check_config(&self) -> Result<()> {
        if self.dependencies.is_some() && self.extensions.is_none() {
            return Err(GenError::DependenciesWithoutExtensions { task: self.label() });
        }
        self.resolved_outputs()?;
        Ok(())
    }

    /// Check the fatal preconditions against `base_dir`.
    ///
    /// Source and template existence is only meaningful once earlier tasks
    /// have run, since a task may render the header a later task reads.
    pub fn validate(&self, base_dir: &Path) -> Result<()> {
        self.check_config()?;
        if let Some(source) = &self.source {
            let path = base_dir.join(source);
            if !path.is_file() {
                return Err(GenError::MissingSource { path });
            }
        }
        let template = base_dir.join(&self.template);
        if !template.is_file() {
            return Err(GenError::MissingTemplate { path: template });
        }
        Ok(())
    }
}
