//! `annogen.toml` manifest parsing and project configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use annogen_gen::generate::DEFAULT_CACHE_DIR;
use annogen_gen::{Generator, Task};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File name searched for when no `--config` is given.
pub const MANIFEST_NAME: &str = "annogen.toml";

/// The top-level manifest structure for an annogen project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnogenManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    /// Extra template globals.
    #[serde(default)]
    pub vars: BTreeMap<String, serde_json::Value>,
    /// Generation tasks, run in declared order.
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Project metadata section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required).
    pub name: String,
    /// Stamp directory, relative to the manifest directory.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

impl AnnogenManifest {
    /// Search upward from `start_dir` for an `annogen.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_NAME);
            if candidate.is_file() {
                let manifest = Self::load(&candidate)?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse the manifest at `path`. Files ending in `.json` use the JSON
    /// layout of the same schema; everything else is TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        } else {
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
        }
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing annogen.toml")
    }

    /// A generator rooted at `base_dir` with this manifest's cache
    /// directory and `[vars]` globals.
    pub fn generator(&self, base_dir: &Path) -> Generator {
        let mut generator = Generator::new(base_dir, &self.project.cache_dir);
        for (name, value) in &self.vars {
            generator.set_global(name.clone(), minijinja::Value::from_serialize(value));
        }
        generator
    }
}

/// Locate the manifest: `config` when given (its directory becomes the
/// base directory), otherwise the nearest `annogen.toml` above `cwd`.
pub fn resolve(cwd: &Path, config: Option<&Path>) -> Result<(AnnogenManifest, PathBuf)> {
    if let Some(path) = config {
        let path = cwd.join(path);
        let manifest = AnnogenManifest::load(&path)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());
        return Ok((manifest, base_dir));
    }
    AnnogenManifest::find_and_load(cwd)?.with_context(|| {
        format!(
            "no {MANIFEST_NAME} found in {} or any parent directory",
            cwd.display()
        )
    })
}
