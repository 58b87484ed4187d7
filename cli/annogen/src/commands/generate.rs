//! `annogen generate`: run every configured task.

use std::path::Path;

use annogen_gen::TaskOutcome;
use anyhow::{Context, Result};

use crate::manifest::AnnogenManifest;

/// Counts reported after a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub generated: usize,
    pub skipped: usize,
}

impl Summary {
    fn from_outcomes(outcomes: &[TaskOutcome]) -> Self {
        let skipped = outcomes.iter().filter(|o| o.is_skipped()).count();
        Summary {
            generated: outcomes.len() - skipped,
            skipped,
        }
    }
}

/// Run the manifest's tasks from `base_dir`. With `reload`, every stamp
/// is cleared first so all tasks regenerate.
pub fn run(manifest: &AnnogenManifest, base_dir: &Path, reload: bool) -> Result<Summary> {
    let generator = manifest.generator(base_dir);
    if reload && generator.clear_cache()? {
        log::info!("Cleared {}", generator.stamps().root().display());
    }

    let outcomes = generator
        .run(&manifest.tasks)
        .with_context(|| format!("generating project '{}'", manifest.project.name))?;
    let summary = Summary::from_outcomes(&outcomes);
    println!(
        "{}: {} generated, {} up to date",
        manifest.project.name, summary.generated, summary.skipped
    );
    Ok(summary)
}
