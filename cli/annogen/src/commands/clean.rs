//! `annogen clean`: remove all stamps.

use std::path::Path;

use anyhow::Result;

use crate::manifest::AnnogenManifest;

/// Delete the stamp directory so the next `generate` rebuilds everything.
pub fn run(manifest: &AnnogenManifest, base_dir: &Path) -> Result<()> {
    let generator = manifest.generator(base_dir);
    let root = generator.stamps().root().to_path_buf();
    let count = generator.stamps().count();
    if generator.clear_cache()? {
        println!("Removed {} ({count} stamp(s))", root.display());
    } else {
        println!("Already clean: {} does not exist", root.display());
    }
    Ok(())
}
