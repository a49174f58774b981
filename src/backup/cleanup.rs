// pgbackup/src/backup/cleanup.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::BackupConfig;

/// What cleanup removes, as a total function of the run flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupAction {
    /// Nothing was requested, or nothing redundant was produced.
    Nothing,
    /// The backup was uploaded; both the archive and the working directory
    /// are redundant local copies.
    RemoveAll,
    /// The archive is the user's deliverable; only the working directory
    /// duplicates it.
    RemoveWorkdir,
}

impl CleanupAction {
    pub fn decide(clean: bool, uploaded: bool, compressed: bool) -> Self {
        match (clean, uploaded, compressed) {
            (false, _, _) => CleanupAction::Nothing,
            (true, true, _) => CleanupAction::RemoveAll,
            (true, false, true) => CleanupAction::RemoveWorkdir,
            // Without an archive, the working directory is the only
            // deliverable; removing it would destroy the backup.
            (true, false, false) => CleanupAction::Nothing,
        }
    }
}

/// Evaluated once at the end of a successful run. Removal errors are fatal
/// and reported as-is; there is no rollback of a partial cleanup.
pub fn run_cleanup(cfg: &BackupConfig) -> Result<()> {
    let action = CleanupAction::decide(cfg.clean, cfg.bucket.is_some(), cfg.compress);
    apply(action, &cfg.tarball(), &cfg.name)?;
    println!("Done!");
    Ok(())
}

fn apply(action: CleanupAction, tarball: &str, workdir: &str) -> Result<()> {
    if action == CleanupAction::Nothing {
        return Ok(());
    }

    println!("Cleaning up");
    if action == CleanupAction::RemoveAll {
        remove(Path::new(tarball))?;
    }
    remove(Path::new(workdir))
}

fn remove(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
    .with_context(|| format!("failed to remove {}", path.display()))
}
