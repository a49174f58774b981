// pgbackup/src/backup/mod.rs
pub(crate) mod plan;      // Job planning: which dump commands to run
pub(crate) mod executor;  // Parallel execution of the planned dump jobs
pub(crate) mod archive;   // Tarball creation
pub(crate) mod s3_upload; // S3 interactions
pub(crate) mod cleanup;   // Post-upload removal of local artifacts
pub(crate) mod summary;   // Human-readable README alongside the dumps

use anyhow::{Context, Result};
use std::fs;

use crate::catalog;
use crate::config::BackupConfig;

/// Which optional stages apply to this run, decided once from the flags
/// instead of re-checked at each stage entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagePlan {
    pub archive: bool,
    pub upload: bool,
}

impl StagePlan {
    pub fn from_config(cfg: &BackupConfig) -> Self {
        let upload = cfg.bucket.is_some();
        StagePlan {
            archive: cfg.compress || upload,
            upload,
        }
    }
}

/// Public entry point for the backup process.
///
/// The stages run strictly in order and fail fast: a fatal error in any
/// stage aborts everything after it. Only the executor tolerates partial
/// failure internally, and it still reports one aggregate error at its
/// stage boundary.
pub async fn run_backup_flow(cfg: &BackupConfig) -> Result<()> {
    let stages = StagePlan::from_config(cfg);

    let info = catalog::resolve(cfg).await?;

    println!("Backing up to {}", cfg.name);
    fs::create_dir_all(&cfg.name)
        .with_context(|| format!("failed to create working directory {}", cfg.name))?;

    let jobs = plan::plan_dump_jobs(cfg, &info)?;
    executor::run_dump_jobs(jobs, cfg.pg_env()).await?;

    summary::write_summary(cfg, &info)?;

    if stages.archive {
        archive::create_archive(&cfg.name, &cfg.tarball())?;
    }

    if stages.upload {
        let bucket = cfg
            .bucket
            .as_deref()
            .context("upload stage planned without a bucket")?;
        s3_upload::upload_archive(bucket, &cfg.tarball(), &cfg.upload_key()).await?;
    }

    cleanup::run_cleanup(cfg)?;
    Ok(())
}
