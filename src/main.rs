//! PostgreSQL Cluster Backup Tool
//!
//! Dumps roles, tablespaces and every connectable database in parallel,
//! then optionally archives the result and uploads it to S3.

// pgbackup/src/main.rs
mod errors;
mod config;
mod catalog;
mod backup;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use config::BackupConfig;
use std::path::PathBuf;
use std::process::ExitCode;

const EXIT_USAGE: u8 = 1;
const EXIT_RUNTIME: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "pgbackup", version, about = "Back up a PostgreSQL cluster to disk and S3")]
struct Args {
    /// Backup name (working directory and archive base name)
    #[arg(long)]
    name: String,

    /// Database host name
    #[arg(long)]
    host: Option<String>,

    /// Alternative default database
    #[arg(long)]
    dbname: Option<String>,

    /// Database username
    #[arg(long)]
    user: Option<String>,

    /// Database password
    #[arg(long)]
    pass: Option<String>,

    /// S3 bucket name
    #[arg(long)]
    bucket: Option<String>,

    /// S3 bucket directory
    #[arg(long)]
    dir: Option<String>,

    /// Directory to work in
    #[arg(long = "cd")]
    chdir: Option<PathBuf>,

    /// Compress the backup even without --bucket
    #[arg(long)]
    compress: bool,

    /// Plain text format
    #[arg(long = "text")]
    plain: bool,

    /// Delete local files after upload
    #[arg(long)]
    clean: bool,
}

/// Main entry point for the backup tool
#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let code = if err.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    let cfg = BackupConfig {
        name: args.name,
        host: args.host,
        dbname: args.dbname,
        user: args.user,
        pass: args.pass,
        bucket: args.bucket,
        dir: args.dir,
        chdir: args.chdir,
        compress: args.compress,
        plain: args.plain,
        clean: args.clean,
        timestamp: Utc::now(),
    }
    .normalized();

    if let Err(err) = cfg.validate() {
        eprintln!("❌ {err}");
        return ExitCode::from(EXIT_USAGE);
    }

    match run_app(&cfg).await {
        Ok(_) => {
            println!("✅ Backup completed successfully.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("❌ Error: {err:?}");
            ExitCode::from(EXIT_RUNTIME)
        }
    }
}

async fn run_app(cfg: &BackupConfig) -> Result<()> {
    if let Some(dir) = &cfg.chdir {
        println!("Switching to {}", dir.display());
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to switch to {}", dir.display()))?;
    }

    backup::run_backup_flow(cfg).await
}
