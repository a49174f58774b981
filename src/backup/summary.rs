// pgbackup/src/backup/summary.rs
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::plan::BOOTSTRAP_DATABASES;
use crate::catalog::CatalogInfo;
use crate::config::BackupConfig;

/// Writes the human-readable README.md next to the dumps so whoever picks
/// up the backup later knows what it contains and how to restore it.
pub fn write_summary(cfg: &BackupConfig, info: &CatalogInfo) -> Result<()> {
    println!("Generating README.md");

    let path = Path::new(&cfg.name).join("README.md");
    let mut fh =
        File::create(&path).with_context(|| format!("cannot open {}", path.display()))?;
    render(&mut fh, cfg, info).with_context(|| format!("cannot write {}", path.display()))
}

fn render(out: &mut impl Write, cfg: &BackupConfig, info: &CatalogInfo) -> std::io::Result<()> {
    writeln!(out, "# Backup: {}", cfg.name)?;
    writeln!(out)?;
    writeln!(out, "- Host: {}", cfg.host.as_deref().unwrap_or("(default)"))?;
    writeln!(out, "- Date: {}", cfg.timestamp.to_rfc3339())?;
    writeln!(out, "- Server version: {}", info.server_version)?;
    writeln!(out, "- Format: {}", if cfg.plain { "text" } else { "dir" })?;
    writeln!(out)?;
    writeln!(out, "## Databases")?;
    writeln!(out)?;
    for db in &info.databases {
        writeln!(out, "- {db}")?;
    }
    writeln!(out)?;
    writeln!(out, "## Restore")?;
    writeln!(out)?;
    writeln!(out, "Restore roles and tablespaces first, then the databases:")?;
    writeln!(out)?;
    writeln!(out, "```sh")?;
    writeln!(out, "psql -f \"roles.sql\"")?;
    writeln!(out, "psql -f \"tablespaces.sql\"")?;
    for db in &info.databases {
        writeln!(out, "{}", restore_hint(cfg.plain, db))?;
    }
    writeln!(out, "```")?;
    Ok(())
}

fn restore_hint(plain: bool, db: &str) -> String {
    if plain {
        format!("psql -f \"db-{db}.sql\"")
    } else {
        let create = if BOOTSTRAP_DATABASES.contains(&db) { "" } else { "-C " };
        format!("pg_restore {create}-d postgres -j 8 \"db-{db}\"")
    }
}
