// pgbackup/src/config/mod.rs
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use std::env;
use std::path::PathBuf;

/// Configuration for one backup run. Built once from the CLI flags and never
/// mutated afterwards; the name is the single source of truth for the
/// working directory, the archive base name and the default upload key.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub name: String,
    pub host: Option<String>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub bucket: Option<String>,
    pub dir: Option<String>,
    pub chdir: Option<PathBuf>,
    pub compress: bool,
    pub plain: bool,
    pub clean: bool,
    pub timestamp: DateTime<Utc>,
}

impl BackupConfig {
    /// Collapses empty optional flag values to `None` so the rest of the
    /// pipeline only has to check for presence.
    pub fn normalized(mut self) -> Self {
        self.host = self.host.filter(|s| !s.is_empty());
        self.dbname = self.dbname.filter(|s| !s.is_empty());
        self.user = self.user.filter(|s| !s.is_empty());
        self.pass = self.pass.filter(|s| !s.is_empty());
        self.bucket = self.bucket.filter(|s| !s.is_empty());
        self.dir = self.dir.filter(|s| !s.is_empty());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("--name must not be empty");
        }
        if self.name == "." || self.name == ".." || self.name.contains(['/', '\\', '\0']) {
            bail!("--name must be a plain directory name, got {:?}", self.name);
        }
        Ok(())
    }

    /// Local archive file name.
    pub fn tarball(&self) -> String {
        format!("{}.tar.gz", self.name)
    }

    /// Key the archive is stored under in the destination bucket.
    pub fn upload_key(&self) -> String {
        match &self.dir {
            Some(dir) => format!("{}/{}", dir, self.tarball()),
            None => self.tarball(),
        }
    }

    /// Connection environment for the dump processes. Explicit flag values
    /// win; ambient libpq variables are used only as fallback.
    pub fn pg_env(&self) -> Vec<(String, String)> {
        merge_env(
            &[
                ("PGHOST", self.host.as_deref()),
                ("PGUSER", self.user.as_deref()),
                ("PGPASSWORD", self.pass.as_deref()),
            ],
            |var| env::var(var).ok(),
        )
    }
}

fn merge_env<F>(explicit: &[(&str, Option<&str>)], inherited: F) -> Vec<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut merged = Vec::new();
    for &(var, explicit_value) in explicit {
        if let Some(value) = explicit_value.filter(|v| !v.is_empty()) {
            merged.push((var.to_string(), value.to_string()));
        } else if let Some(value) = inherited(var).filter(|v| !v.is_empty()) {
            merged.push((var.to_string(), value));
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(name: &str) -> BackupConfig {
        BackupConfig {
            name: name.to_string(),
            host: None,
            dbname: None,
            user: None,
            pass: None,
            bucket: None,
            dir: None,
            chdir: None,
            compress: false,
            plain: false,
            clean: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_tarball_name() {
        assert_eq!(test_config("acme").tarball(), "acme.tar.gz");
    }

    #[test]
    fn test_upload_key_without_dir() {
        assert_eq!(test_config("acme").upload_key(), "acme.tar.gz");
    }

    #[test]
    fn test_upload_key_with_dir() {
        let mut cfg = test_config("acme");
        cfg.dir = Some("staging/backups".to_string());
        assert_eq!(cfg.upload_key(), "staging/backups/acme.tar.gz");
    }

    #[test]
    fn test_normalized_collapses_empty_values() {
        let mut cfg = test_config("acme");
        cfg.bucket = Some(String::new());
        cfg.dir = Some(String::new());
        cfg.host = Some("db.internal".to_string());
        let cfg = cfg.normalized();

        assert_eq!(cfg.bucket, None);
        assert_eq!(cfg.dir, None);
        assert_eq!(cfg.host.as_deref(), Some("db.internal"));
    }

    #[test]
    fn test_validate_rejects_bad_names() {
        assert!(test_config("").validate().is_err());
        assert!(test_config("   ").validate().is_err());
        assert!(test_config("..").validate().is_err());
        assert!(test_config("a/b").validate().is_err());
        assert!(test_config("nightly-2026-08-30").validate().is_ok());
    }

    #[test]
    fn test_merge_env_explicit_wins() {
        let merged = merge_env(&[("PGUSER", Some("admin"))], |_| Some("ambient".to_string()));
        assert_eq!(merged, vec![("PGUSER".to_string(), "admin".to_string())]);
    }

    #[test]
    fn test_merge_env_falls_back_to_inherited() {
        let merged = merge_env(&[("PGHOST", None)], |var| {
            (var == "PGHOST").then(|| "db.internal".to_string())
        });
        assert_eq!(merged, vec![("PGHOST".to_string(), "db.internal".to_string())]);
    }

    #[test]
    fn test_merge_env_skips_unset_variables() {
        let merged = merge_env(
            &[("PGHOST", None), ("PGUSER", Some("admin")), ("PGPASSWORD", None)],
            |_| None,
        );
        assert_eq!(merged, vec![("PGUSER".to_string(), "admin".to_string())]);
    }
}
