// pgbackup/src/backup/plan.rs
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use which::which;

use crate::catalog::CatalogInfo;
use crate::config::BackupConfig;

/// Databases that always exist in a cluster. Their dumps must not carry the
/// create-database instruction: a restore would otherwise try to drop and
/// recreate a database the cluster cannot live without.
pub const BOOTSTRAP_DATABASES: [&str; 2] = ["postgres", "template1"];

/// Internal worker count pg_dump uses in directory mode.
const DUMP_WORKERS: &str = "8";

/// One planned external dump invocation. Created once per run, executed by
/// exactly one task, never reused.
#[derive(Debug, Clone)]
pub struct DumpJob {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Plans the full job list: roles and tablespaces first, then one job per
/// database in the order the catalog returned them.
pub fn plan_dump_jobs(cfg: &BackupConfig, info: &CatalogInfo) -> Result<Vec<DumpJob>> {
    let pg_dumpall = which("pg_dumpall")
        .context("pg_dumpall not found in PATH. Please ensure PostgreSQL client tools are installed.")?;
    let pg_dump = which("pg_dump")
        .context("pg_dump not found in PATH. Please ensure PostgreSQL client tools are installed.")?;

    Ok(plan_with_programs(cfg, info, &pg_dumpall, &pg_dump))
}

fn plan_with_programs(
    cfg: &BackupConfig,
    info: &CatalogInfo,
    pg_dumpall: &Path,
    pg_dump: &Path,
) -> Vec<DumpJob> {
    let mut jobs = Vec::with_capacity(info.databases.len() + 2);

    for (name, only_flag) in [("roles", "--roles-only"), ("tablespaces", "--tablespaces-only")] {
        let target = Path::new(&cfg.name).join(format!("{name}.sql"));
        jobs.push(DumpJob {
            name: name.to_string(),
            program: pg_dumpall.to_path_buf(),
            args: vec![
                only_flag.to_string(),
                "-f".to_string(),
                target.to_string_lossy().into_owned(),
            ],
        });
    }

    for db in &info.databases {
        jobs.push(database_job(cfg, pg_dump, db));
    }

    jobs
}

fn database_job(cfg: &BackupConfig, pg_dump: &Path, db: &str) -> DumpJob {
    let mut args = Vec::new();
    if !BOOTSTRAP_DATABASES.contains(&db) {
        args.push("-C".to_string());
    }

    args.push("-F".to_string());
    let ext = if cfg.plain {
        // Plain format has no internal parallelism.
        args.push("p".to_string());
        ".sql"
    } else {
        args.push("d".to_string());
        args.push("-j".to_string());
        args.push(DUMP_WORKERS.to_string());
        ""
    };

    let target = Path::new(&cfg.name).join(format!("db-{db}{ext}"));
    args.push("-f".to_string());
    args.push(target.to_string_lossy().into_owned());
    args.push(db.to_string());

    DumpJob {
        name: format!("{db} database"),
        program: pg_dump.to_path_buf(),
        args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_config(plain: bool) -> BackupConfig {
        BackupConfig {
            name: "acme".to_string(),
            host: None,
            dbname: None,
            user: None,
            pass: None,
            bucket: None,
            dir: None,
            chdir: None,
            compress: false,
            plain,
            clean: false,
            timestamp: Utc::now(),
        }
    }

    fn test_catalog(databases: &[&str]) -> CatalogInfo {
        CatalogInfo {
            server_version: "16.3".to_string(),
            databases: databases.iter().map(|db| db.to_string()).collect(),
        }
    }

    fn plan(cfg: &BackupConfig, info: &CatalogInfo) -> Vec<DumpJob> {
        plan_with_programs(cfg, info, Path::new("pg_dumpall"), Path::new("pg_dump"))
    }

    fn target_of(job: &DumpJob) -> &str {
        // Target path is the argument right after -f; the trailing argument
        // is the database name for pg_dump jobs.
        let f = job.args.iter().position(|a| a == "-f").unwrap();
        &job.args[f + 1]
    }

    #[test]
    fn test_globals_precede_databases_in_catalog_order() {
        let info = test_catalog(&["postgres", "template1", "app"]);
        let jobs = plan(&test_config(false), &info);

        let names: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "roles",
                "tablespaces",
                "postgres database",
                "template1 database",
                "app database",
            ]
        );
    }

    #[test]
    fn test_empty_database_list_yields_only_globals() {
        let jobs = plan(&test_config(false), &test_catalog(&[]));
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "roles");
        assert_eq!(jobs[1].name, "tablespaces");
    }

    #[test]
    fn test_global_jobs_write_sql_files() {
        let jobs = plan(&test_config(false), &test_catalog(&[]));
        assert_eq!(target_of(&jobs[0]), "acme/roles.sql");
        assert_eq!(target_of(&jobs[1]), "acme/tablespaces.sql");
        assert!(jobs[0].args.contains(&"--roles-only".to_string()));
        assert!(jobs[1].args.contains(&"--tablespaces-only".to_string()));
    }

    #[test]
    fn test_bootstrap_databases_omit_create_flag() {
        let info = test_catalog(&["postgres", "template1", "app"]);
        let jobs = plan(&test_config(false), &info);

        for job in &jobs[2..] {
            let has_create = job.args.contains(&"-C".to_string());
            if job.name == "app database" {
                assert!(has_create, "expected -C for {}", job.name);
            } else {
                assert!(!has_create, "unexpected -C for {}", job.name);
            }
        }
    }

    #[test]
    fn test_directory_mode_uses_parallel_workers() {
        let info = test_catalog(&["app"]);
        let jobs = plan(&test_config(false), &info);
        let job = &jobs[2];

        assert!(job.args.windows(2).any(|w| w == ["-F", "d"]));
        assert!(job.args.windows(2).any(|w| w == ["-j", "8"]));
        assert_eq!(target_of(job), "acme/db-app");
    }

    #[test]
    fn test_plain_mode_writes_sql_files_serially() {
        let info = test_catalog(&["postgres", "template1", "app"]);
        let jobs = plan(&test_config(true), &info);

        for job in &jobs[2..] {
            assert!(job.args.windows(2).any(|w| w == ["-F", "p"]));
            assert!(!job.args.contains(&"-j".to_string()));
            assert!(target_of(job).ends_with(".sql"));
        }
        assert_eq!(target_of(&jobs[4]), "acme/db-app.sql");
    }
}
