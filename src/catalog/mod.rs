// pgbackup/src/catalog/mod.rs
use anyhow::{Context, Result};
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};

use crate::config::BackupConfig;

/// Server version and the connectable databases, captured once per run.
///
/// The database order is whatever the server returned; the planner and the
/// summary document both preserve it.
#[derive(Debug, Clone)]
pub struct CatalogInfo {
    pub server_version: String,
    pub databases: Vec<String>,
}

/// Connects to the cluster and reads the catalog. Explicit flags override
/// the ambient PGHOST/PGUSER/PGPASSWORD/PGDATABASE defaults sqlx picks up.
pub async fn resolve(cfg: &BackupConfig) -> Result<CatalogInfo> {
    let mut options = PgConnectOptions::new();
    if let Some(host) = &cfg.host {
        options = options.host(host);
    }
    if let Some(user) = &cfg.user {
        options = options.username(user);
    }
    if let Some(pass) = &cfg.pass {
        options = options.password(pass);
    }
    if let Some(dbname) = &cfg.dbname {
        options = options.database(dbname);
    }

    let mut conn = PgConnection::connect_with(&options)
        .await
        .context("failed to connect to the database cluster")?;

    let server_version: String = sqlx::query_scalar("SHOW server_version")
        .fetch_one(&mut conn)
        .await
        .context("failed to read server version")?;

    let databases: Vec<String> =
        sqlx::query_scalar("SELECT datname FROM pg_database WHERE datallowconn")
            .fetch_all(&mut conn)
            .await
            .context("failed to list connectable databases")?;

    conn.close().await.ok();

    Ok(CatalogInfo {
        server_version,
        databases,
    })
}
