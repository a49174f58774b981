// pgbackup/src/backup/executor.rs
use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::process::Command;

use super::plan::DumpJob;
use crate::errors::PipelineError;

/// Outcome slot for one job, written exactly once by its owning task.
#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub success: bool,
}

/// Runs every planned job concurrently and waits for all of them.
///
/// A failing job never cancels its siblings: one database's transient
/// failure must not abort an otherwise-successful cluster-wide backup.
/// Per-job failures are reported as they complete; the stage result only
/// says that at least one job failed.
pub async fn run_dump_jobs(jobs: Vec<DumpJob>, env: Vec<(String, String)>) -> Result<()> {
    let outcomes = execute_all(jobs, env).await?;

    let failed = outcomes.iter().filter(|outcome| !outcome.success).count();
    if failed > 0 {
        return Err(PipelineError::DumpJobsFailed {
            failed,
            total: outcomes.len(),
        }
        .into());
    }
    Ok(())
}

/// Unbounded fan-out: one task per job, all spawned up front, then a join
/// barrier. Each task writes into its own slot keyed by job index.
async fn execute_all(jobs: Vec<DumpJob>, env: Vec<(String, String)>) -> Result<Vec<JobOutcome>> {
    let total = jobs.len();
    let mut handles = Vec::with_capacity(total);
    for (index, job) in jobs.into_iter().enumerate() {
        let env = env.clone();
        handles.push((index, tokio::spawn(async move { run_job(job, env).await })));
    }

    let mut slots: Vec<Option<JobOutcome>> = (0..total).map(|_| None).collect();
    for (index, handle) in handles {
        let outcome = handle.await.context("dump job task panicked")?;
        slots[index] = Some(outcome);
    }

    slots
        .into_iter()
        .map(|slot| slot.context("dump job finished without an outcome"))
        .collect()
}

async fn run_job(job: DumpJob, env: Vec<(String, String)>) -> JobOutcome {
    println!("  Dumping {}", job.name);

    // Credentials are per-process copies layered over the inherited
    // environment; the dump output streams straight to our own stdio.
    let status = Command::new(&job.program)
        .args(&job.args)
        .envs(env)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await;

    let name = job.name;
    match status {
        Ok(status) if status.success() => {
            println!("  Successfully dumped {name}");
            JobOutcome { name, success: true }
        }
        Ok(status) => {
            eprintln!("  Failed to dump {name} ({status})");
            JobOutcome { name, success: false }
        }
        Err(err) => {
            eprintln!("  Failed to dump {name}: {err}");
            JobOutcome { name, success: false }
        }
    }
}
