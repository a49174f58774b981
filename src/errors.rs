// pgbackup/src/errors.rs
use thiserror::Error;

/// Failure kinds the pipeline distinguishes beyond plain error context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// At least one dump process exited non-zero. Per-job details were
    /// already reported as progress output when the job completed.
    #[error("{failed} of {total} dump jobs failed")]
    DumpJobsFailed { failed: usize, total: usize },

    /// The uploaded archive never became visible at the destination.
    #[error("timed out waiting for s3://{bucket}/{key} to become visible")]
    ConfirmationTimeout { bucket: String, key: String },
}
