// pgbackup/src/backup/s3_upload.rs
use anyhow::{Context, Result};
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use s3::types::{ChecksumAlgorithm, ServerSideEncryption};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::errors::PipelineError;

const CONTENT_TYPE: &str = "application/gzip";

/// How long to wait for the uploaded object to become visible, and how
/// often to look.
const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60 * 60);
const CONFIRMATION_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Uploads the archive to the bucket under the given key and blocks until
/// the object is confirmed present at the destination.
pub async fn upload_archive(bucket: &str, file: &str, key: &str) -> Result<()> {
    print!("Uploading {file}...");
    io::stdout().flush().ok();

    let sdk_config = aws_config::load_defaults(s3::config::BehaviorVersion::latest()).await;
    let client = s3::Client::new(&sdk_config);

    match transmit(&client, bucket, Path::new(file), key).await {
        Ok(()) => {
            println!("Success");
            Ok(())
        }
        Err(err) => {
            println!("Failed");
            Err(err)
        }
    }
}

async fn transmit(client: &s3::Client, bucket: &str, file: &Path, key: &str) -> Result<()> {
    let body = ByteStream::from_path(file)
        .await
        .with_context(|| format!("cannot open {}", file.display()))?;

    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body)
        .checksum_algorithm(ChecksumAlgorithm::Sha256)
        .server_side_encryption(ServerSideEncryption::Aes256)
        .content_type(CONTENT_TYPE)
        .send()
        .await
        .with_context(|| {
            format!(
                "failed to upload {} to s3://{bucket}/{key}",
                file.display()
            )
        })?;

    wait_until_visible(client, bucket, key).await
}

/// Polls head_object until the object shows up. Guards against transports
/// that report success before the object is actually readable.
async fn wait_until_visible(client: &s3::Client, bucket: &str, key: &str) -> Result<()> {
    let deadline = Instant::now() + CONFIRMATION_TIMEOUT;
    loop {
        match client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => return Ok(()),
            Err(_) if Instant::now() >= deadline => {
                return Err(PipelineError::ConfirmationTimeout {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                }
                .into());
            }
            // Not visible yet; keep looking until the deadline.
            Err(_) => sleep(CONFIRMATION_POLL_INTERVAL).await,
        }
    }
}
