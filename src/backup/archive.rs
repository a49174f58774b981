// pgbackup/src/backup/archive.rs
use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tar::Builder;
use walkdir::WalkDir;

/// Bundles the working directory into a gzipped tarball.
///
/// Entries are stored under the directory's own name, so the archive
/// unpacks back to `<name>/...`. The working directory is left in place;
/// cleanup decides later whether it survives the run.
pub fn create_archive(source_dir: &str, archive_path: &str) -> Result<()> {
    print!("Archiving {archive_path}...");
    io::stdout().flush().ok();

    match build_archive(Path::new(source_dir), Path::new(archive_path)) {
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

fn build_archive(source_dir: &Path, archive_path: &Path) -> Result<()> {
    if !source_dir.is_dir() {
        bail!(
            "source for archival is not a directory: {}",
            source_dir.display()
        );
    }

    let archive_file = File::create(archive_path).with_context(|| {
        format!("failed to create archive file: {}", archive_path.display())
    })?;
    let enc = GzEncoder::new(archive_file, Compression::default());
    let mut builder = Builder::new(enc);

    // Prefix every entry with the directory name itself.
    let root = source_dir.file_name().map(Path::new).unwrap_or(source_dir);

    for entry in WalkDir::new(source_dir) {
        let entry = entry
            .with_context(|| format!("failed to walk directory: {}", source_dir.display()))?;
        let path = entry.path();
        let relative = path.strip_prefix(source_dir).with_context(|| {
            format!(
                "failed to strip prefix {} from {}",
                source_dir.display(),
                path.display()
            )
        })?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = root.join(relative);

        if path.is_dir() {
            builder.append_dir(&name, path).with_context(|| {
                format!("failed to append directory {} to archive", path.display())
            })?;
        } else if path.is_file() {
            builder.append_path_with_name(path, &name).with_context(|| {
                format!("failed to append file {} to archive", path.display())
            })?;
        }
    }

    let enc = builder
        .into_inner()
        .context("failed to finalize tar stream")?;
    enc.finish().context("failed to finish gzip encoding")?;
    Ok(())
}
