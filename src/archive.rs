//! Run directory archiving.
//!
//! Packs a completed run directory into a gzip-compressed tarball next to it,
//! with entries sorted by path so the same run always archives to the same
//! entry order. Unpacking restores the directory layout for inspection.

use crate::error::{CatchwordError, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

fn archive_error(message: impl Into<String>) -> CatchwordError {
    CatchwordError::Archive {
        message: message.into(),
    }
}

/// Collect every regular file under `root`, as paths relative to it, sorted.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                walk(&path, root, out)?;
            } else if let Ok(relative) = path.strip_prefix(root) {
                out.push(relative.to_path_buf());
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    walk(root, root, &mut files)
        .map_err(|e| archive_error(format!("failed to walk {}: {}", root.display(), e)))?;
    files.sort();
    Ok(files)
}

/// Pack `run_dir` into `<run_dir>.tar.gz` and return the archive path.
///
/// The directory itself is left in place; removing it after a successful
/// pack is the caller's decision.
pub fn pack_run_dir(run_dir: &Path) -> Result<PathBuf> {
    let name = run_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| archive_error(format!("unusable run directory name: {}", run_dir.display())))?;
    let archive_path = run_dir.with_extension("tar.gz");

    let file = File::create(&archive_path)
        .map_err(|e| archive_error(format!("failed to create archive: {}", e)))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for relative in collect_files(run_dir)? {
        let full = run_dir.join(&relative);
        let entry_name = Path::new(name).join(&relative);
        builder
            .append_path_with_name(&full, &entry_name)
            .map_err(|e| archive_error(format!("failed to append {}: {}", relative.display(), e)))?;
    }

    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .map_err(|e| archive_error(format!("failed to finalize archive: {}", e)))?;

    info!(archive = %archive_path.display(), "run directory packed");
    Ok(archive_path)
}

/// Unpack an archive produced by [`pack_run_dir`] into `destination`.
pub fn unpack_run_dir(archive: &Path, destination: &Path) -> Result<()> {
    let file = File::open(archive)
        .map_err(|e| archive_error(format!("failed to open archive: {}", e)))?;
    let mut reader = tar::Archive::new(GzDecoder::new(file));
    reader
        .unpack(destination)
        .map_err(|e| archive_error(format!("failed to unpack archive: {}", e)))?;
    Ok(())
}
