//! Atomic record writes for the filesystem backend.
//!
//! Roster and owner files are read by other processes at any moment, so a
//! reader must never observe a half-written pid list. Every write goes to a
//! temporary file in the same directory, is synced, and then renamed over the
//! target. `rename(2)` is atomic on POSIX when source and destination share a
//! filesystem; on Windows `std::fs::rename` replaces the destination.
//!
//! The temporary name carries the writer's pid (`.{filename}.{pid}.tmp`):
//! several processes may rewrite the same roster concurrently, and they must
//! not truncate each other's temporary file.

use crate::error::{ProcmanError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Atomically replace `path` with `content`.
///
/// The parent directory is created if it does not exist.
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            ProcmanError::storage(
                format!("failed to create directory '{}'", parent.display()),
                e,
            )
        })?;
    }

    let temp_path = generate_temp_path(path)?;
    write_and_sync(&temp_path, content)?;
    atomic_replace(&temp_path, path)
}

/// Atomically replace `path` with a string.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

fn generate_temp_path(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or(Path::new("."));
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            ProcmanError::Storage(format!("invalid record path '{}'", target.display()))
        })?;

    Ok(parent.join(format!(".{}.{}.tmp", filename, std::process::id())))
}

fn write_and_sync(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(path).map_err(|e| {
        ProcmanError::storage(
            format!("failed to create temporary file '{}'", path.display()),
            e,
        )
    })?;

    file.write_all(content).map_err(|e| {
        let _ = fs::remove_file(path);
        ProcmanError::storage("failed to write temporary file", e)
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        ProcmanError::storage("failed to sync temporary file", e)
    })
}

fn atomic_replace(source: &Path, target: &Path) -> Result<()> {
    fs::rename(source, target).map_err(|e| {
        let _ = fs::remove_file(source);
        ProcmanError::storage(
            format!("failed to atomically replace '{}'", target.display()),
            e,
        )
    })?;

    // Persist the directory entry as well.
    #[cfg(unix)]
    if let Some(parent) = target.parent()
        && let Ok(dir) = File::open(parent)
    {
        let _ = dir.sync_all();
    }

    Ok(())
}
