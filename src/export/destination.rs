//! Destination resolution for export operations
//!
//! Derives the dump file name and prepares the backup folder before the
//! pipeline opens any cursor.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::fs;
use tracing::{error, info};

use crate::error::{ExportError, Result};

/// Derive the dump file path for one export job
///
/// The name is deterministic given its inputs:
/// `{index}-{typeOrAllTypes}-{YYYY-MM-DD-HH-mm-ss}-dump.json`, stamped at
/// job start. Two runs in the same second collide on the same name; that
/// is an accepted limitation of the naming scheme.
///
/// # Arguments
/// * `folder` - Backup folder the file lives in
/// * `index` - Index being dumped
/// * `doc_type` - Optional mapping type filter, `all-types` when absent
/// * `started_at` - Job start time
pub fn dump_file_name(
    folder: &Path,
    index: &str,
    doc_type: Option<&str>,
    started_at: DateTime<Local>,
) -> PathBuf {
    folder.join(format!(
        "{}-{}-{}-dump.json",
        index,
        doc_type.unwrap_or("all-types"),
        started_at.format("%Y-%m-%d-%H-%M-%S")
    ))
}

/// Make sure the backup folder exists and is writable
///
/// Creates the folder recursively when absent. Fails with
/// `FolderUnavailable` when it cannot be created, is not a directory, or
/// is not writable — all before any cursor is opened.
///
/// # Arguments
/// * `folder` - Backup folder path
///
/// # Returns
/// * `Result<()>` - Ready, or `FolderUnavailable`
pub async fn ensure_backup_folder(folder: &Path) -> Result<()> {
    let existed = folder.exists();

    if let Err(e) = fs::create_dir_all(folder).await {
        error!(
            "Backup folder {} is missing and could not be created: {}",
            folder.display(),
            e
        );
        return Err(ExportError::FolderUnavailable(folder.display().to_string()).into());
    }

    let metadata = fs::metadata(folder)
        .await
        .map_err(|_| ExportError::FolderUnavailable(folder.display().to_string()))?;

    if !metadata.is_dir() || metadata.permissions().readonly() {
        error!(
            "Backup folder {} is not a writable directory",
            folder.display()
        );
        return Err(ExportError::FolderUnavailable(folder.display().to_string()).into());
    }

    if existed {
        info!(
            "Backup folder {} already exists and is writable",
            folder.display()
        );
    } else {
        info!("Backup folder {} was missing, created it", folder.display());
    }
    Ok(())
}
