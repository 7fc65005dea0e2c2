use crate::core::store::{copy_file, VersionedStore};
use crate::domain::model::BackupReport;
use crate::utils::error::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

/// Copy every regular file in `processed_dir` into a new
/// `<backups>/<date>[_v#]/` directory. Subdirectories are not descended.
pub fn backup_processed_dir(
    processed_dir: &Path,
    backups: &VersionedStore,
    date: NaiveDate,
) -> Result<BackupReport> {
    // List first so a missing processed dir leaves no empty backup behind.
    let mut entries = fs::read_dir(processed_dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let directory = backups.resolve_dir(date, true)?;
    tracing::info!(
        "Backing up {} into {}",
        processed_dir.display(),
        directory.display()
    );

    let mut files = Vec::new();
    let mut skipped = Vec::new();
    for entry in entries {
        let source = entry.path();
        // Follows symlinks; a dangling link is skipped like a directory.
        let is_file = fs::metadata(&source).map(|m| m.is_file()).unwrap_or(false);
        if !is_file {
            tracing::warn!("Skipping {}: not a regular file", source.display());
            skipped.push(source);
            continue;
        }

        let target = directory.join(entry.file_name());
        let size = copy_file(&source, &target)?;
        tracing::debug!("Copied {} ({} bytes)", target.display(), size);
        files.push(target);
    }

    tracing::info!("Backed up {} file(s)", files.len());
    Ok(BackupReport {
        directory,
        files,
        skipped,
    })
}
