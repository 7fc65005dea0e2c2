//! Dated, versioned directories and write-once files.
//!
//! Layout: `<base>/<YYYY-MM-DD>[_v<n>]/<filename>`. The first directory for
//! a date has no suffix (version 1); later ones are `_v2`, `_v3`, ...

use crate::utils::error::{RefreshError, Result};
use chrono::NaiveDate;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parsed name of a versioned directory. Orders by date, then by the
/// numeric version, so `_v10` comes after `_v2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionedDirName {
    pub date: NaiveDate,
    pub version: u32,
}

impl VersionedDirName {
    pub fn new(date: NaiveDate, version: u32) -> Self {
        Self { date, version }
    }

    /// Parse `<YYYY-MM-DD>` or `<YYYY-MM-DD>_v<n>` with `n >= 2`.
    pub fn parse(name: &str) -> Option<Self> {
        let (date_part, version) = match name.split_once("_v") {
            Some((date_part, suffix)) => {
                if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let version: u32 = suffix.parse().ok()?;
                if version < 2 {
                    return None;
                }
                (date_part, version)
            }
            None => (name, 1),
        };

        // Reject forms chrono would accept leniently, like "2021-3-1".
        if date_part.len() != 10 {
            return None;
        }
        let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()?;
        Some(Self { date, version })
    }
}

impl fmt::Display for VersionedDirName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format(DATE_FORMAT))?;
        if self.version > 1 {
            write!(f, "_v{}", self.version)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedStore {
    base_dir: PathBuf,
}

impl VersionedStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Create and return the directory that a run for `date` writes into.
    ///
    /// With `versioned`, an existing `<date>` entry pushes the run to the
    /// first unused `<date>_v<n>`. Without it, `<date>` is reused as is.
    pub fn resolve_dir(&self, date: NaiveDate, versioned: bool) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir)?;

        if !versioned {
            let dir = self.base_dir.join(VersionedDirName::new(date, 1).to_string());
            fs::create_dir_all(&dir)?;
            tracing::debug!("Using unversioned directory {}", dir.display());
            return Ok(dir);
        }

        let mut version = 1;
        loop {
            let dir = self
                .base_dir
                .join(VersionedDirName::new(date, version).to_string());
            // create_dir fails on any existing entry, which claims the name
            // and skips stray files at once.
            match fs::create_dir(&dir) {
                Ok(()) => {
                    tracing::debug!("Created versioned directory {}", dir.display());
                    return Ok(dir);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!("{} already exists", dir.display());
                    version += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// The directory `resolve_dir` would return right now, without creating
    /// anything.
    pub fn peek_dir(&self, date: NaiveDate, versioned: bool) -> PathBuf {
        let mut version = 1;
        loop {
            let dir = self
                .base_dir
                .join(VersionedDirName::new(date, version).to_string());
            if !versioned || !dir.exists() {
                return dir;
            }
            version += 1;
        }
    }

    /// Name of the latest versioned directory, across all dates.
    pub fn latest_directory(&self) -> Result<String> {
        self.versioned_dirs()?
            .into_iter()
            .max()
            .map(|name| name.to_string())
            .ok_or_else(|| RefreshError::NoVersionedDirectory {
                dir: self.base_dir.clone(),
                date: None,
            })
    }

    /// Name of the latest versioned directory for `date`.
    pub fn latest_directory_for_date(&self, date: NaiveDate) -> Result<String> {
        self.versioned_dirs()?
            .into_iter()
            .filter(|name| name.date == date)
            .max()
            .map(|name| name.to_string())
            .ok_or_else(|| RefreshError::NoVersionedDirectory {
                dir: self.base_dir.clone(),
                date: Some(date.format(DATE_FORMAT).to_string()),
            })
    }

    /// Subdirectories whose names parse as versioned directories. Anything
    /// else in the base directory is ignored.
    fn versioned_dirs(&self) -> Result<Vec<VersionedDirName>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if let Some(parsed) = VersionedDirName::parse(&name) {
                // "2021-03-01_v02" parses to the same key as "_v2"; only
                // canonical names count.
                if parsed.to_string() == name {
                    names.push(parsed);
                }
            }
        }
        Ok(names)
    }
}

/// Write `content` as UTF-8 to a file that must not exist yet.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    write_new(path, content.as_bytes())
}

/// Copy `source` to `target`, refusing to replace an existing target.
pub fn copy_file(source: &Path, target: &Path) -> Result<u64> {
    let data = fs::read(source)?;
    write_new(target, &data)?;
    Ok(data.len() as u64)
}

fn write_new(path: &Path, data: &[u8]) -> Result<()> {
    write_new_with(path, data, |file, data| {
        file.write_all(data)?;
        file.sync_all()
    })
}

/// Creates `path` and hands it to `fill`. A failed fill removes the file so
/// a partial write never blocks the next attempt at the same path.
fn write_new_with<W>(path: &Path, data: &[u8], fill: W) -> Result<()>
where
    W: FnOnce(&mut fs::File, &[u8]) -> std::io::Result<()>,
{
    let mut file = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(RefreshError::FileExists {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = fill(&mut file, data) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!("Could not remove partial {}: {}", path.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}
