//! The backup directory below the store's file directory.
//!
//! Backups written without an explicit output path are named
//! `<DOMAIN>.<yyyy-MM-dd-HHmm>.liquidsite` and kept in `<files>/backup`.

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use sitevault_core::Domain;
use walkdir::WalkDir;

use crate::error::Result;

/// Name of the backup directory inside the files directory.
pub const BACKUP_DIR: &str = "backup";

/// File extension of backup archives.
pub const BACKUP_EXTENSION: &str = "liquidsite";

/// An archive found in the backup directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupFile {
    pub name: String,
    pub size: u64,
}

pub fn backup_dir(files: &Path) -> PathBuf {
    files.join(BACKUP_DIR)
}

/// The default archive name for a backup of `domain` taken at `at`.
pub fn file_name(domain: &str, at: NaiveDateTime) -> String {
    format!(
        "{}.{}.{BACKUP_EXTENSION}",
        Domain::normalize_name(domain),
        at.format("%Y-%m-%d-%H%M")
    )
}

/// Resolve a restore argument. A bare file name that does not exist in the
/// working directory names an archive in `backups`.
pub fn resolve(backups: &Path, file: &Path) -> PathBuf {
    let bare = file.parent().is_some_and(|parent| parent.as_os_str().is_empty());
    if bare && !file.exists() {
        backups.join(file)
    } else {
        file.to_path_buf()
    }
}

/// All archives in `backups`, sorted by name. A missing directory holds
/// no backups.
pub fn list(backups: &Path) -> Result<Vec<BackupFile>> {
    if !backups.is_dir() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(backups).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let is_backup = entry.path().extension().is_some_and(|ext| ext == BACKUP_EXTENSION);
        if !entry.file_type().is_file() || !is_backup {
            continue;
        }
        let size = entry.metadata().map_err(io::Error::from)?.len();
        found.push(BackupFile { name: entry.file_name().to_string_lossy().into_owned(), size });
    }
    Ok(found)
}
