//! Command implementations.

pub mod backup;
pub mod list;
pub mod restore;

use std::path::{Path, PathBuf};

use sitevault_storage::{RedbStore, StoreConfig};

use crate::error::{CliError, Result};

/// The directory holding per-domain files: `files` when given, otherwise
/// next to the database at `store`.
pub fn files_dir(store: Option<&Path>, files: Option<&Path>) -> Result<PathBuf> {
    match (files, store) {
        (Some(files), _) => Ok(files.to_path_buf()),
        (None, Some(store)) => Ok(store.with_extension("files")),
        (None, None) => Err(CliError::NoStoreSpecified),
    }
}

/// Open the store at `path`, keeping domain files in `files`.
pub fn open_store(path: Option<&Path>, files: &Path) -> Result<RedbStore> {
    let path = path.ok_or(CliError::NoStoreSpecified)?;
    Ok(RedbStore::open(path, StoreConfig::new(files))?)
}
