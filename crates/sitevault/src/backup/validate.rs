//! Checks run before a restore is started.

use std::path::Path;

use sitevault_core::{Actor, ContentStore, Domain};

use super::error::{BackupError, BackupResult};

/// Check that `name` can be used for a new domain and return it
/// normalized.
///
/// # Errors
///
/// Returns [`BackupError::InvalidTarget`] if the name is empty, contains
/// a character outside [`Domain::NAME_CHARS`] or names an existing domain.
pub fn validate_target<S: ContentStore + ?Sized>(
    store: &S,
    actor: &Actor,
    name: &str,
) -> BackupResult<String> {
    let name = Domain::normalize_name(name);
    if name.is_empty() {
        return Err(BackupError::invalid_target("please enter the name of a domain to create"));
    }
    if let Some(c) = Domain::invalid_name_char(&name) {
        return Err(BackupError::invalid_target(format!("invalid character in domain name: '{c}'")));
    }
    if store.domain(actor, &name)?.is_some() {
        return Err(BackupError::invalid_target(format!("domain {name} already exists")));
    }
    Ok(name)
}

/// Check that `path` names a readable archive file.
///
/// # Errors
///
/// Returns [`BackupError::InvalidTarget`] if nothing is selected or the
/// path is not a file.
pub fn validate_archive(path: impl AsRef<Path>) -> BackupResult<()> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(BackupError::invalid_target("please select a backup file to restore"));
    }
    if !path.is_file() {
        return Err(BackupError::invalid_target(format!(
            "backup file {} does not exist",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitevault_storage::{RedbStore, StoreConfig};

    #[test]
    fn test_validate_target() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store =
            RedbStore::in_memory(StoreConfig::new(dir.path())).expect("failed to create store");
        let admin = Actor::system();
        store.restore_domain(&admin, &Domain::new("TAKEN")).expect("failed to create domain");

        assert_eq!(validate_target(&store, &admin, " new-site.2 ").expect("valid"), "NEW-SITE.2");

        for bad in ["", "   ", "my site", "a/b", "taken"] {
            let err = validate_target(&store, &admin, bad).expect_err(bad);
            assert!(err.is_preflight(), "{bad}: {err}");
        }
        let err = validate_target(&store, &admin, "ba$e").expect_err("invalid char");
        assert_eq!(err.to_string(), "invalid character in domain name: '$'");
    }

    #[test]
    fn test_validate_target_requires_access() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store =
            RedbStore::in_memory(StoreConfig::new(dir.path())).expect("failed to create store");

        let err = validate_target(&store, &Actor::user("guest"), "NEW").expect_err("denied");
        assert!(matches!(err, BackupError::Store(ref e) if e.is_security()));
    }

    #[test]
    fn test_validate_archive() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let file = dir.path().join("site.zip");
        std::fs::write(&file, b"PK").expect("failed to write file");

        assert!(validate_archive(&file).is_ok());
        assert!(validate_archive("").is_err());
        assert!(validate_archive(dir.path()).is_err());
        assert!(validate_archive(dir.path().join("missing.zip")).is_err());
    }
}
