//! Restoring an archive into a new domain.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

use sitevault_core::{Actor, ContentStore, Domain};
use tracing::{error, info, warn};
use zip::result::ZipError;
use zip::ZipArchive;

use super::handler::{RestoreHandler, RestoreOutcome};
use super::reader;
use crate::backup::error::{BackupError, BackupResult};
use crate::backup::format::DATA_ENTRY;
use crate::backup::types::{RestoreOptions, RestoreReport};

/// Rebuilds a domain from an archive, removing it again if the restore fails.
///
/// Callers are expected to check the target with
/// [`validate_target`](crate::backup::validate_target) first. An existing
/// domain is never touched: the restore then fails when creating it and no
/// rollback is attempted.
pub struct Restorer<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    actor: &'a Actor,
    options: RestoreOptions,
}

impl<'a, S: ContentStore + ?Sized> Restorer<'a, S> {
    pub fn new(store: &'a S, actor: &'a Actor) -> Self {
        Self::with_options(store, actor, RestoreOptions::default())
    }

    pub fn with_options(store: &'a S, actor: &'a Actor, options: RestoreOptions) -> Self {
        Self { store, actor, options }
    }

    /// Restore the archive at `path` as domain `target`.
    ///
    /// # Errors
    ///
    /// Fails if the archive cannot be opened, or for any error listed on
    /// [`restore_from`](Self::restore_from).
    pub fn restore(&self, path: impl AsRef<Path>, target: &str) -> BackupResult<RestoreReport> {
        let path = path.as_ref();
        info!(
            path = %path.display(),
            domain = target,
            mode = %self.options.mode,
            "restoring archive"
        );
        self.restore_from(BufReader::new(File::open(path)?), target)
    }

    /// Restore an archive read from `source` as domain `target`.
    ///
    /// On success the report tells whether anything was skipped. On
    /// failure the partially created domain is deleted before the error
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::MissingDataEntry`] if the archive has no
    /// document, and any parse, store or extraction error otherwise.
    pub fn restore_from<R: Read + Seek>(
        &self,
        source: R,
        target: &str,
    ) -> BackupResult<RestoreReport> {
        let target = Domain::normalize_name(target);
        let mut archive = ZipArchive::new(source)?;

        let mut handler = RestoreHandler::new(self.store, self.actor, &target, self.options.mode);
        let parsed = read_document(&mut archive, &mut handler);
        let created = handler.domain_created();

        let result = parsed
            .and_then(|()| handler.finish())
            .and_then(|outcome| extract_files(&mut archive, outcome));

        match result {
            Ok(outcome) => {
                self.store.reset();
                info!(
                    domain = %target,
                    complete = outcome.complete,
                    files = outcome.statistics.files,
                    "restore finished"
                );
                Ok(RestoreReport {
                    domain: target,
                    complete: outcome.complete,
                    mode: self.options.mode,
                    statistics: outcome.statistics,
                    ids: outcome.ids,
                })
            }
            Err(err) => {
                error!(domain = %target, error = %err, "restore failed");
                if created {
                    self.rollback(&target);
                }
                Err(err)
            }
        }
    }

    fn rollback(&self, domain: &str) {
        match self.store.delete_domain(self.actor, domain) {
            Ok(()) => info!(domain, "removed partially restored domain"),
            Err(err) => warn!(domain, error = %err, "failed to remove partially restored domain"),
        }
        self.store.reset();
    }
}

fn read_document<R: Read + Seek, S: ContentStore + ?Sized>(
    archive: &mut ZipArchive<R>,
    handler: &mut RestoreHandler<'_, S>,
) -> BackupResult<()> {
    let entry = archive.by_name(DATA_ENTRY).map_err(|err| match err {
        ZipError::FileNotFound => BackupError::MissingDataEntry,
        other => BackupError::Zip(other),
    })?;
    reader::parse(BufReader::new(entry), handler)
}

fn extract_files<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    mut outcome: RestoreOutcome,
) -> BackupResult<RestoreOutcome> {
    for (path, destination) in outcome.files.iter() {
        let mut entry = match archive.by_name(path) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                warn!(path, "file missing from archive, skipping");
                outcome.complete = false;
                outcome.statistics.add_skipped();
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(destination)?;
        let bytes = io::copy(&mut entry, &mut file)?;
        outcome.statistics.add_file(bytes);
    }
    Ok(outcome)
}
