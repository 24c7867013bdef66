//! Restore command implementation.

use std::path::Path;

use sitevault::backup::{validate_archive, validate_target, RestoreOptions, Restorer, RevisionMode};
use sitevault_core::Actor;
use sitevault_storage::RedbStore;

use crate::archives;
use crate::error::Result;
use crate::OutputFormat;

/// Restore the archive `file` as the new domain `domain`. A bare file name
/// is looked up in `backups`.
pub fn run(
    store: &RedbStore,
    backups: &Path,
    file: &Path,
    domain: &str,
    mode: RevisionMode,
    format: OutputFormat,
) -> Result<()> {
    let actor = Actor::system();
    let file = archives::resolve(backups, file);
    validate_archive(&file)?;
    let target = validate_target(store, &actor, domain)?;

    let options = RestoreOptions::new().mode(mode);
    let report = Restorer::with_options(store, &actor, options).restore(&file, &target)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text if report.complete => println!("restored {}", report.domain),
        OutputFormat::Text => {
            println!("restored {}, but some elements were omitted", report.domain);
        }
    }
    Ok(())
}
