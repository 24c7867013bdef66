//! Backup command implementation.

use std::fs;
use std::path::Path;

use chrono::Local;
use sitevault::backup::DomainExporter;
use sitevault_core::Actor;
use sitevault_storage::RedbStore;

use crate::archives;
use crate::error::Result;
use crate::OutputFormat;

/// Export `domain` into a new archive at `output`, or into a timestamped
/// archive in `backups` when no output is given.
pub fn run(
    store: &RedbStore,
    backups: &Path,
    domain: &str,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => {
            fs::create_dir_all(backups)?;
            backups.join(archives::file_name(domain, Local::now().naive_local()))
        }
    };
    let actor = Actor::system();
    let report = DomainExporter::new(store, &actor).export_domain(domain, &output)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            let stats = &report.statistics;
            println!(
                "backed up {} to {} ({} users, {} contents, {} revisions, {} files)",
                report.domain,
                output.display(),
                stats.users,
                stats.contents,
                stats.revisions,
                stats.files
            );
        }
    }
    Ok(())
}
