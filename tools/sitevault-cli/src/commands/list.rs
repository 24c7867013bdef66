//! List command implementation.

use std::path::Path;

use crate::archives;
use crate::error::Result;
use crate::OutputFormat;

/// Print the archives available in `backups`.
pub fn run(backups: &Path, format: OutputFormat) -> Result<()> {
    let found = archives::list(backups)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&found)?),
        OutputFormat::Text if found.is_empty() => {
            println!("no backups in {}", backups.display());
        }
        OutputFormat::Text => {
            for backup in &found {
                println!("{}\t{} bytes", backup.name, backup.size);
            }
        }
    }
    Ok(())
}
