//! sitevault Command Line Interface
//!
//! Backs up a domain to a zip archive and restores archives as new domains.

mod archives;
mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sitevault::backup::RevisionMode;

use crate::commands::{backup, list, restore};
use crate::error::Result;

/// sitevault Command Line Interface
#[derive(Parser, Debug)]
#[command(name = "sitevault")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the content store database
    #[arg(short, long, env = "SITEVAULT_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Directory holding the per-domain content files
    #[arg(long, env = "SITEVAULT_FILES", global = true)]
    pub files: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human readable summary
    Text,
    /// JSON report
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a domain and its files to an archive
    Backup {
        /// Name of the domain to back up
        domain: String,

        /// Archive file to create, defaults to a timestamped archive in the
        /// backup directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Restore an archive as a new domain
    Restore {
        /// Archive file or name of a backup in the backup directory
        file: PathBuf,

        /// Name of the domain to create
        #[arg(short, long)]
        domain: String,

        /// Revisions to keep: exact, latest or work
        #[arg(short, long, default_value = "exact")]
        revisions: RevisionMode,
    },

    /// List the archives in the backup directory
    List,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sitevault=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let files = commands::files_dir(cli.store.as_deref(), cli.files.as_deref())?;
    let backups = archives::backup_dir(&files);

    match cli.command {
        Commands::Backup { domain, output } => {
            let store = commands::open_store(cli.store.as_deref(), &files)?;
            backup::run(&store, &backups, &domain, output.as_deref(), cli.format)
        }
        Commands::Restore { file, domain, revisions } => {
            let store = commands::open_store(cli.store.as_deref(), &files)?;
            restore::run(&store, &backups, &file, &domain, revisions, cli.format)
        }
        Commands::List => list::run(&backups, cli.format),
    }
}
