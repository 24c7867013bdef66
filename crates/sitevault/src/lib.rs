//! `sitevault` - Domain Backup and Restore
//!
//! sitevault exports a complete content domain (hosts, groups, users,
//! permissions and the full content tree with every revision and attached
//! file) into a single zip archive, and rebuilds an equivalent domain from
//! such an archive under a new name.
//!
//! # Quick Start
//!
//! ```ignore
//! use sitevault::backup::{DomainExporter, Restorer, RestoreOptions, RevisionMode};
//! use sitevault_core::Actor;
//!
//! let admin = Actor::system();
//!
//! // Write EXAMPLE to an archive
//! let report = DomainExporter::new(&store, &admin).export_domain("EXAMPLE", "example.zip")?;
//! println!("exported {} contents", report.statistics.contents);
//!
//! // Restore it as COPY, keeping only the latest revision of each content
//! let options = RestoreOptions::new().mode(RevisionMode::LatestPublished);
//! let report = Restorer::with_options(&store, &admin, options).restore("example.zip", "COPY")?;
//! if !report.complete {
//!     println!("restored, but some elements were omitted");
//! }
//! ```
//!
//! # Modules
//!
//! - [`backup`] - Archive format, exporter, restore parser and coordinator

#![deny(clippy::unwrap_used)]

pub mod backup;

pub use backup::{BackupError, BackupResult};
