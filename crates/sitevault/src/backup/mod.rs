//! Domain backup and restore.
//!
//! An archive is a zip file holding one XML document, the
//! [`DATA_ENTRY`](format::DATA_ENTRY), plus a mirror of the domain's files
//! directory. The document is written and read as a stream, so neither side
//! holds the whole content tree in memory.
//!
//! # Export
//!
//! [`DomainExporter`] pages through the store and writes the document, then
//! appends every file below the domain directory.
//!
//! # Restore
//!
//! [`Restorer`] locates the document and feeds it to a [`RestoreHandler`],
//! a push-style state machine that persists objects as their elements close
//! and rewrites content references through an [`IdTranslation`]. Once the
//! document is consumed, the collected [`FileManifest`] is extracted. Any
//! fatal error after the domain was created deletes it again.

mod error;
pub mod export;
pub mod format;
pub mod restore;
mod types;
pub mod validate;

pub use error::{BackupError, BackupResult};
pub use export::DomainExporter;
pub use restore::{
    FileManifest, IdTranslation, ReferenceRewrite, RestoreHandler, RestoreOutcome, Restorer,
    RevisionMode,
};
pub use types::{BackupStatistics, ExportOptions, ExportReport, RestoreOptions, RestoreReport};
pub use validate::{validate_archive, validate_target};
