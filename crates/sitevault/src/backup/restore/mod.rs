//! Restoring a domain from an archive.
//!
//! The pieces, leaf first:
//!
//! - [`RevisionMode`] decides which revisions of a content are recreated.
//! - [`IdTranslation`] and [`ReferenceRewrite`] map archive content ids to
//!   the ids assigned by the target store.
//! - [`RestoreHandler`] is the state machine consuming element events.
//! - [`reader`] drives the handler from an XML byte stream.
//! - [`Restorer`] opens the archive, extracts files and rolls back on failure.

mod coordinator;
mod frames;
mod handler;
mod manifest;
mod mode;
pub mod reader;
mod rewrite;

pub use coordinator::Restorer;
pub use handler::{ElementAttributes, RestoreHandler, RestoreOutcome};
pub use manifest::FileManifest;
pub use mode::{ParseRevisionModeError, RevisionMode};
pub use rewrite::{IdTranslation, ReferenceRewrite};
