//! `sitevault` Storage
//!
//! Content store backends for sitevault.
//!
//! The only backend is [`RedbStore`], which keeps domains, principals,
//! revisions, permission lists and locks in a redb database, and the files
//! of file-backed content in a per-domain directory tree.
//!
//! # Example
//!
//! ```ignore
//! use sitevault_storage::{RedbStore, StoreConfig};
//!
//! let store = RedbStore::open("site.redb", StoreConfig::new("files"))?;
//! ```

#![deny(clippy::unwrap_used)]

pub mod backends;

pub use backends::redb::{RedbStore, StoreConfig};
