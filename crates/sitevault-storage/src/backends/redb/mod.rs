//! Redb content store.
//!
//! Every object kind lives in its own redb table. Keys are built from the
//! owning domain name and the object's name or id, separated by a zero byte,
//! so that all objects of one domain form a contiguous key range.
//!
//! # In-Memory Stores
//!
//! For testing, create a store that doesn't persist its records:
//!
//! ```ignore
//! let dir = tempfile::tempdir()?;
//! let store = RedbStore::in_memory(StoreConfig::new(dir.path()))?;
//! ```

mod store;
pub mod tables;

pub use store::{RedbStore, StoreConfig};
