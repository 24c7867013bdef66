//! Storage backend implementations.

pub mod redb;

pub use self::redb::RedbStore;
