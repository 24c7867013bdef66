//! `sitevault` Core
//!
//! This crate provides the content model shared by the backup subsystem and
//! the store backends, together with the [`ContentStore`] contract that every
//! backend implements.
//!
//! # Modules
//!
//! - [`types`] - Domains, hosts, groups, users, content revisions, permissions and locks
//! - [`store`] - The content store trait and queries
//! - [`error`] - Store error types

#![deny(clippy::unwrap_used)]

pub mod error;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use store::{ContentOrder, ContentQuery, ContentStore};
pub use types::{
    Actor, Category, CategoryPolicy, ContentId, Domain, Group, Host, Lock, Permission,
    PermissionList, Revision, User,
};
