//! Core data types for the content model.
//!
//! A [`Domain`] owns hosts, groups, users, a permission list and a tree of
//! content. Each content node is stored as one or more [`Revision`]s sharing
//! the same [`ContentId`].

mod actor;
mod content;
mod domain;
mod id;
mod permission;

pub use actor::Actor;
pub use content::{Category, CategoryPolicy, Revision};
pub use domain::{Domain, Group, Host, User};
pub use id::ContentId;
pub use permission::{Lock, Permission, PermissionList};

/// The current time as milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
