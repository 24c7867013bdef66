//! Access control entries and edit locks.

use serde::{Deserialize, Serialize};

use super::ContentId;

/// One access control entry.
///
/// An entry names either a user, a group, or neither (meaning everyone).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub user: Option<String>,
    pub group: Option<String>,
    pub read: bool,
    pub write: bool,
    pub publish: bool,
    pub admin: bool,
}

impl Permission {
    /// An entry granting nothing to everyone.
    #[must_use]
    pub fn anyone() -> Self {
        Self::default()
    }

    /// An entry for a single user.
    #[must_use]
    pub fn for_user(user: impl Into<String>) -> Self {
        Self { user: Some(user.into()), ..Self::default() }
    }

    /// An entry for a group.
    #[must_use]
    pub fn for_group(group: impl Into<String>) -> Self {
        Self { group: Some(group.into()), ..Self::default() }
    }

    /// Set the access flags from a string of `r`, `w`, `p` and `a`.
    ///
    /// Unknown characters are ignored.
    #[must_use]
    pub fn with_flags(mut self, flags: &str) -> Self {
        self.read = flags.contains('r');
        self.write = flags.contains('w');
        self.publish = flags.contains('p');
        self.admin = flags.contains('a');
        self
    }

    /// The access flags as a string, always in `rwpa` order.
    #[must_use]
    pub fn flags(&self) -> String {
        let mut out = String::with_capacity(4);
        if self.read {
            out.push('r');
        }
        if self.write {
            out.push('w');
        }
        if self.publish {
            out.push('p');
        }
        if self.admin {
            out.push('a');
        }
        out
    }
}

/// The explicit permissions of a domain or a content object.
///
/// A content without a list inherits from its parent; an empty list denies
/// that inheritance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionList {
    pub domain: String,
    /// The owning content, or [`ContentId::NONE`] for the domain itself.
    pub content: ContentId,
    pub entries: Vec<Permission>,
}

impl PermissionList {
    #[must_use]
    pub fn new(domain: impl Into<String>, content: ContentId) -> Self {
        Self { domain: domain.into(), content, entries: Vec::new() }
    }

    /// Append an entry.
    #[must_use]
    pub fn with(mut self, permission: Permission) -> Self {
        self.entries.push(permission);
        self
    }
}

/// An edit lock on a content object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub content: ContentId,
    /// Name of the user holding the lock.
    pub user: String,
    /// Acquisition time in epoch milliseconds.
    pub acquired: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_canonical() {
        let perm = Permission::for_group("editors").with_flags("apwr");
        assert_eq!(perm.flags(), "rwpa");

        let perm = Permission::anyone().with_flags("r");
        assert_eq!(perm.flags(), "r");
        assert!(!perm.write);

        assert_eq!(Permission::anyone().with_flags("xyz").flags(), "");
    }
}
