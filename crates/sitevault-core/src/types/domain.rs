//! Domains and the principals that live inside them.

use serde::{Deserialize, Serialize};

/// A top-level tenant owning hosts, users, groups and content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Upper-case unique name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Creation time in epoch milliseconds.
    pub created: i64,
    /// Last modification time in epoch milliseconds.
    pub modified: i64,
    /// Sender address for outgoing mail, if configured.
    pub mail_from: Option<String>,
}

impl Domain {
    /// Characters permitted in a domain name.
    pub const NAME_CHARS: &'static str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_.";

    /// Create a domain with empty description, stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = super::now_millis();
        Self {
            name: name.into(),
            description: String::new(),
            created: now,
            modified: now,
            mail_from: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Normalize a user-supplied name to its stored form.
    #[must_use]
    pub fn normalize_name(name: &str) -> String {
        name.trim().to_uppercase()
    }

    /// Returns the first character of `name` outside [`Self::NAME_CHARS`].
    #[must_use]
    pub fn invalid_name_char(name: &str) -> Option<char> {
        name.chars().find(|c| !Self::NAME_CHARS.contains(*c))
    }
}

/// A host name routed to a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub domain: String,
    /// Globally unique host name.
    pub name: String,
    pub description: String,
}

impl Host {
    #[must_use]
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self { domain: domain.into(), name: name.into(), description: String::new() }
    }
}

/// A named set of users inside a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub domain: String,
    pub name: String,
    pub description: String,
    /// Whether users may join the group themselves.
    pub public: bool,
    pub comment: String,
}

impl Group {
    #[must_use]
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
            description: String::new(),
            public: false,
            comment: String::new(),
        }
    }
}

/// A user account inside a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub domain: String,
    pub name: String,
    /// Password hash, copied opaquely.
    pub password: String,
    pub enabled: bool,
    pub real_name: String,
    pub email: String,
    pub comment: String,
    /// Names of the groups the user belongs to.
    pub groups: Vec<String>,
}

impl User {
    #[must_use]
    pub fn new(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
            password: String::new(),
            enabled: true,
            real_name: String::new(),
            email: String::new(),
            comment: String::new(),
            groups: Vec::new(),
        }
    }

    /// Add a group membership.
    #[must_use]
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_name_rules() {
        assert_eq!(Domain::normalize_name(" example "), "EXAMPLE");
        assert_eq!(Domain::invalid_name_char("MY-SITE_2.0"), None);
        assert_eq!(Domain::invalid_name_char("MY SITE"), Some(' '));
        assert_eq!(Domain::invalid_name_char("lower"), Some('l'));
    }

    #[test]
    fn user_group_membership() {
        let user = User::new("EXAMPLE", "alice").in_group("editors").in_group("staff");
        assert_eq!(user.groups, vec!["editors".to_string(), "staff".to_string()]);
        assert!(user.enabled);
    }
}
