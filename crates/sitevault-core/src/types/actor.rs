//! The user on whose behalf an operation runs.

use serde::{Deserialize, Serialize};

/// The acting user of a backup or restore.
///
/// Authorization itself belongs to the store; the actor is only carried
/// through so the store can decide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    name: String,
    superuser: bool,
}

impl Actor {
    /// The built-in system administrator.
    #[must_use]
    pub fn system() -> Self {
        Self { name: "system".to_string(), superuser: true }
    }

    /// A regular, non-administrative user.
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self { name: name.into(), superuser: false }
    }

    /// An administrative user.
    #[must_use]
    pub fn superuser(name: impl Into<String>) -> Self {
        Self { name: name.into(), superuser: true }
    }

    /// The user name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the actor has administrative rights.
    #[must_use]
    pub const fn is_superuser(&self) -> bool {
        self.superuser
    }
}
