//! Content identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a content object, assigned by the store on creation.
///
/// The value `0` is reserved and means "no content". Root contents use it as
/// their parent, and unresolvable references translate to it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ContentId(u64);

impl ContentId {
    /// The reserved "no content" identifier.
    pub const NONE: Self = Self(0);

    /// Create a new `ContentId` from a raw u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns `true` for the reserved "no content" identifier.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for ContentId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_none() {
        assert!(ContentId::NONE.is_none());
        assert!(ContentId::default().is_none());
        assert!(!ContentId::new(7).is_none());
    }

    #[test]
    fn content_id_parse_and_display() {
        let id: ContentId = "42".parse().expect("numeric id");
        assert_eq!(id.as_u64(), 42);
        assert_eq!(id.to_string(), "42");
        assert!("forty-two".parse::<ContentId>().is_err());
    }
}
