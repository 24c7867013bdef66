//! Content id translation and reference rewriting.

use std::borrow::Cow;
use std::collections::BTreeMap;

use sitevault_core::ContentId;

/// Restore-scoped map from archive content ids to newly assigned ids.
///
/// Entries are only ever added. Ids that were never restored translate to
/// [`ContentId::NONE`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdTranslation {
    ids: BTreeMap<ContentId, ContentId>,
}

impl IdTranslation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping. Returns `false` and keeps the existing mapping if
    /// `old` was already mapped.
    pub fn insert(&mut self, old: ContentId, new: ContentId) -> bool {
        if self.ids.contains_key(&old) {
            return false;
        }
        self.ids.insert(old, new);
        true
    }

    /// The new id of `old`, if it was restored.
    pub fn get(&self, old: ContentId) -> Option<ContentId> {
        self.ids.get(&old).copied()
    }

    /// Translate an old id, yielding [`ContentId::NONE`] when it is unknown.
    pub fn translate(&self, old: ContentId) -> ContentId {
        self.get(old).unwrap_or(ContentId::NONE)
    }

    /// Translate an id written as text. Text that is not an id, including
    /// negative numbers and padded digits, translates to [`ContentId::NONE`].
    pub fn translate_text(&self, text: &str) -> ContentId {
        text.parse::<ContentId>().map_or(ContentId::NONE, |old| self.translate(old))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// All (old, new) pairs in old id order.
    pub fn iter(&self) -> impl Iterator<Item = (ContentId, ContentId)> + '_ {
        self.ids.iter().map(|(old, new)| (*old, *new))
    }
}

/// How the text of a content attribute is rewritten during restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceRewrite {
    /// Kept as written.
    Verbatim,
    /// Integer text is a content id and is translated, with unknown and
    /// negative ids becoming `0`. Anything else, such as an external URL or
    /// an empty value, is kept.
    ContentReference,
}

impl ReferenceRewrite {
    /// The rewrite rule for an attribute name.
    pub fn for_attribute(name: &str) -> Self {
        match name {
            "TEMPLATE" | "LINK" => Self::ContentReference,
            _ => Self::Verbatim,
        }
    }

    /// Rewrite the complete text of an attribute.
    pub fn apply<'t>(self, text: &'t str, ids: &IdTranslation) -> Cow<'t, str> {
        match self {
            Self::Verbatim => Cow::Borrowed(text),
            Self::ContentReference if text.parse::<i64>().is_ok() => {
                Cow::Owned(ids.translate_text(text).to_string())
            }
            Self::ContentReference => Cow::Borrowed(text),
        }
    }
}
