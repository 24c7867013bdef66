//! Content categories and revisions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ContentId;

/// The kind of a content object.
///
/// Each category has a fixed numeric code that is stable across versions
/// and used in backup archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Site,
    Translator,
    Folder,
    Page,
    File,
    Template,
    Section,
    Document,
    Forum,
    Topic,
    Post,
}

/// Per-category behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPolicy {
    /// Attribute holding the on-disk file name, for categories backed by a file.
    pub file_attribute: Option<&'static str>,
}

impl CategoryPolicy {
    /// Whether contents of this category own a file on disk.
    #[must_use]
    pub const fn carries_file(&self) -> bool {
        self.file_attribute.is_some()
    }
}

impl Category {
    /// Every category, in code order.
    pub const ALL: [Self; 11] = [
        Self::Site,
        Self::Translator,
        Self::Folder,
        Self::Page,
        Self::File,
        Self::Template,
        Self::Section,
        Self::Document,
        Self::Forum,
        Self::Topic,
        Self::Post,
    ];

    /// The stable numeric code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Site => 1,
            Self::Translator => 2,
            Self::Folder => 3,
            Self::Page => 4,
            Self::File => 5,
            Self::Template => 6,
            Self::Section => 11,
            Self::Document => 12,
            Self::Forum => 13,
            Self::Topic => 14,
            Self::Post => 15,
        }
    }

    /// Look up a category by its numeric code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::Site,
            2 => Self::Translator,
            3 => Self::Folder,
            4 => Self::Page,
            5 => Self::File,
            6 => Self::Template,
            11 => Self::Section,
            12 => Self::Document,
            13 => Self::Forum,
            14 => Self::Topic,
            15 => Self::Post,
            _ => return None,
        })
    }

    /// The behavior table entry for this category.
    #[must_use]
    pub const fn policy(self) -> CategoryPolicy {
        match self {
            Self::File => CategoryPolicy { file_attribute: Some("FILENAME") },
            _ => CategoryPolicy { file_attribute: None },
        }
    }
}

/// One revision of a content object.
///
/// Revision number `0` is the unpublished work revision; published
/// revisions are numbered from `1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Owning content, or [`ContentId::NONE`] before the first save.
    pub content: ContentId,
    pub domain: String,
    pub category: Category,
    pub number: u32,
    pub name: String,
    /// Parent content, or [`ContentId::NONE`] for a root content.
    pub parent: ContentId,
    /// Publication start in epoch milliseconds.
    pub online: Option<i64>,
    /// Publication end in epoch milliseconds.
    pub offline: Option<i64>,
    pub modified: Option<i64>,
    pub author: String,
    pub comment: String,
    pub attributes: BTreeMap<String, String>,
}

impl Revision {
    /// A blank work revision of a new content object.
    #[must_use]
    pub fn new(domain: impl Into<String>, category: Category, name: impl Into<String>) -> Self {
        Self {
            content: ContentId::NONE,
            domain: domain.into(),
            category,
            number: 0,
            name: name.into(),
            parent: ContentId::NONE,
            online: None,
            offline: None,
            modified: None,
            author: String::new(),
            comment: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_number(mut self, number: u32) -> Self {
        self.number = number;
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: ContentId) -> Self {
        self.parent = parent;
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    #[must_use]
    pub fn with_online(mut self, online: i64) -> Self {
        self.online = Some(online);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Whether this is the unpublished work revision.
    #[must_use]
    pub const fn is_work(&self) -> bool {
        self.number == 0
    }

    /// The on-disk file name, for categories that carry a file.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        let attr = self.category.policy().file_attribute?;
        self.attributes.get(attr).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_codes_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_code(category.code()), Some(category));
        }
        assert_eq!(Category::from_code(0), None);
        assert_eq!(Category::from_code(7), None);
        assert_eq!(Category::Template.code(), 6);
        assert_eq!(Category::Post.code(), 15);
    }

    #[test]
    fn only_files_carry_files() {
        let carrying: Vec<_> =
            Category::ALL.into_iter().filter(|c| c.policy().carries_file()).collect();
        assert_eq!(carrying, vec![Category::File]);
    }

    #[test]
    fn revision_file_name() {
        let file = Revision::new("EX", Category::File, "logo")
            .with_attribute("FILENAME", "logo.png");
        assert_eq!(file.file_name(), Some("logo.png"));

        let page = Revision::new("EX", Category::Page, "index")
            .with_attribute("FILENAME", "ignored.txt");
        assert_eq!(page.file_name(), None);
    }
}
