//! Revision retention policies.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sitevault_core::Revision;
use thiserror::Error;

/// Which revisions of each content a restore recreates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionMode {
    /// Every revision with its original number.
    #[default]
    Exact,
    /// Only the latest revision, published as revision 1.
    LatestPublished,
    /// Only the latest revision, as an unpublished work revision with no
    /// online or offline date.
    AsWork,
}

impl RevisionMode {
    /// Index of the "latest" revision among revisions in document order.
    ///
    /// This is the first revision, unless there are several and the last
    /// one is a work revision, in which case it is the last one. Published
    /// revisions in between are never chosen.
    pub fn latest_index(revisions: &[Revision]) -> Option<usize> {
        match revisions {
            [] => None,
            [.., last] if revisions.len() > 1 && last.is_work() => Some(revisions.len() - 1),
            _ => Some(0),
        }
    }

    /// Reduce the revisions of one content to the ones this mode keeps.
    pub fn select(self, mut revisions: Vec<Revision>) -> Vec<Revision> {
        if self == Self::Exact {
            return revisions;
        }
        let Some(index) = Self::latest_index(&revisions) else {
            return revisions;
        };
        let mut latest = revisions.swap_remove(index);
        match self {
            Self::LatestPublished => latest.number = 1,
            Self::AsWork => {
                latest.number = 0;
                latest.online = None;
                latest.offline = None;
            }
            Self::Exact => {}
        }
        vec![latest]
    }
}

impl fmt::Display for RevisionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exact => "exact",
            Self::LatestPublished => "latest",
            Self::AsWork => "work",
        })
    }
}

/// Error returned for an unknown revision mode name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown revision mode '{0}' (expected exact, latest or work)")]
pub struct ParseRevisionModeError(String);

impl FromStr for RevisionMode {
    type Err = ParseRevisionModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" | "all" => Ok(Self::Exact),
            "latest" | "latest-published" | "published" => Ok(Self::LatestPublished),
            "work" | "as-work" | "draft" => Ok(Self::AsWork),
            _ => Err(ParseRevisionModeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitevault_core::Category;

    fn revisions(numbers: &[u32]) -> Vec<Revision> {
        numbers
            .iter()
            .map(|&n| {
                Revision::new("EX", Category::Page, format!("rev{n}"))
                    .with_number(n)
                    .with_online(1_000)
            })
            .collect()
    }

    #[test]
    fn test_latest_prefers_trailing_work_revision() {
        assert_eq!(RevisionMode::latest_index(&revisions(&[1, 2, 0])), Some(2));
        assert_eq!(RevisionMode::latest_index(&revisions(&[0])), Some(0));
        assert_eq!(RevisionMode::latest_index(&[]), None);
    }

    #[test]
    fn test_latest_ignores_later_published_revisions() {
        // Without a trailing work revision the first one wins, not the highest.
        assert_eq!(RevisionMode::latest_index(&revisions(&[1, 2, 3])), Some(0));
    }

    #[test]
    fn test_exact_keeps_everything() {
        let kept = RevisionMode::Exact.select(revisions(&[1, 2, 0]));
        assert_eq!(kept.iter().map(|r| r.number).collect::<Vec<_>>(), vec![1, 2, 0]);
    }

    #[test]
    fn test_latest_published_renumbers() {
        let kept = RevisionMode::LatestPublished.select(revisions(&[1, 2, 0]));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].number, 1);
        assert_eq!(kept[0].name, "rev0");
        assert_eq!(kept[0].online, Some(1_000));
    }

    #[test]
    fn test_as_work_clears_dates() {
        let kept = RevisionMode::AsWork.select(revisions(&[3, 4]));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].number, 0);
        assert_eq!(kept[0].name, "rev3");
        assert_eq!(kept[0].online, None);
        assert_eq!(kept[0].offline, None);
    }

    #[test]
    fn test_parse_and_display() {
        for mode in [RevisionMode::Exact, RevisionMode::LatestPublished, RevisionMode::AsWork] {
            assert_eq!(mode.to_string().parse::<RevisionMode>(), Ok(mode));
        }
        assert_eq!("AS-WORK".parse::<RevisionMode>(), Ok(RevisionMode::AsWork));
        assert!("newest".parse::<RevisionMode>().is_err());
    }
}
