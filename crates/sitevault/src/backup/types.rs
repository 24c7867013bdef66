//! Options, statistics and reports for backup and restore operations.

use serde::Serialize;

use super::restore::{IdTranslation, RevisionMode};

/// Default number of users fetched per page during export.
pub const DEFAULT_USER_PAGE_SIZE: usize = 100;

/// Default number of contents fetched per page during export.
pub const DEFAULT_CONTENT_PAGE_SIZE: usize = 10;

/// Counts of the objects written to or restored from an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackupStatistics {
    pub hosts: u64,
    pub groups: u64,
    pub users: u64,
    pub contents: u64,
    pub revisions: u64,
    pub permission_lists: u64,
    pub locks: u64,
    pub files: u64,
    /// Total size of the copied files.
    pub file_bytes: u64,
    /// Elements left out because of soft failures.
    pub skipped: u64,
}

impl BackupStatistics {
    pub fn add_host(&mut self) {
        self.hosts += 1;
    }

    pub fn add_group(&mut self) {
        self.groups += 1;
    }

    pub fn add_user(&mut self) {
        self.users += 1;
    }

    pub fn add_content(&mut self) {
        self.contents += 1;
    }

    pub fn add_revision(&mut self) {
        self.revisions += 1;
    }

    pub fn add_permission_list(&mut self) {
        self.permission_lists += 1;
    }

    pub fn add_lock(&mut self) {
        self.locks += 1;
    }

    /// Count one copied file of the given size.
    pub fn add_file(&mut self, bytes: u64) {
        self.files += 1;
        self.file_bytes += bytes;
    }

    pub fn add_skipped(&mut self) {
        self.skipped += 1;
    }
}

/// Options for controlling the export.
///
/// Page sizes bound how many users or contents are fetched from the store
/// at once; they do not change the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub user_page_size: usize,
    pub content_page_size: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            user_page_size: DEFAULT_USER_PAGE_SIZE,
            content_page_size: DEFAULT_CONTENT_PAGE_SIZE,
        }
    }
}

impl ExportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user page size. Values below 1 are raised to 1.
    #[must_use]
    pub const fn user_page_size(mut self, size: usize) -> Self {
        self.user_page_size = if size == 0 { 1 } else { size };
        self
    }

    /// Set the content page size. Values below 1 are raised to 1.
    #[must_use]
    pub const fn content_page_size(mut self, size: usize) -> Self {
        self.content_page_size = if size == 0 { 1 } else { size };
        self
    }
}

/// Options for controlling the restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreOptions {
    pub mode: RevisionMode,
}

impl RestoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the revision mode.
    #[must_use]
    pub const fn mode(mut self, mode: RevisionMode) -> Self {
        self.mode = mode;
        self
    }
}

/// The result of a successful export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// The exported domain.
    pub domain: String,
    pub statistics: BackupStatistics,
}

/// The result of a successful restore.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    /// The newly created domain.
    pub domain: String,
    /// `false` if some elements were skipped because of conflicts or
    /// missing archive entries.
    pub complete: bool,
    pub mode: RevisionMode,
    pub statistics: BackupStatistics,
    /// Old to new content ids.
    #[serde(skip)]
    pub ids: IdTranslation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_options_default() {
        let options = ExportOptions::default();
        assert_eq!(options.user_page_size, 100);
        assert_eq!(options.content_page_size, 10);
    }

    #[test]
    fn test_export_options_builder() {
        let options = ExportOptions::new().user_page_size(0).content_page_size(3);
        assert_eq!(options.user_page_size, 1);
        assert_eq!(options.content_page_size, 3);
    }

    #[test]
    fn test_statistics_counters() {
        let mut stats = BackupStatistics::default();
        stats.add_file(10);
        stats.add_file(32);
        stats.add_skipped();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.file_bytes, 42);
        assert_eq!(stats.skipped, 1);
    }
}
