//! Files to extract once the document has been restored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Archive paths of content files mapped to their destination on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileManifest {
    entries: BTreeMap<String, PathBuf>,
}

impl FileManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file. A later registration of the same archive path
    /// replaces the earlier destination.
    pub fn add(&mut self, archive_path: impl Into<String>, destination: impl Into<PathBuf>) {
        self.entries.insert(archive_path.into(), destination.into());
    }

    /// The destination of an archive path.
    pub fn destination(&self, archive_path: &str) -> Option<&Path> {
        self.entries.get(archive_path).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All (archive path, destination) pairs in archive path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries.iter().map(|(path, dest)| (path.as_str(), dest.as_path()))
    }
}
