//! The content store contract.
//!
//! The backup subsystem never talks to a database directly. Everything it
//! reads or writes goes through [`ContentStore`], which a backend implements
//! on top of its own storage.
//!
//! Every operation that touches domain data takes the acting user; the store
//! decides whether the actor may perform it and returns
//! [`StoreError::Security`](crate::StoreError::Security) otherwise.

use std::path::PathBuf;

use crate::error::StoreResult;
use crate::types::{
    Actor, ContentId, Domain, Group, Host, Lock, PermissionList, Revision, User,
};

/// Ordering of a content listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentOrder {
    /// Category code descending, then id ascending.
    CategoryDescending,
    /// Id ascending.
    #[default]
    IdAscending,
}

/// A paged content listing within one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentQuery {
    pub domain: String,
    /// The parent to list children of, or [`ContentId::NONE`] for root contents.
    pub parent: ContentId,
    pub order: ContentOrder,
    pub offset: usize,
    pub limit: usize,
}

impl ContentQuery {
    /// Root contents of a domain.
    #[must_use]
    pub fn roots(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            parent: ContentId::NONE,
            order: ContentOrder::CategoryDescending,
            offset: 0,
            limit: usize::MAX,
        }
    }

    /// Direct children of a content.
    #[must_use]
    pub fn children(domain: impl Into<String>, parent: ContentId) -> Self {
        Self {
            domain: domain.into(),
            parent,
            order: ContentOrder::IdAscending,
            offset: 0,
            limit: usize::MAX,
        }
    }

    /// Restrict the listing to one page.
    #[must_use]
    pub const fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// The system of record for domains, principals and content.
///
/// `restore_*` operations insert objects with the identity given by the
/// caller rather than generating a fresh one, which is what a restore needs
/// to rebuild a domain from an archive.
pub trait ContentStore {
    /// Look up a domain by name.
    fn domain(&self, actor: &Actor, name: &str) -> StoreResult<Option<Domain>>;

    /// All hosts of a domain, ordered by name.
    fn hosts(&self, actor: &Actor, domain: &str) -> StoreResult<Vec<Host>>;

    /// All groups of a domain, ordered by name.
    fn groups(&self, actor: &Actor, domain: &str) -> StoreResult<Vec<Group>>;

    /// Look up a group by name.
    fn group(&self, actor: &Actor, domain: &str, name: &str) -> StoreResult<Option<Group>>;

    /// Number of users in a domain.
    fn user_count(&self, actor: &Actor, domain: &str) -> StoreResult<usize>;

    /// One page of users, ordered by name.
    fn users(
        &self,
        actor: &Actor,
        domain: &str,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<User>>;

    /// Look up a user by name.
    fn user(&self, actor: &Actor, domain: &str, name: &str) -> StoreResult<Option<User>>;

    /// Number of contents matching a query, ignoring its paging.
    fn content_count(&self, actor: &Actor, query: &ContentQuery) -> StoreResult<usize>;

    /// Ids of the contents matching a query, in query order.
    fn contents(&self, actor: &Actor, query: &ContentQuery) -> StoreResult<Vec<ContentId>>;

    /// Every revision of a content: published revisions in ascending number,
    /// followed by the work revision if one exists.
    fn revisions(&self, actor: &Actor, id: ContentId) -> StoreResult<Vec<Revision>>;

    /// The explicit permission list of a content, or of the domain itself
    /// for [`ContentId::NONE`]. `None` means the content inherits.
    fn permissions(
        &self,
        actor: &Actor,
        domain: &str,
        content: ContentId,
    ) -> StoreResult<Option<PermissionList>>;

    /// The lock held on a content, if any.
    fn lock(&self, actor: &Actor, id: ContentId) -> StoreResult<Option<Lock>>;

    /// The directory holding the files of a domain.
    fn domain_dir(&self, domain: &str) -> PathBuf;

    /// Create a domain. Fails with a conflict if the name is taken.
    fn restore_domain(&self, actor: &Actor, domain: &Domain) -> StoreResult<()>;

    /// Register a host. Fails with a conflict if any domain already owns
    /// the host name.
    fn restore_host(&self, actor: &Actor, host: &Host) -> StoreResult<()>;

    fn restore_group(&self, actor: &Actor, group: &Group) -> StoreResult<()>;

    /// Create a user. Every group named in the membership list must exist.
    fn restore_user(&self, actor: &Actor, user: &User) -> StoreResult<()>;

    /// Write a revision.
    ///
    /// A revision with [`ContentId::NONE`] creates a new content; the
    /// assigned id is written back into the revision and returned. A
    /// revision carrying an id adds to or replaces a revision of that content.
    fn restore_revision(&self, actor: &Actor, revision: &mut Revision) -> StoreResult<ContentId>;

    /// Replace the explicit permission list of a content or domain.
    fn restore_permissions(&self, actor: &Actor, list: &PermissionList) -> StoreResult<()>;

    /// Place a lock on a content. The holder must be a user of its domain.
    fn restore_lock(&self, actor: &Actor, lock: &Lock) -> StoreResult<()>;

    /// Delete a domain with everything it owns, including its files.
    fn delete_domain(&self, actor: &Actor, name: &str) -> StoreResult<()>;

    /// Drop any cached view of content.
    fn reset(&self) {}
}
