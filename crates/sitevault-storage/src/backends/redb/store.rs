//! The redb-backed [`ContentStore`].

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use redb::{Database, ReadTransaction, ReadableTable, WriteTransaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sitevault_core::{
    Actor, ContentId, ContentOrder, ContentQuery, ContentStore, Domain, Group, Host,
    Lock, PermissionList, Revision, StoreError, StoreResult, User,
};
use tracing::debug;

use super::tables::{
    decode, domain_end_key, domain_start_key, encode, id_key, revision_key, revision_range,
    scoped_id_key, scoped_key, tree_key, tree_key_id, ContentRecord, Table, ALL_TABLES, CONTENTS,
    CONTENT_TREE, DOMAINS, GROUPS, HOSTS, LOCKS, META, NEXT_CONTENT_ID, PERMISSIONS, REVISIONS, USERS,
};

/// Configuration options for a [`RedbStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base directory holding one subdirectory per domain.
    pub files_dir: PathBuf,

    /// Cache size in bytes.
    /// If not set, uses Redb's default.
    pub cache_size: Option<usize>,
}

impl StoreConfig {
    /// Create a configuration with the given files directory.
    pub fn new(files_dir: impl Into<PathBuf>) -> Self {
        Self { files_dir: files_dir.into(), cache_size: None }
    }

    /// Set the cache size.
    #[must_use]
    pub fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = Some(size);
        self
    }
}

/// A content store backed by Redb.
///
/// All mutating and reading operations require a superuser actor. Domain
/// lookups are cached until [`ContentStore::reset`] is called.
pub struct RedbStore {
    db: Database,
    config: StoreConfig,
    domains: RwLock<HashMap<String, Domain>>,
}

fn storage(e: impl Display) -> StoreError {
    StoreError::Storage(e.to_string())
}

fn authorize(actor: &Actor, action: &str) -> StoreResult<()> {
    if actor.is_superuser() {
        Ok(())
    } else {
        Err(StoreError::security(format!("user '{}' may not {action}", actor.name())))
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the database cannot be opened or created.
    pub fn open(path: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let mut builder = Database::builder();
        if let Some(cache_size) = config.cache_size {
            builder.set_cache_size(cache_size);
        }
        let db = builder.create(path.as_ref()).map_err(storage)?;
        Self::with_database(db, config)
    }

    /// Create a store whose records live in memory.
    ///
    /// Files still go to the configured files directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Storage`] if the database cannot be created.
    pub fn in_memory(config: StoreConfig) -> StoreResult<Self> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(storage)?;
        Self::with_database(db, config)
    }

    fn with_database(db: Database, config: StoreConfig) -> StoreResult<Self> {
        let txn = db.begin_write().map_err(storage)?;
        for table in ALL_TABLES {
            txn.open_table(table).map_err(storage)?;
        }
        txn.commit().map_err(storage)?;
        Ok(Self { db, config, domains: RwLock::new(HashMap::new()) })
    }

    /// The store configuration.
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn read(&self) -> StoreResult<ReadTransaction> {
        self.db.begin_read().map_err(storage)
    }

    fn write(&self) -> StoreResult<WriteTransaction> {
        self.db.begin_write().map_err(storage)
    }

    fn get<T: DeserializeOwned>(&self, table: Table, key: &[u8]) -> StoreResult<Option<T>> {
        let txn = self.read()?;
        let table = txn.open_table(table).map_err(storage)?;
        let found = table.get(key).map_err(storage)?;
        found.map(|guard| decode(guard.value())).transpose()
    }

    fn scan<T: DeserializeOwned>(
        &self,
        table: Table,
        start: &[u8],
        end: &[u8],
    ) -> StoreResult<Vec<T>> {
        let txn = self.read()?;
        let table = txn.open_table(table).map_err(storage)?;
        let mut out = Vec::new();
        for entry in table.range(start..end).map_err(storage)? {
            let (_, value) = entry.map_err(storage)?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    /// Tree index entries below one parent, as (id, category code) pairs.
    fn children(&self, domain: &str, parent: ContentId) -> StoreResult<Vec<(ContentId, u8)>> {
        let (start, end) = tree_range(domain, parent);
        let txn = self.read()?;
        let table = txn.open_table(CONTENT_TREE).map_err(storage)?;
        let mut out = Vec::new();
        for entry in table.range(start.as_slice()..end.as_slice()).map_err(storage)? {
            let (key, value) = entry.map_err(storage)?;
            let id = tree_key_id(key.value())
                .ok_or_else(|| StoreError::Encoding("truncated content tree key".to_string()))?;
            let code = value.value().first().copied().unwrap_or_default();
            out.push((id, code));
        }
        Ok(out)
    }

    fn require_domain(txn: &WriteTransaction, name: &str) -> StoreResult<()> {
        if contains(txn, DOMAINS, name.as_bytes())? {
            Ok(())
        } else {
            Err(StoreError::not_found("domain", name))
        }
    }

    fn require_user(txn: &WriteTransaction, domain: &str, name: &str) -> StoreResult<()> {
        if contains(txn, USERS, &scoped_key(domain, name))? {
            Ok(())
        } else {
            Err(StoreError::not_found("user", name))
        }
    }

    fn require_group(txn: &WriteTransaction, domain: &str, name: &str) -> StoreResult<()> {
        if contains(txn, GROUPS, &scoped_key(domain, name))? {
            Ok(())
        } else {
            Err(StoreError::not_found("group", name))
        }
    }

    fn forget_domain(&self, name: &str) {
        if let Ok(mut cache) = self.domains.write() {
            cache.remove(name);
        }
    }
}

/// Key range of the tree index entries below one parent.
fn tree_range(domain: &str, parent: ContentId) -> (Vec<u8>, Vec<u8>) {
    let start = scoped_id_key(domain, parent);
    let end = match parent.as_u64().checked_add(1) {
        Some(next) => scoped_id_key(domain, ContentId::new(next)),
        None => domain_end_key(domain),
    };
    (start, end)
}

fn fetch<T: DeserializeOwned>(
    txn: &WriteTransaction,
    table: Table,
    key: &[u8],
) -> StoreResult<Option<T>> {
    let table = txn.open_table(table).map_err(storage)?;
    let found = table.get(key).map_err(storage)?;
    found.map(|guard| decode(guard.value())).transpose()
}

fn contains(txn: &WriteTransaction, table: Table, key: &[u8]) -> StoreResult<bool> {
    let table = txn.open_table(table).map_err(storage)?;
    let found = table.get(key).map_err(storage)?.is_some();
    Ok(found)
}

fn insert<T: Serialize>(
    txn: &WriteTransaction,
    table: Table,
    key: &[u8],
    value: &T,
) -> StoreResult<()> {
    let bytes = encode(value)?;
    insert_raw(txn, table, key, &bytes)
}

fn insert_raw(txn: &WriteTransaction, table: Table, key: &[u8], value: &[u8]) -> StoreResult<()> {
    let mut table = txn.open_table(table).map_err(storage)?;
    table.insert(key, value).map_err(storage)?;
    Ok(())
}

fn remove(txn: &WriteTransaction, table: Table, key: &[u8]) -> StoreResult<()> {
    let mut table = txn.open_table(table).map_err(storage)?;
    table.remove(key).map_err(storage)?;
    Ok(())
}

/// Remove every key in `start..end`, returning the removed keys.
fn remove_range(
    txn: &WriteTransaction,
    table: Table,
    start: &[u8],
    end: &[u8],
) -> StoreResult<Vec<Vec<u8>>> {
    let mut table = txn.open_table(table).map_err(storage)?;
    let keys = table
        .range(start..end)
        .map_err(storage)?
        .map(|entry| entry.map(|(key, _)| key.value().to_vec()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(storage)?;
    for key in &keys {
        table.remove(key.as_slice()).map_err(storage)?;
    }
    Ok(keys)
}

/// Allocate a fresh content id.
fn allocate_content_id(txn: &WriteTransaction) -> StoreResult<ContentId> {
    let next: u64 = fetch(txn, META, NEXT_CONTENT_ID)?.unwrap_or(1);
    insert(txn, META, NEXT_CONTENT_ID, &(next + 1))?;
    Ok(ContentId::new(next))
}

/// Make sure the id counter never hands out an id that was inserted explicitly.
fn reserve_content_id(txn: &WriteTransaction, id: ContentId) -> StoreResult<()> {
    let next: u64 = fetch(txn, META, NEXT_CONTENT_ID)?.unwrap_or(1);
    if id.as_u64() >= next {
        insert(txn, META, NEXT_CONTENT_ID, &(id.as_u64() + 1))?;
    }
    Ok(())
}

impl ContentStore for RedbStore {
    fn domain(&self, actor: &Actor, name: &str) -> StoreResult<Option<Domain>> {
        authorize(actor, "read domains")?;
        if let Some(domain) = self.domains.read().ok().and_then(|c| c.get(name).cloned()) {
            return Ok(Some(domain));
        }
        let domain: Option<Domain> = self.get(DOMAINS, name.as_bytes())?;
        if let (Some(found), Ok(mut cache)) = (&domain, self.domains.write()) {
            cache.insert(name.to_string(), found.clone());
        }
        Ok(domain)
    }

    fn hosts(&self, actor: &Actor, domain: &str) -> StoreResult<Vec<Host>> {
        authorize(actor, "read hosts")?;
        let txn = self.read()?;
        let table = txn.open_table(HOSTS).map_err(storage)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(storage)? {
            let (_, value) = entry.map_err(storage)?;
            let host: Host = decode(value.value())?;
            if host.domain == domain {
                out.push(host);
            }
        }
        Ok(out)
    }

    fn groups(&self, actor: &Actor, domain: &str) -> StoreResult<Vec<Group>> {
        authorize(actor, "read groups")?;
        self.scan(GROUPS, &domain_start_key(domain), &domain_end_key(domain))
    }

    fn group(&self, actor: &Actor, domain: &str, name: &str) -> StoreResult<Option<Group>> {
        authorize(actor, "read groups")?;
        self.get(GROUPS, &scoped_key(domain, name))
    }

    fn user_count(&self, actor: &Actor, domain: &str) -> StoreResult<usize> {
        authorize(actor, "read users")?;
        let start = domain_start_key(domain);
        let end = domain_end_key(domain);
        let txn = self.read()?;
        let table = txn.open_table(USERS).map_err(storage)?;
        let mut count = 0;
        for entry in table.range(start.as_slice()..end.as_slice()).map_err(storage)? {
            entry.map_err(storage)?;
            count += 1;
        }
        Ok(count)
    }

    fn users(
        &self,
        actor: &Actor,
        domain: &str,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<User>> {
        authorize(actor, "read users")?;
        let start = domain_start_key(domain);
        let end = domain_end_key(domain);
        let txn = self.read()?;
        let table = txn.open_table(USERS).map_err(storage)?;
        let mut out = Vec::new();
        let page = table.range(start.as_slice()..end.as_slice()).map_err(storage)?;
        for entry in page.skip(offset).take(limit) {
            let (_, value) = entry.map_err(storage)?;
            out.push(decode(value.value())?);
        }
        Ok(out)
    }

    fn user(&self, actor: &Actor, domain: &str, name: &str) -> StoreResult<Option<User>> {
        authorize(actor, "read users")?;
        self.get(USERS, &scoped_key(domain, name))
    }

    fn content_count(&self, actor: &Actor, query: &ContentQuery) -> StoreResult<usize> {
        authorize(actor, "read content")?;
        Ok(self.children(&query.domain, query.parent)?.len())
    }

    fn contents(&self, actor: &Actor, query: &ContentQuery) -> StoreResult<Vec<ContentId>> {
        authorize(actor, "read content")?;
        let mut children = self.children(&query.domain, query.parent)?;
        if query.order == ContentOrder::CategoryDescending {
            children.sort_by_key(|&(id, code)| (Reverse(code), id));
        }
        Ok(children.into_iter().skip(query.offset).take(query.limit).map(|(id, _)| id).collect())
    }

    fn revisions(&self, actor: &Actor, id: ContentId) -> StoreResult<Vec<Revision>> {
        authorize(actor, "read content")?;
        let (start, end) = revision_range(id);
        let mut revisions: Vec<Revision> = self.scan(REVISIONS, &start, &end)?;
        if revisions.first().is_some_and(Revision::is_work) {
            revisions.rotate_left(1);
        }
        Ok(revisions)
    }

    fn permissions(
        &self,
        actor: &Actor,
        domain: &str,
        content: ContentId,
    ) -> StoreResult<Option<PermissionList>> {
        authorize(actor, "read permissions")?;
        self.get(PERMISSIONS, &scoped_id_key(domain, content))
    }

    fn lock(&self, actor: &Actor, id: ContentId) -> StoreResult<Option<Lock>> {
        authorize(actor, "read locks")?;
        self.get(LOCKS, &id_key(id))
    }

    fn domain_dir(&self, domain: &str) -> PathBuf {
        self.config.files_dir.join(domain)
    }

    fn restore_domain(&self, actor: &Actor, domain: &Domain) -> StoreResult<()> {
        authorize(actor, "create domains")?;
        if domain.name.is_empty() {
            return Err(StoreError::InvalidInput("empty domain name".to_string()));
        }
        if let Some(c) = Domain::invalid_name_char(&domain.name) {
            return Err(StoreError::InvalidInput(format!(
                "invalid character '{c}' in domain name '{}'",
                domain.name
            )));
        }
        let txn = self.write()?;
        if contains(&txn, DOMAINS, domain.name.as_bytes())? {
            return Err(StoreError::conflict(format!("domain '{}' already exists", domain.name)));
        }
        insert(&txn, DOMAINS, domain.name.as_bytes(), domain)?;
        txn.commit().map_err(storage)?;
        debug!(domain = %domain.name, "created domain");
        Ok(())
    }

    fn restore_host(&self, actor: &Actor, host: &Host) -> StoreResult<()> {
        authorize(actor, "create hosts")?;
        let txn = self.write()?;
        Self::require_domain(&txn, &host.domain)?;
        if let Some(existing) = fetch::<Host>(&txn, HOSTS, host.name.as_bytes())? {
            return Err(StoreError::conflict(format!(
                "host '{}' already belongs to domain '{}'",
                host.name, existing.domain
            )));
        }
        insert(&txn, HOSTS, host.name.as_bytes(), host)?;
        txn.commit().map_err(storage)?;
        Ok(())
    }

    fn restore_group(&self, actor: &Actor, group: &Group) -> StoreResult<()> {
        authorize(actor, "create groups")?;
        let txn = self.write()?;
        Self::require_domain(&txn, &group.domain)?;
        let key = scoped_key(&group.domain, &group.name);
        if contains(&txn, GROUPS, &key)? {
            return Err(StoreError::conflict(format!("group '{}' already exists", group.name)));
        }
        insert(&txn, GROUPS, &key, group)?;
        txn.commit().map_err(storage)?;
        Ok(())
    }

    fn restore_user(&self, actor: &Actor, user: &User) -> StoreResult<()> {
        authorize(actor, "create users")?;
        let txn = self.write()?;
        Self::require_domain(&txn, &user.domain)?;
        for group in &user.groups {
            Self::require_group(&txn, &user.domain, group)?;
        }
        let key = scoped_key(&user.domain, &user.name);
        if contains(&txn, USERS, &key)? {
            return Err(StoreError::conflict(format!("user '{}' already exists", user.name)));
        }
        insert(&txn, USERS, &key, user)?;
        txn.commit().map_err(storage)?;
        Ok(())
    }

    fn restore_revision(&self, actor: &Actor, revision: &mut Revision) -> StoreResult<ContentId> {
        authorize(actor, "write content")?;
        let txn = self.write()?;
        Self::require_domain(&txn, &revision.domain)?;
        if !revision.parent.is_none() {
            let parent: Option<ContentRecord> = fetch(&txn, CONTENTS, &id_key(revision.parent))?;
            match parent {
                Some(record) if record.domain == revision.domain => {}
                _ => return Err(StoreError::not_found("content", revision.parent.to_string())),
            }
        }

        let existing = if revision.content.is_none() {
            revision.content = allocate_content_id(&txn)?;
            None
        } else {
            reserve_content_id(&txn, revision.content)?;
            fetch::<ContentRecord>(&txn, CONTENTS, &id_key(revision.content))?
        };
        let id = revision.content;

        if let Some(record) = &existing {
            if record.domain != revision.domain {
                return Err(StoreError::conflict(format!(
                    "content {id} belongs to domain '{}'",
                    record.domain
                )));
            }
            if record.parent != revision.parent {
                remove(&txn, CONTENT_TREE, &tree_key(&record.domain, record.parent, id))?;
            }
        }

        let record = ContentRecord {
            domain: revision.domain.clone(),
            category: revision.category,
            parent: revision.parent,
        };
        insert(&txn, CONTENTS, &id_key(id), &record)?;
        insert_raw(
            &txn,
            CONTENT_TREE,
            &tree_key(&record.domain, record.parent, id),
            &[record.category.code()],
        )?;
        insert(&txn, REVISIONS, &revision_key(id, revision.number), &*revision)?;
        txn.commit().map_err(storage)?;
        Ok(id)
    }

    fn restore_permissions(&self, actor: &Actor, list: &PermissionList) -> StoreResult<()> {
        authorize(actor, "write permissions")?;
        let txn = self.write()?;
        Self::require_domain(&txn, &list.domain)?;
        if !list.content.is_none() && !contains(&txn, CONTENTS, &id_key(list.content))? {
            return Err(StoreError::not_found("content", list.content.to_string()));
        }
        for entry in &list.entries {
            if let Some(user) = &entry.user {
                Self::require_user(&txn, &list.domain, user)?;
            }
            if let Some(group) = &entry.group {
                Self::require_group(&txn, &list.domain, group)?;
            }
        }
        insert(&txn, PERMISSIONS, &scoped_id_key(&list.domain, list.content), list)?;
        txn.commit().map_err(storage)?;
        Ok(())
    }

    fn restore_lock(&self, actor: &Actor, lock: &Lock) -> StoreResult<()> {
        authorize(actor, "write locks")?;
        let txn = self.write()?;
        let record: ContentRecord = fetch(&txn, CONTENTS, &id_key(lock.content))?
            .ok_or_else(|| StoreError::not_found("content", lock.content.to_string()))?;
        Self::require_user(&txn, &record.domain, &lock.user)?;
        insert(&txn, LOCKS, &id_key(lock.content), lock)?;
        txn.commit().map_err(storage)?;
        Ok(())
    }

    fn delete_domain(&self, actor: &Actor, name: &str) -> StoreResult<()> {
        authorize(actor, "delete domains")?;
        let txn = self.write()?;
        Self::require_domain(&txn, name)?;
        remove(&txn, DOMAINS, name.as_bytes())?;

        let start = domain_start_key(name);
        let end = domain_end_key(name);
        for table in [GROUPS, USERS, PERMISSIONS] {
            remove_range(&txn, table, &start, &end)?;
        }
        let mut contents = 0usize;
        for key in remove_range(&txn, CONTENT_TREE, &start, &end)? {
            let Some(id) = tree_key_id(&key) else { continue };
            remove(&txn, CONTENTS, &id_key(id))?;
            remove(&txn, LOCKS, &id_key(id))?;
            let (first, last) = revision_range(id);
            remove_range(&txn, REVISIONS, &first, &last)?;
            contents += 1;
        }

        let hosts: Vec<Vec<u8>> = {
            let table = txn.open_table(HOSTS).map_err(storage)?;
            let mut keys = Vec::new();
            for entry in table.iter().map_err(storage)? {
                let (key, value) = entry.map_err(storage)?;
                let host: Host = decode(value.value())?;
                if host.domain == name {
                    keys.push(key.value().to_vec());
                }
            }
            keys
        };
        for key in &hosts {
            remove(&txn, HOSTS, key)?;
        }
        txn.commit().map_err(storage)?;
        self.forget_domain(name);

        let dir = self.domain_dir(name);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        debug!(domain = name, contents, hosts = hosts.len(), "deleted domain");
        Ok(())
    }

    fn reset(&self) {
        if let Ok(mut cache) = self.domains.write() {
            cache.clear();
        }
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").field("config", &self.config).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitevault_core::{Category, Permission};

    fn store() -> (tempfile::TempDir, RedbStore) {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store =
            RedbStore::in_memory(StoreConfig::new(dir.path())).expect("failed to create store");
        (dir, store)
    }

    fn admin() -> Actor {
        Actor::system()
    }

    #[test]
    fn test_config_builder() {
        let config = StoreConfig::new("/var/lib/sitevault").cache_size(1024 * 1024);
        assert_eq!(config.files_dir, PathBuf::from("/var/lib/sitevault"));
        assert_eq!(config.cache_size, Some(1024 * 1024));
    }

    #[test]
    fn test_non_superuser_is_denied() {
        let (_dir, store) = store();
        let err = store
            .restore_domain(&Actor::user("guest"), &Domain::new("EXAMPLE"))
            .expect_err("guest must not create domains");
        assert!(err.is_security());

        let err = store.domain(&Actor::user("guest"), "EXAMPLE").expect_err("guest read");
        assert!(err.is_security());
    }

    #[test]
    fn test_domain_conflict() {
        let (_dir, store) = store();
        store.restore_domain(&admin(), &Domain::new("EXAMPLE")).expect("failed to create");
        let err =
            store.restore_domain(&admin(), &Domain::new("EXAMPLE")).expect_err("duplicate domain");
        assert!(err.is_conflict());
        assert!(store.domain(&admin(), "EXAMPLE").expect("lookup").is_some());
    }

    #[test]
    fn test_host_names_are_global() {
        let (_dir, store) = store();
        store.restore_domain(&admin(), &Domain::new("ONE")).expect("failed to create");
        store.restore_domain(&admin(), &Domain::new("TWO")).expect("failed to create");
        store.restore_host(&admin(), &Host::new("ONE", "www.example.com")).expect("host");

        let err = store
            .restore_host(&admin(), &Host::new("TWO", "www.example.com"))
            .expect_err("host name is taken");
        assert!(err.is_conflict());
        assert!(store.hosts(&admin(), "TWO").expect("hosts").is_empty());
    }

    #[test]
    fn test_user_requires_groups() {
        let (_dir, store) = store();
        store.restore_domain(&admin(), &Domain::new("EXAMPLE")).expect("failed to create");
        let user = User::new("EXAMPLE", "alice").in_group("editors");
        let err = store.restore_user(&admin(), &user).expect_err("missing group");
        assert!(matches!(err, StoreError::NotFound { kind: "group", .. }));

        store.restore_group(&admin(), &Group::new("EXAMPLE", "editors")).expect("group");
        store.restore_user(&admin(), &user).expect("user");
        assert_eq!(store.user_count(&admin(), "EXAMPLE").expect("count"), 1);
    }

    #[test]
    fn test_users_are_paged_by_name() {
        let (_dir, store) = store();
        store.restore_domain(&admin(), &Domain::new("EXAMPLE")).expect("failed to create");
        for name in ["carol", "alice", "bob"] {
            store.restore_user(&admin(), &User::new("EXAMPLE", name)).expect("user");
        }
        let page: Vec<_> = store
            .users(&admin(), "EXAMPLE", 1, 5)
            .expect("users")
            .into_iter()
            .map(|u| u.name)
            .collect();
        assert_eq!(page, vec!["bob".to_string(), "carol".to_string()]);
    }

    #[test]
    fn test_revisions_list_work_revision_last() {
        let (_dir, store) = store();
        store.restore_domain(&admin(), &Domain::new("EXAMPLE")).expect("failed to create");

        let mut first = Revision::new("EXAMPLE", Category::Page, "index").with_number(1);
        let id = store.restore_revision(&admin(), &mut first).expect("revision 1");
        assert_eq!(first.content, id);

        for number in [0, 2] {
            let mut rev = Revision::new("EXAMPLE", Category::Page, "index").with_number(number);
            rev.content = id;
            assert_eq!(store.restore_revision(&admin(), &mut rev).expect("revision"), id);
        }

        let numbers: Vec<_> =
            store.revisions(&admin(), id).expect("revisions").iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 0]);
    }

    #[test]
    fn test_contents_ordering() {
        let (_dir, store) = store();
        store.restore_domain(&admin(), &Domain::new("EXAMPLE")).expect("failed to create");

        let mut site = Revision::new("EXAMPLE", Category::Site, "site");
        let site_id = store.restore_revision(&admin(), &mut site).expect("site");
        let mut template = Revision::new("EXAMPLE", Category::Template, "layout");
        let template_id = store.restore_revision(&admin(), &mut template).expect("template");
        let mut page = Revision::new("EXAMPLE", Category::Page, "index").with_parent(site_id);
        let page_id = store.restore_revision(&admin(), &mut page).expect("page");

        let roots = store.contents(&admin(), &ContentQuery::roots("EXAMPLE")).expect("roots");
        assert_eq!(roots, vec![template_id, site_id]);

        let query = ContentQuery::children("EXAMPLE", site_id);
        assert_eq!(store.contents(&admin(), &query).expect("children"), vec![page_id]);
        assert_eq!(store.content_count(&admin(), &query).expect("count"), 1);

        let mut orphan =
            Revision::new("EXAMPLE", Category::Page, "orphan").with_parent(ContentId::new(999));
        let err = store.restore_revision(&admin(), &mut orphan).expect_err("missing parent");
        assert!(matches!(err, StoreError::NotFound { kind: "content", .. }));
    }

    #[test]
    fn test_explicit_ids_reserve_the_counter() {
        let (_dir, store) = store();
        store.restore_domain(&admin(), &Domain::new("EXAMPLE")).expect("failed to create");

        let mut explicit = Revision::new("EXAMPLE", Category::Folder, "docs");
        explicit.content = ContentId::new(40);
        store.restore_revision(&admin(), &mut explicit).expect("explicit");

        let mut fresh = Revision::new("EXAMPLE", Category::Folder, "more");
        let id = store.restore_revision(&admin(), &mut fresh).expect("fresh");
        assert_eq!(id, ContentId::new(41));
    }

    #[test]
    fn test_permissions_and_locks() {
        let (_dir, store) = store();
        store.restore_domain(&admin(), &Domain::new("EXAMPLE")).expect("failed to create");
        store.restore_user(&admin(), &User::new("EXAMPLE", "alice")).expect("user");
        let mut page = Revision::new("EXAMPLE", Category::Page, "index");
        let id = store.restore_revision(&admin(), &mut page).expect("page");

        assert!(store.permissions(&admin(), "EXAMPLE", id).expect("perms").is_none());
        let list = PermissionList::new("EXAMPLE", id);
        store.restore_permissions(&admin(), &list).expect("empty list");
        let stored = store.permissions(&admin(), "EXAMPLE", id).expect("perms");
        assert_eq!(stored, Some(list));

        let bad = PermissionList::new("EXAMPLE", id).with(Permission::for_user("mallory"));
        assert!(store.restore_permissions(&admin(), &bad).is_err());

        let lock = Lock { content: id, user: "alice".to_string(), acquired: 1_000 };
        store.restore_lock(&admin(), &lock).expect("lock");
        assert_eq!(store.lock(&admin(), id).expect("lock"), Some(lock));

        let orphan = Lock { content: id, user: "nobody".to_string(), acquired: 0 };
        assert!(store.restore_lock(&admin(), &orphan).is_err());
    }

    #[test]
    fn test_delete_domain_removes_everything() {
        let (dir, store) = store();
        store.restore_domain(&admin(), &Domain::new("EXAMPLE")).expect("failed to create");
        store.restore_host(&admin(), &Host::new("EXAMPLE", "example.com")).expect("host");
        store.restore_group(&admin(), &Group::new("EXAMPLE", "staff")).expect("group");
        let mut page = Revision::new("EXAMPLE", Category::Page, "index");
        let id = store.restore_revision(&admin(), &mut page).expect("page");
        let files = store.domain_dir("EXAMPLE").join(id.to_string());
        fs::create_dir_all(&files).expect("failed to create dir");

        store.delete_domain(&admin(), "EXAMPLE").expect("delete");

        assert!(store.domain(&admin(), "EXAMPLE").expect("lookup").is_none());
        assert!(store.revisions(&admin(), id).expect("revisions").is_empty());
        assert!(store.groups(&admin(), "EXAMPLE").expect("groups").is_empty());
        assert!(!dir.path().join("EXAMPLE").exists());

        // The host name is free again.
        store.restore_domain(&admin(), &Domain::new("OTHER")).expect("failed to create");
        store.restore_host(&admin(), &Host::new("OTHER", "example.com")).expect("host");
    }
}
