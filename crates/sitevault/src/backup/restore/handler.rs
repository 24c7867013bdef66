//! The restore state machine.
//!
//! [`RestoreHandler`] receives start, end and text events of the backup
//! document and writes objects to the store as soon as they are complete:
//! domain, hosts and groups when their element opens, users, revisions and
//! permission lists when their element closes. It does not depend on any XML
//! library; see [`reader`](super::reader) for the driver.
//!
//! Contents are written when their element closes, or when the first nested
//! `<content>` opens inside them. Either way a parent is always persisted
//! before its children, so `parent` references can be translated on sight.

use sitevault_core::types::now_millis;
use sitevault_core::{
    Actor, Category, ContentId, ContentStore, Domain, Group, Host, Lock, Permission,
    PermissionList, Revision, User,
};
use tracing::{debug, info, warn};

use super::frames::{
    AttributeFrame, ContentFrame, DomainFrame, Frame, FrameStack, PendingLock, RevisionFrame,
    UserFrame, MAX_DEPTH,
};
use super::manifest::FileManifest;
use super::mode::RevisionMode;
use super::rewrite::{IdTranslation, ReferenceRewrite};
use crate::backup::error::{BackupError, BackupResult};
use crate::backup::format::{
    archive_path, checked_file_name, elements, parse_date, FORMAT_VERSION, ROOT_ELEMENT,
};
use crate::backup::types::BackupStatistics;

/// The attributes of one start element, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementAttributes {
    pairs: Vec<(String, String)>,
}

impl ElementAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// The unescaped value of an attribute.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// The value of an attribute, or the empty string when it is absent.
    fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    /// The value of an attribute, treating an empty value as absent.
    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ElementAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Everything a finished parse hands to the coordinator.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    /// Archive content ids mapped to the ids assigned in the target domain.
    pub ids: IdTranslation,
    /// Content files to extract.
    pub files: FileManifest,
    /// `false` if some element was skipped.
    pub complete: bool,
    pub statistics: BackupStatistics,
}

/// Push-style parser rebuilding a domain from backup document events.
pub struct RestoreHandler<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    actor: &'a Actor,
    target: String,
    mode: RevisionMode,
    stack: FrameStack,
    /// Domain name recorded in the archive; prefixes archive file paths.
    source_domain: Option<String>,
    domain_created: bool,
    document_closed: bool,
    ids: IdTranslation,
    files: FileManifest,
    complete: bool,
    statistics: BackupStatistics,
    position: u64,
}

impl<'a, S: ContentStore + ?Sized> RestoreHandler<'a, S> {
    /// Create a handler restoring into the not yet existing domain `target`.
    pub fn new(
        store: &'a S,
        actor: &'a Actor,
        target: impl Into<String>,
        mode: RevisionMode,
    ) -> Self {
        Self {
            store,
            actor,
            target: target.into(),
            mode,
            stack: FrameStack::new(),
            source_domain: None,
            domain_created: false,
            document_closed: false,
            ids: IdTranslation::new(),
            files: FileManifest::new(),
            complete: true,
            statistics: BackupStatistics::default(),
            position: 0,
        }
    }

    /// Set the document offset reported in errors for the next event.
    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    /// Whether the target domain has been created in the store.
    pub const fn domain_created(&self) -> bool {
        self.domain_created
    }

    /// The translation map built so far.
    pub const fn ids(&self) -> &IdTranslation {
        &self.ids
    }

    fn malformed(&self, msg: impl Into<String>) -> BackupError {
        BackupError::malformed(self.position, msg)
    }

    fn required<'v>(
        &self,
        attrs: &'v ElementAttributes,
        element: &str,
        key: &str,
    ) -> BackupResult<&'v str> {
        attrs
            .get(key)
            .ok_or_else(|| self.malformed(format!("<{element}> is missing the '{key}' attribute")))
    }

    fn date(&self, attrs: &ElementAttributes, key: &str) -> BackupResult<Option<i64>> {
        match attrs.get(key) {
            None => Ok(None),
            Some(value) => parse_date(value)
                .map_err(|_| self.malformed(format!("invalid {key} date '{value}'"))),
        }
    }

    /// Handle a start element.
    pub fn start_element(&mut self, name: &str, attrs: &ElementAttributes) -> BackupResult<()> {
        match self.stack.top() {
            None if self.document_closed => {
                return Err(self.malformed(format!("<{name}> after the end of the document")));
            }
            None => return self.start_document(name, attrs),
            Some(top) if !top.allows(name) => {
                return Err(
                    self.malformed(format!("unexpected <{name}> inside <{}>", top.element()))
                );
            }
            Some(_) if self.stack.depth() >= MAX_DEPTH => {
                return Err(self.malformed(format!("elements nested deeper than {MAX_DEPTH}")));
            }
            Some(_) => {}
        }

        match name {
            elements::DOMAIN => self.start_domain(attrs),
            elements::HOST => {
                self.restore_host(attrs)?;
                self.stack.push(Frame::Leaf(elements::HOST));
                Ok(())
            }
            elements::GROUP => {
                self.restore_group(attrs)?;
                self.stack.push(Frame::Leaf(elements::GROUP));
                Ok(())
            }
            elements::USER => self.start_user(attrs),
            elements::MEMBER => {
                self.add_member(attrs)?;
                self.stack.push(Frame::Leaf(elements::MEMBER));
                Ok(())
            }
            elements::CONTENT => self.start_content(attrs),
            elements::REVISION => self.start_revision(attrs),
            elements::ATTRIBUTE => {
                let key = self.required(attrs, elements::ATTRIBUTE, "name")?.to_string();
                let frame = AttributeFrame { name: key, text: String::new() };
                self.stack.push(Frame::Attribute(frame));
                Ok(())
            }
            elements::PERMISSIONS => {
                if let Some(owner) = self.stack.permission_owner_mut() {
                    owner.get_or_insert_with(Vec::new);
                }
                self.stack.push(Frame::Permissions);
                Ok(())
            }
            elements::PERMISSION => {
                let permission = self.permission(attrs)?;
                if let Some(owner) = self.stack.permission_owner_mut() {
                    owner.get_or_insert_with(Vec::new).push(permission);
                }
                self.stack.push(Frame::Leaf(elements::PERMISSION));
                Ok(())
            }
            elements::LOCK => {
                self.start_lock(attrs)?;
                self.stack.push(Frame::Leaf(elements::LOCK));
                Ok(())
            }
            other => Err(self.malformed(format!("unknown element <{other}>"))),
        }
    }

    /// Handle an end element.
    pub fn end_element(&mut self, name: &str) -> BackupResult<()> {
        let Some(frame) = self.stack.pop() else {
            return Err(self.malformed(format!("unexpected </{name}>")));
        };
        if frame.element() != name {
            return Err(
                self.malformed(format!("expected </{}>, found </{name}>", frame.element()))
            );
        }

        match frame {
            Frame::Document => self.document_closed = true,
            Frame::Domain(mut domain) => {
                if let Some(entries) = domain.permissions.take() {
                    self.write_permissions(ContentId::NONE, entries)?;
                }
            }
            Frame::User(frame) => {
                self.store.restore_user(self.actor, &frame.user)?;
                self.statistics.add_user();
            }
            Frame::Content(mut content) => self.persist_content(&mut content)?,
            Frame::Revision(frame) => match self.stack.top_mut() {
                Some(Frame::Content(content)) => content.revisions.push(frame.revision),
                _ => return Err(self.malformed("<revision> outside of <content>")),
            },
            Frame::Attribute(attribute) => {
                let value = ReferenceRewrite::for_attribute(&attribute.name)
                    .apply(&attribute.text, &self.ids)
                    .into_owned();
                match self.stack.top_mut() {
                    Some(Frame::Revision(frame)) => {
                        frame.revision.attributes.insert(attribute.name, value);
                    }
                    _ => return Err(self.malformed("<attribute> outside of <revision>")),
                }
            }
            Frame::Permissions | Frame::Leaf(_) => {}
        }
        Ok(())
    }

    /// Handle character data. Text outside of `<attribute>` is ignored.
    pub fn characters(&mut self, text: &str) {
        if let Some(Frame::Attribute(attribute)) = self.stack.top_mut() {
            attribute.text.push_str(text);
        }
    }

    /// Finish the parse once the document has been consumed.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Malformed`] if the document ended early or
    /// contained no domain.
    pub fn finish(self) -> BackupResult<RestoreOutcome> {
        if let Some(top) = self.stack.top() {
            return Err(
                self.malformed(format!("unexpected end of document inside <{}>", top.element()))
            );
        }
        if self.source_domain.is_none() {
            return Err(self.malformed("document contains no <domain>"));
        }
        info!(
            domain = %self.target,
            contents = self.statistics.contents,
            revisions = self.statistics.revisions,
            complete = self.complete,
            "restored domain data"
        );
        Ok(RestoreOutcome {
            ids: self.ids,
            files: self.files,
            complete: self.complete,
            statistics: self.statistics,
        })
    }

    fn start_document(&mut self, name: &str, attrs: &ElementAttributes) -> BackupResult<()> {
        if name != ROOT_ELEMENT {
            return Err(self.malformed(format!("expected <{ROOT_ELEMENT}>, found <{name}>")));
        }
        if let Some(version) = attrs.get("version") {
            if version.trim() != FORMAT_VERSION {
                return Err(BackupError::UnsupportedVersion(version.to_string()));
            }
        }
        self.stack.push(Frame::Document);
        Ok(())
    }

    fn start_domain(&mut self, attrs: &ElementAttributes) -> BackupResult<()> {
        if self.source_domain.is_some() {
            return Err(self.malformed("more than one <domain>"));
        }
        let source = self.required(attrs, elements::DOMAIN, "name")?.to_string();
        let now = now_millis();
        let domain = Domain {
            name: self.target.clone(),
            description: attrs.text("description"),
            created: self.date(attrs, "created")?.unwrap_or(now),
            modified: self.date(attrs, "modified")?.unwrap_or(now),
            mail_from: attrs.non_empty("mailfrom").map(str::to_string),
        };
        self.store.restore_domain(self.actor, &domain)?;
        self.domain_created = true;
        info!(source = %source, domain = %self.target, mode = %self.mode, "restoring domain");

        self.source_domain = Some(source);
        self.stack.push(Frame::Domain(DomainFrame::default()));
        Ok(())
    }

    fn restore_host(&mut self, attrs: &ElementAttributes) -> BackupResult<()> {
        let host = Host {
            domain: self.target.clone(),
            name: self.required(attrs, elements::HOST, "name")?.to_string(),
            description: attrs.text("description"),
        };
        match self.store.restore_host(self.actor, &host) {
            Ok(()) => {
                self.statistics.add_host();
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                warn!(host = %host.name, error = %e, "skipping host");
                self.complete = false;
                self.statistics.add_skipped();
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn restore_group(&mut self, attrs: &ElementAttributes) -> BackupResult<()> {
        let group = Group {
            domain: self.target.clone(),
            name: self.required(attrs, elements::GROUP, "name")?.to_string(),
            description: attrs.text("description"),
            public: attrs.get("public").is_some(),
            comment: attrs.text("comment"),
        };
        self.store.restore_group(self.actor, &group)?;
        self.statistics.add_group();
        Ok(())
    }

    fn start_user(&mut self, attrs: &ElementAttributes) -> BackupResult<()> {
        let user = User {
            domain: self.target.clone(),
            name: self.required(attrs, elements::USER, "name")?.to_string(),
            password: attrs.text("password"),
            enabled: attrs.get("disabled").is_none(),
            real_name: attrs.text("realname"),
            email: attrs.text("email"),
            comment: attrs.text("comment"),
            groups: Vec::new(),
        };
        self.stack.push(Frame::User(UserFrame { user }));
        Ok(())
    }

    fn add_member(&mut self, attrs: &ElementAttributes) -> BackupResult<()> {
        let group = self.required(attrs, elements::MEMBER, "group")?;
        if self.store.group(self.actor, &self.target, group)?.is_none() {
            return Err(BackupError::missing_reference("group", group));
        }
        if let Some(Frame::User(frame)) = self.stack.top_mut() {
            frame.user.groups.push(group.to_string());
        }
        Ok(())
    }

    fn start_content(&mut self, attrs: &ElementAttributes) -> BackupResult<()> {
        let id = self.required(attrs, elements::CONTENT, "id")?;
        let old_id = id
            .trim()
            .parse::<ContentId>()
            .map_err(|_| self.malformed(format!("invalid content id '{id}'")))?;
        let code = self.required(attrs, elements::CONTENT, "category")?;
        let category = code
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(Category::from_code)
            .ok_or_else(|| self.malformed(format!("unknown content category '{code}'")))?;

        if let Some(entries) = self.stack.domain_mut().and_then(|d| d.permissions.take()) {
            self.write_permissions(ContentId::NONE, entries)?;
        }
        if matches!(self.stack.top(), Some(Frame::Content(_))) {
            if let Some(Frame::Content(mut parent)) = self.stack.pop() {
                let persisted = self.persist_content(&mut parent);
                self.stack.push(Frame::Content(parent));
                persisted?;
            }
        }

        self.stack.push(Frame::Content(ContentFrame::new(old_id, category)));
        Ok(())
    }

    fn start_revision(&mut self, attrs: &ElementAttributes) -> BackupResult<()> {
        let (category, old_id, persisted) = match self.stack.top() {
            Some(Frame::Content(content)) => {
                (content.category, content.old_id, content.new_id.is_some())
            }
            _ => return Err(self.malformed("<revision> outside of <content>")),
        };
        if persisted {
            return Err(self.malformed(format!(
                "revision of content {old_id} follows its child contents"
            )));
        }

        let nr = self.required(attrs, elements::REVISION, "nr")?;
        let number = nr
            .trim()
            .parse::<u32>()
            .map_err(|_| self.malformed(format!("invalid revision number '{nr}'")))?;
        let mut revision = Revision::new(self.target.clone(), category, attrs.text("name"))
            .with_number(number)
            .with_parent(self.ids.translate_text(attrs.get("parent").unwrap_or("0")))
            .with_author(attrs.text("author"));
        revision.online = self.date(attrs, "online")?;
        revision.offline = self.date(attrs, "offline")?;
        revision.modified = self.date(attrs, "modified")?;
        revision.comment = attrs.text("comment");

        self.stack.push(Frame::Revision(RevisionFrame { revision }));
        Ok(())
    }

    fn permission(&self, attrs: &ElementAttributes) -> BackupResult<Permission> {
        let user = attrs.non_empty("user");
        if let Some(name) = user {
            if self.store.user(self.actor, &self.target, name)?.is_none() {
                return Err(BackupError::missing_reference("user", name));
            }
        }
        let group = attrs.non_empty("group");
        if let Some(name) = group {
            if self.store.group(self.actor, &self.target, name)?.is_none() {
                return Err(BackupError::missing_reference("group", name));
            }
        }
        let permission = Permission {
            user: user.map(str::to_string),
            group: group.map(str::to_string),
            ..Permission::default()
        };
        Ok(permission.with_flags(attrs.get("flags").unwrap_or_default()))
    }

    fn start_lock(&mut self, attrs: &ElementAttributes) -> BackupResult<()> {
        let user = self.required(attrs, elements::LOCK, "user")?;
        if self.store.user(self.actor, &self.target, user)?.is_none() {
            return Err(BackupError::missing_reference("user", user));
        }
        let acquired = self.date(attrs, "acquired")?.unwrap_or(0);
        let lock = PendingLock { user: user.to_string(), acquired };
        match self.stack.content_mut() {
            Some(content) => content.lock = Some(lock),
            None => return Err(self.malformed("<lock> outside of <content>")),
        }
        Ok(())
    }

    /// Write a content's revisions, then its pending permissions and lock.
    ///
    /// Revisions are written once; later calls only flush permissions and
    /// locks that arrived after the first call.
    fn persist_content(&mut self, content: &mut ContentFrame) -> BackupResult<()> {
        let id = match content.new_id {
            Some(id) => id,
            None => {
                let id = self.write_revisions(content)?;
                content.new_id = Some(id);
                id
            }
        };
        if let Some(entries) = content.permissions.take() {
            self.write_permissions(id, entries)?;
        }
        if let Some(pending) = content.lock.take() {
            let lock = Lock { content: id, user: pending.user, acquired: pending.acquired };
            self.store.restore_lock(self.actor, &lock)?;
            self.statistics.add_lock();
        }
        Ok(())
    }

    fn write_revisions(&mut self, content: &mut ContentFrame) -> BackupResult<ContentId> {
        if content.revisions.is_empty() {
            return Err(self.malformed(format!("content {} has no revisions", content.old_id)));
        }
        let mut id = ContentId::NONE;
        for mut revision in self.mode.select(std::mem::take(&mut content.revisions)) {
            revision.content = id;
            id = self.store.restore_revision(self.actor, &mut revision)?;
            self.statistics.add_revision();
            self.register_file(content, &revision, id)?;
        }

        if !self.ids.insert(content.old_id, id) {
            warn!(id = %content.old_id, "duplicate content id in archive, keeping first mapping");
        }
        self.statistics.add_content();
        debug!(old = %content.old_id, new = %id, category = ?content.category, "restored content");
        Ok(id)
    }

    fn register_file(
        &mut self,
        content: &ContentFrame,
        revision: &Revision,
        id: ContentId,
    ) -> BackupResult<()> {
        if !content.category.policy().carries_file() {
            return Ok(());
        }
        let Some(name) = revision.file_name().filter(|name| !name.is_empty()) else {
            debug!(id = %content.old_id, "file content without a file name");
            return Ok(());
        };
        let name = checked_file_name(name)?;
        let source = self.source_domain.as_deref().unwrap_or_default();
        let destination = self.store.domain_dir(&self.target).join(id.to_string()).join(name);
        self.files.add(archive_path(source, content.old_id, name), destination);
        Ok(())
    }

    fn write_permissions(
        &mut self,
        content: ContentId,
        entries: Vec<Permission>,
    ) -> BackupResult<()> {
        let list = PermissionList { domain: self.target.clone(), content, entries };
        self.store.restore_permissions(self.actor, &list)?;
        self.statistics.add_permission_list();
        Ok(())
    }
}
