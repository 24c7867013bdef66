//! Writing a domain to an archive.

use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, Write};
use std::path::Path;

use sitevault_core::{
    Actor, ContentId, ContentQuery, ContentStore, Domain, Group, Host, Lock, Permission, Revision,
    User,
};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::{BackupError, BackupResult};
use super::format::{
    elements, format_date, Element, XmlWriter, DATA_ENTRY, FORMAT_VERSION, ROOT_ELEMENT,
};
use super::types::{BackupStatistics, ExportOptions, ExportReport};

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Writes a domain with all of its principals, contents and files to a zip
/// archive.
///
/// Users and contents are read from the store one page at a time, so only
/// a single page and the path from the root to the current content are held
/// in memory.
pub struct DomainExporter<'a, S: ContentStore + ?Sized> {
    store: &'a S,
    actor: &'a Actor,
    options: ExportOptions,
}

impl<'a, S: ContentStore + ?Sized> DomainExporter<'a, S> {
    pub fn new(store: &'a S, actor: &'a Actor) -> Self {
        Self::with_options(store, actor, ExportOptions::default())
    }

    pub fn with_options(store: &'a S, actor: &'a Actor, options: ExportOptions) -> Self {
        Self { store, actor, options }
    }

    /// Export domain `name` into a new archive file at `dest`.
    ///
    /// The file is removed again if the export fails.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::DomainNotFound`] for an unknown domain, and
    /// any store or I/O error encountered while writing.
    pub fn export_domain(&self, name: &str, dest: impl AsRef<Path>) -> BackupResult<ExportReport> {
        let dest = dest.as_ref();
        let result = File::create(dest)
            .map_err(BackupError::from)
            .and_then(|file| self.write_archive(name, BufWriter::new(file)));
        if let Err(err) = &result {
            error!(domain = name, path = %dest.display(), error = %err, "export failed");
            if let Err(e) = fs::remove_file(dest) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %dest.display(), error = %e, "failed to remove partial archive");
                }
            }
        }
        result
    }

    /// Export domain `name` as a zip archive written to `sink`.
    ///
    /// # Errors
    ///
    /// See [`export_domain`](Self::export_domain).
    pub fn write_archive<W: Write + Seek>(
        &self,
        name: &str,
        sink: W,
    ) -> BackupResult<ExportReport> {
        let name = Domain::normalize_name(name);
        let domain = self
            .store
            .domain(self.actor, &name)?
            .ok_or_else(|| BackupError::DomainNotFound(name.clone()))?;
        info!(domain = %domain.name, "exporting domain");

        let mut statistics = BackupStatistics::default();
        let mut zip = ZipWriter::new(sink);
        zip.start_file(DATA_ENTRY, entry_options())?;
        {
            let mut xml = XmlWriter::new(&mut zip);
            xml.declaration()?;
            xml.start(&Element::new(ROOT_ELEMENT).attr("version", FORMAT_VERSION))?;
            self.write_domain(&mut xml, &domain, &mut statistics)?;
            xml.end(ROOT_ELEMENT)?;
            xml.into_inner()?;
        }
        self.write_files(&mut zip, &domain.name, &mut statistics)?;
        zip.finish()?.flush()?;
        self.store.reset();

        info!(
            domain = %domain.name,
            users = statistics.users,
            contents = statistics.contents,
            revisions = statistics.revisions,
            files = statistics.files,
            "export finished"
        );
        Ok(ExportReport { domain: domain.name, statistics })
    }

    fn write_domain<W: Write>(
        &self,
        xml: &mut XmlWriter<W>,
        domain: &Domain,
        statistics: &mut BackupStatistics,
    ) -> BackupResult<()> {
        let mut element = Element::new(elements::DOMAIN)
            .attr("name", &domain.name)
            .attr("description", &domain.description)
            .attr("created", domain.created)
            .attr("modified", domain.modified);
        if let Some(mail_from) = &domain.mail_from {
            element = element.attr("mailfrom", mail_from);
        }
        xml.start(&element)?;

        for host in self.store.hosts(self.actor, &domain.name)? {
            write_host(xml, &host)?;
            statistics.add_host();
        }
        for group in self.store.groups(self.actor, &domain.name)? {
            write_group(xml, &group)?;
            statistics.add_group();
        }
        self.write_users(xml, &domain.name, statistics)?;

        let entries = self
            .store
            .permissions(self.actor, &domain.name, ContentId::NONE)?
            .map(|list| list.entries)
            .unwrap_or_default();
        write_permissions(xml, &entries)?;
        statistics.add_permission_list();

        let total = self.store.content_count(self.actor, &ContentQuery::roots(&domain.name))?;
        let mut offset = 0;
        while offset < total {
            let query =
                ContentQuery::roots(&domain.name).page(offset, self.options.content_page_size);
            let page = self.store.contents(self.actor, &query)?;
            if page.is_empty() {
                break;
            }
            offset += page.len();
            for id in page {
                self.write_content_tree(xml, &domain.name, id, statistics)?;
            }
        }

        xml.end(elements::DOMAIN)
    }

    fn write_users<W: Write>(
        &self,
        xml: &mut XmlWriter<W>,
        domain: &str,
        statistics: &mut BackupStatistics,
    ) -> BackupResult<()> {
        let total = self.store.user_count(self.actor, domain)?;
        let mut offset = 0;
        while offset < total {
            let page = self.store.users(self.actor, domain, offset, self.options.user_page_size)?;
            if page.is_empty() {
                break;
            }
            offset += page.len();
            for user in &page {
                write_user(xml, user)?;
                statistics.add_user();
            }
        }
        Ok(())
    }

    /// Write a content followed by all of its descendants in depth-first
    /// pre-order. Each `<content>` element is closed before its children,
    /// which follow as siblings rather than nested elements.
    fn write_content_tree<W: Write>(
        &self,
        xml: &mut XmlWriter<W>,
        domain: &str,
        id: ContentId,
        statistics: &mut BackupStatistics,
    ) -> BackupResult<()> {
        let revisions = self.store.revisions(self.actor, id)?;
        let Some(first) = revisions.first() else {
            debug!(%id, "content without revisions, skipping");
            return Ok(());
        };

        let element = Element::new(elements::CONTENT)
            .attr("id", id)
            .attr("category", first.category.code());
        xml.start(&element)?;
        for revision in &revisions {
            write_revision(xml, revision)?;
            statistics.add_revision();
        }
        if let Some(list) = self.store.permissions(self.actor, domain, id)? {
            write_permissions(xml, &list.entries)?;
            statistics.add_permission_list();
        }
        if let Some(lock) = self.store.lock(self.actor, id)? {
            write_lock(xml, &lock)?;
            statistics.add_lock();
        }
        xml.end(elements::CONTENT)?;
        statistics.add_content();

        let total = self.store.content_count(self.actor, &ContentQuery::children(domain, id))?;
        let mut offset = 0;
        while offset < total {
            let query =
                ContentQuery::children(domain, id).page(offset, self.options.content_page_size);
            let page = self.store.contents(self.actor, &query)?;
            if page.is_empty() {
                break;
            }
            offset += page.len();
            for child in page {
                self.write_content_tree(xml, domain, child, statistics)?;
            }
        }
        Ok(())
    }

    /// Copy the domain's file directory into the archive below `<domain>/`.
    fn write_files<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        domain: &str,
        statistics: &mut BackupStatistics,
    ) -> BackupResult<()> {
        let root = self.store.domain_dir(domain);
        if !root.is_dir() {
            debug!(domain, path = %root.display(), "no file directory");
            return Ok(());
        }
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let relative: Vec<_> =
                relative.components().map(|c| c.as_os_str().to_string_lossy()).collect();
            zip.start_file(format!("{domain}/{}", relative.join("/")), entry_options())?;
            let bytes = io::copy(&mut File::open(entry.path())?, zip)?;
            statistics.add_file(bytes);
        }
        Ok(())
    }
}

fn write_host<W: Write>(xml: &mut XmlWriter<W>, host: &Host) -> BackupResult<()> {
    let element = Element::new(elements::HOST)
        .attr("name", &host.name)
        .attr("description", &host.description);
    xml.empty(&element)
}

fn write_group<W: Write>(xml: &mut XmlWriter<W>, group: &Group) -> BackupResult<()> {
    let element = Element::new(elements::GROUP)
        .attr("name", &group.name)
        .attr("description", &group.description)
        .attr_if(group.public, "public", "public")
        .attr("comment", &group.comment);
    xml.empty(&element)
}

fn write_user<W: Write>(xml: &mut XmlWriter<W>, user: &User) -> BackupResult<()> {
    let element = Element::new(elements::USER)
        .attr("name", &user.name)
        .attr("password", &user.password)
        .attr_if(!user.enabled, "disabled", "disabled")
        .attr("realname", &user.real_name)
        .attr("email", &user.email)
        .attr("comment", &user.comment);
    xml.start(&element)?;
    for group in &user.groups {
        xml.empty(&Element::new(elements::MEMBER).attr("group", group))?;
    }
    xml.end(elements::USER)
}

fn write_permissions<W: Write>(xml: &mut XmlWriter<W>, entries: &[Permission]) -> BackupResult<()> {
    let wrapper = Element::new(elements::PERMISSIONS);
    if entries.is_empty() {
        return xml.empty(&wrapper);
    }
    xml.start(&wrapper)?;
    for entry in entries {
        let mut element = Element::new(elements::PERMISSION);
        if let Some(user) = &entry.user {
            element = element.attr("user", user);
        }
        if let Some(group) = &entry.group {
            element = element.attr("group", group);
        }
        xml.empty(&element.attr("flags", entry.flags()))?;
    }
    xml.end(elements::PERMISSIONS)
}

fn write_revision<W: Write>(xml: &mut XmlWriter<W>, revision: &Revision) -> BackupResult<()> {
    let element = Element::new(elements::REVISION)
        .attr("nr", revision.number)
        .attr("name", &revision.name)
        .attr("parent", revision.parent)
        .attr("online", format_date(revision.online))
        .attr("offline", format_date(revision.offline))
        .attr("modified", format_date(revision.modified))
        .attr("author", &revision.author)
        .attr("comment", &revision.comment);
    xml.start(&element)?;
    for (name, value) in &revision.attributes {
        xml.text_element(&Element::new(elements::ATTRIBUTE).attr("name", name), value)?;
    }
    xml.end(elements::REVISION)
}

fn write_lock<W: Write>(xml: &mut XmlWriter<W>, lock: &Lock) -> BackupResult<()> {
    let element = Element::new(elements::LOCK)
        .attr("user", &lock.user)
        .attr("acquired", lock.acquired);
    xml.empty(&element)
}
