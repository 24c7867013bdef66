//! Driving a [`RestoreHandler`] from an XML byte stream.

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::Reader;
use sitevault_core::ContentStore;

use super::handler::{ElementAttributes, RestoreHandler};
use crate::backup::error::{BackupError, BackupResult};

fn utf8(bytes: &[u8], position: u64) -> BackupResult<&str> {
    std::str::from_utf8(bytes)
        .map_err(|_| BackupError::malformed(position, "invalid UTF-8 in markup"))
}

/// Feed every event of an XML document to `handler`.
///
/// Empty elements are reported as a start followed by an end. Text and
/// CDATA are passed on unescaped; declarations, comments and processing
/// instructions are skipped.
///
/// # Errors
///
/// Returns [`BackupError::Xml`] if the document is not well-formed, or the
/// first error returned by the handler.
pub fn parse<R: BufRead, S: ContentStore + ?Sized>(
    source: R,
    handler: &mut RestoreHandler<'_, S>,
) -> BackupResult<()> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().expand_empty_elements = true;

    let mut buf = Vec::new();
    loop {
        let position = reader.buffer_position();
        handler.set_position(position);
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                let name = utf8(start.name().into_inner(), position)?;
                let mut attrs = ElementAttributes::new();
                for attr in start.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
                    attrs.push(utf8(attr.key.as_ref(), position)?, value.into_owned());
                }
                handler.start_element(name, &attrs)?;
            }
            Event::End(end) => {
                handler.end_element(utf8(end.name().into_inner(), position)?)?;
            }
            Event::Text(text) => {
                handler.characters(&text.unescape().map_err(quick_xml::Error::from)?);
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                handler.characters(utf8(&bytes, position)?);
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::RevisionMode;
    use sitevault_core::{Actor, ContentId};
    use sitevault_storage::{RedbStore, StoreConfig};

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<liquidsite-data version="1">
  <!-- exported by hand -->
  <domain name="OLD" description="The &quot;old&quot; site" created="1000" modified="2000">
    <group name="editors" description="" public="public" comment=""/>
    <user name="alice" password="x" realname="Alice" email="" comment="">
      <member group="editors"/>
    </user>
    <permissions>
      <permission group="editors" flags="rw"/>
    </permissions>
    <content id="9" category="4">
      <revision nr="1" name="index" parent="0" online="0" offline="0" modified="0" author="alice" comment="">
        <attribute name="BODY"><![CDATA[<p>Hello</p>]]> &amp; welcome</attribute>
      </revision>
    </content>
  </domain>
</liquidsite-data>
"#;

    #[test]
    fn test_parse_document() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store =
            RedbStore::in_memory(StoreConfig::new(dir.path())).expect("failed to create store");
        let admin = Actor::system();

        let mut handler = RestoreHandler::new(&store, &admin, "NEW", RevisionMode::Exact);
        parse(DOCUMENT.as_bytes(), &mut handler).expect("failed to parse");
        let outcome = handler.finish().expect("failed to finish");

        let domain = store.domain(&admin, "NEW").expect("lookup").expect("domain");
        assert_eq!(domain.description, "The \"old\" site");
        assert_eq!(domain.created, 1000);

        let user = store.user(&admin, "NEW", "alice").expect("lookup").expect("user");
        assert_eq!(user.groups, vec!["editors".to_string()]);

        let perms = store.permissions(&admin, "NEW", ContentId::NONE).expect("lookup");
        assert_eq!(perms.expect("domain list").entries[0].flags(), "rw");

        let page = outcome.ids.get(ContentId::new(9)).expect("page mapped");
        let revision = &store.revisions(&admin, page).expect("revisions")[0];
        assert_eq!(revision.attributes["BODY"], "<p>Hello</p> & welcome");
        assert_eq!(revision.online, None);
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store =
            RedbStore::in_memory(StoreConfig::new(dir.path())).expect("failed to create store");
        let admin = Actor::system();

        let mut handler = RestoreHandler::new(&store, &admin, "NEW", RevisionMode::Exact);
        let doc = r#"<liquidsite-data version="1"><domain name="OLD"></content></liquidsite-data>"#;
        assert!(parse(doc.as_bytes(), &mut handler).is_err());
    }
}
