//! Archive format constants and XML helpers.
//!
//! The document looks like this (attributes abbreviated):
//!
//! ```text
//! <liquidsite-data version="1">
//!   <domain name description created modified mailfrom?>
//!     <host name description/>
//!     <group name description public? comment/>
//!     <user name password disabled? realname email comment>
//!       <member group/>
//!     </user>
//!     <permissions>
//!       <permission user? group? flags/>
//!     </permissions>
//!     <content id category>
//!       <revision nr name parent online offline modified author comment>
//!         <attribute name>text</attribute>
//!       </revision>
//!       <permissions>...</permissions>
//!       <lock user acquired/>
//!     </content>
//!   </domain>
//! </liquidsite-data>
//! ```
//!
//! Dates are epoch milliseconds, with `0` standing for "no date".

use std::borrow::Cow;
use std::fmt::Display;
use std::io::Write;
use std::num::ParseIntError;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use sitevault_core::ContentId;

use super::error::{BackupError, BackupResult};

/// Name of the zip entry holding the XML document.
pub const DATA_ENTRY: &str = "liquidsite.data";

/// The document root element.
pub const ROOT_ELEMENT: &str = "liquidsite-data";

/// The format version written into the root element.
pub const FORMAT_VERSION: &str = "1";

/// Element names.
pub mod elements {
    pub const DOMAIN: &str = "domain";
    pub const HOST: &str = "host";
    pub const GROUP: &str = "group";
    pub const USER: &str = "user";
    pub const MEMBER: &str = "member";
    pub const CONTENT: &str = "content";
    pub const REVISION: &str = "revision";
    pub const ATTRIBUTE: &str = "attribute";
    pub const PERMISSIONS: &str = "permissions";
    pub const PERMISSION: &str = "permission";
    pub const LOCK: &str = "lock";
}

/// Escape a string for use inside a double-quoted attribute value.
///
/// Besides the markup characters `< > & "`, tabs and line breaks are written
/// as character references so they survive attribute value normalization.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(|c: char| matches!(c, '<' | '>' | '&' | '"' | '\t' | '\n' | '\r')) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 16);
    for c in value.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Format an optional date, writing `0` for a missing one.
pub fn format_date(date: Option<i64>) -> String {
    date.unwrap_or(0).to_string()
}

/// Parse a date written by [`format_date`].
pub fn parse_date(text: &str) -> Result<Option<i64>, ParseIntError> {
    let millis = text.trim().parse::<i64>()?;
    Ok((millis != 0).then_some(millis))
}

/// Archive path of a content file: `<domain>/<content id>/<file name>`.
pub fn archive_path(domain: &str, id: ContentId, file_name: &str) -> String {
    format!("{domain}/{id}/{file_name}")
}

/// Check that a file name names a single entry inside a content directory.
///
/// # Errors
///
/// Returns [`BackupError::UnsafePath`] for names that are empty, `.` or
/// `..`, or that contain a path separator.
pub fn checked_file_name(name: &str) -> BackupResult<&str> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
    {
        return Err(BackupError::UnsafePath(name.to_string()));
    }
    Ok(name)
}

/// An element with its attributes, ready to be written.
#[derive(Debug, Clone)]
pub struct Element {
    name: &'static str,
    attributes: Vec<(&'static str, String)>,
}

impl Element {
    pub fn new(name: &'static str) -> Self {
        Self { name, attributes: Vec::new() }
    }

    /// Add an attribute.
    #[must_use]
    pub fn attr(mut self, key: &'static str, value: impl Display) -> Self {
        self.attributes.push((key, value.to_string()));
        self
    }

    /// Add an attribute only when `condition` holds.
    #[must_use]
    pub fn attr_if(self, condition: bool, key: &'static str, value: impl Display) -> Self {
        if condition {
            self.attr(key, value)
        } else {
            self
        }
    }

    fn to_start(&self) -> BytesStart<'static> {
        let mut start = BytesStart::new(self.name);
        for (key, value) in &self.attributes {
            let escaped = escape_attribute(value);
            start.push_attribute((key.as_bytes(), escaped.as_bytes()));
        }
        start
    }
}

/// An indenting XML writer for the backup document.
pub struct XmlWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { writer: Writer::new_with_indent(inner, b' ', 2) }
    }

    /// Write the `<?xml ...?>` declaration.
    pub fn declaration(&mut self) -> BackupResult<()> {
        self.writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(())
    }

    /// Open an element.
    pub fn start(&mut self, element: &Element) -> BackupResult<()> {
        self.writer.write_event(Event::Start(element.to_start()))?;
        Ok(())
    }

    /// Write an element without children.
    pub fn empty(&mut self, element: &Element) -> BackupResult<()> {
        self.writer.write_event(Event::Empty(element.to_start()))?;
        Ok(())
    }

    /// Close an element.
    pub fn end(&mut self, name: &str) -> BackupResult<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Write an element holding only text.
    pub fn text_element(&mut self, element: &Element, text: &str) -> BackupResult<()> {
        self.start(element)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(element.name)
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> BackupResult<W> {
        let mut inner = self.writer.into_inner();
        inner.flush()?;
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use quick_xml::Reader;

    #[test]
    fn test_escape_attribute() {
        assert!(matches!(escape_attribute("plain text"), Cow::Borrowed(_)));
        assert_eq!(escape_attribute("a < b & \"c\" > d"), "a &lt; b &amp; &quot;c&quot; &gt; d");
        assert_eq!(escape_attribute("two\nlines"), "two&#10;lines");
        assert_eq!(escape_attribute("it's"), "it's");
    }

    #[test]
    fn test_dates() {
        assert_eq!(format_date(None), "0");
        assert_eq!(format_date(Some(1_100_000_000_000)), "1100000000000");
        assert_eq!(parse_date("0").expect("valid"), None);
        assert_eq!(parse_date("1100000000000").expect("valid"), Some(1_100_000_000_000));
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_checked_file_name() {
        assert_eq!(checked_file_name("logo.png").expect("safe"), "logo.png");
        assert_eq!(checked_file_name("archive..tar").expect("safe"), "archive..tar");
        for unsafe_name in ["", ".", "..", "../etc/passwd", "a/b", "a\\b"] {
            assert!(
                matches!(checked_file_name(unsafe_name), Err(BackupError::UnsafePath(_))),
                "{unsafe_name:?} must be rejected"
            );
        }
    }

    #[test]
    fn test_writer_layout() {
        let mut xml = XmlWriter::new(Vec::new());
        xml.start(&Element::new("domain").attr("name", "EX")).expect("start");
        xml.empty(&Element::new("host").attr("name", "a&b")).expect("empty");
        xml.text_element(&Element::new("attribute").attr("name", "DATA"), "<p>")
            .expect("text");
        xml.end("domain").expect("end");
        let out = String::from_utf8(xml.into_inner().expect("flush")).expect("utf-8");

        assert!(out.contains(r#"<host name="a&amp;b"/>"#), "{out}");
        assert!(out.contains(r#"<attribute name="DATA">&lt;p&gt;</attribute>"#), "{out}");
    }

    fn read_back(value: &str) -> String {
        let mut xml = XmlWriter::new(Vec::new());
        xml.empty(&Element::new("e").attr("v", value)).expect("write");
        let bytes = xml.into_inner().expect("flush");

        let mut reader = Reader::from_reader(bytes.as_slice());
        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf).expect("well-formed") {
                Event::Empty(e) => {
                    let attr = e.try_get_attribute("v").expect("attr").expect("present");
                    return attr.unescape_value().expect("unescape").into_owned();
                }
                Event::Eof => panic!("no element"),
                _ => {}
            }
        }
    }

    proptest! {
        #[test]
        fn prop_attribute_values_survive(value in "[a-zA-Z0-9 <>&\"'\t\n\r.,;:/é漢-]{0,48}") {
            prop_assert_eq!(read_back(&value), value);
        }
    }
}
