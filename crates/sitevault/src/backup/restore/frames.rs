//! The typed frame stack of the restore state machine.
//!
//! Each open element of the document is represented by one frame. Which
//! frame may follow which is fixed by the format, so the stack depth is
//! bounded by the schema; only `content` may nest, up to [`MAX_DEPTH`].

use sitevault_core::{Category, ContentId, Permission, Revision, User};

use crate::backup::format::elements;

/// Maximum number of simultaneously open elements.
pub const MAX_DEPTH: usize = 64;

/// The open `<domain>` element.
#[derive(Debug, Default)]
pub struct DomainFrame {
    /// Domain-level permissions not yet written to the store.
    pub permissions: Option<Vec<Permission>>,
}

/// An open `<user>` element, collecting group memberships.
#[derive(Debug)]
pub struct UserFrame {
    pub user: User,
}

/// An edit lock waiting for its content to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLock {
    pub user: String,
    pub acquired: i64,
}

/// An open `<content>` element.
#[derive(Debug)]
pub struct ContentFrame {
    /// Id of the content in the archive.
    pub old_id: ContentId,
    pub category: Category,
    /// Revisions in document order.
    pub revisions: Vec<Revision>,
    /// Explicit permissions, if the content has a list of its own.
    pub permissions: Option<Vec<Permission>>,
    pub lock: Option<PendingLock>,
    /// Id assigned by the store once the revisions were written.
    pub new_id: Option<ContentId>,
}

impl ContentFrame {
    pub fn new(old_id: ContentId, category: Category) -> Self {
        Self {
            old_id,
            category,
            revisions: Vec::new(),
            permissions: None,
            lock: None,
            new_id: None,
        }
    }
}

/// An open `<revision>` element.
#[derive(Debug)]
pub struct RevisionFrame {
    pub revision: Revision,
}

/// An open `<attribute>` element, accumulating its text.
#[derive(Debug)]
pub struct AttributeFrame {
    pub name: String,
    pub text: String,
}

/// One open element.
#[derive(Debug)]
pub enum Frame {
    /// `<liquidsite-data>`.
    Document,
    Domain(DomainFrame),
    User(UserFrame),
    Content(ContentFrame),
    Revision(RevisionFrame),
    Attribute(AttributeFrame),
    /// `<permissions>`, grouping the entries of one explicit list.
    Permissions,
    /// An element without children of its own: host, group, member,
    /// permission or lock.
    Leaf(&'static str),
}

impl Frame {
    /// The element name this frame was opened for.
    pub fn element(&self) -> &'static str {
        match self {
            Self::Document => crate::backup::format::ROOT_ELEMENT,
            Self::Domain(_) => elements::DOMAIN,
            Self::User(_) => elements::USER,
            Self::Content(_) => elements::CONTENT,
            Self::Revision(_) => elements::REVISION,
            Self::Attribute(_) => elements::ATTRIBUTE,
            Self::Permissions => elements::PERMISSIONS,
            Self::Leaf(name) => *name,
        }
    }

    /// Whether an element named `child` may open directly inside this frame.
    pub fn allows(&self, child: &str) -> bool {
        use elements::{
            ATTRIBUTE, CONTENT, DOMAIN, GROUP, HOST, LOCK, MEMBER, PERMISSION, PERMISSIONS,
            REVISION, USER,
        };
        match self {
            Self::Document => child == DOMAIN,
            Self::Domain(_) => {
                matches!(child, HOST | GROUP | USER | CONTENT | PERMISSIONS | PERMISSION)
            }
            Self::User(_) => child == MEMBER,
            Self::Content(_) => {
                matches!(child, REVISION | PERMISSIONS | PERMISSION | LOCK | CONTENT)
            }
            Self::Revision(_) => child == ATTRIBUTE,
            Self::Permissions => child == PERMISSION,
            Self::Attribute(_) | Self::Leaf(_) => false,
        }
    }
}

/// The stack of open elements.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// The open domain frame.
    pub fn domain_mut(&mut self) -> Option<&mut DomainFrame> {
        self.frames.iter_mut().find_map(|frame| match frame {
            Frame::Domain(domain) => Some(domain),
            _ => None,
        })
    }

    /// The innermost open content frame.
    pub fn content_mut(&mut self) -> Option<&mut ContentFrame> {
        self.frames.iter_mut().rev().find_map(|frame| match frame {
            Frame::Content(content) => Some(content),
            _ => None,
        })
    }

    /// The innermost open content or domain frame's pending permission
    /// list, which receives `<permission>` entries.
    pub fn permission_owner_mut(&mut self) -> Option<&mut Option<Vec<Permission>>> {
        self.frames.iter_mut().rev().find_map(|frame| match frame {
            Frame::Content(content) => Some(&mut content.permissions),
            Frame::Domain(domain) => Some(&mut domain.permissions),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let domain = Frame::Domain(DomainFrame::default());
        assert!(domain.allows("host"));
        assert!(domain.allows("content"));
        assert!(!domain.allows("revision"));
        assert!(!domain.allows("domain"));

        let content = Frame::Content(ContentFrame::new(ContentId::new(1), Category::Page));
        assert!(content.allows("revision"));
        assert!(content.allows("lock"));
        assert!(!content.allows("attribute"));

        assert!(Frame::Document.allows("domain"));
        assert!(!Frame::Leaf("host").allows("member"));
        assert!(!Frame::Attribute(AttributeFrame { name: "X".into(), text: String::new() })
            .allows("attribute"));
    }

    #[test]
    fn test_permission_owner_is_innermost() {
        let mut stack = FrameStack::new();
        stack.push(Frame::Document);
        stack.push(Frame::Domain(DomainFrame::default()));
        stack.push(Frame::Permissions);

        *stack.permission_owner_mut().expect("domain owner") = Some(Vec::new());
        assert!(stack.domain_mut().expect("domain").permissions.is_some());

        stack.pop();
        stack.push(Frame::Content(ContentFrame::new(ContentId::new(3), Category::Folder)));
        stack.push(Frame::Permissions);
        stack
            .permission_owner_mut()
            .expect("content owner")
            .get_or_insert_with(Vec::new)
            .push(Permission::anyone().with_flags("r"));

        let content = stack.content_mut().expect("content");
        assert_eq!(content.permissions.as_ref().map(Vec::len), Some(1));
        assert_eq!(stack.depth(), 4);
    }
}
