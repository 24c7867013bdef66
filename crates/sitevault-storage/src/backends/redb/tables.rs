//! Redb table definitions, key encoding and record codec.
//!
//! Keys scoped to a domain start with `<domain><separator>`, so the key range
//! between [`domain_start_key`] and [`domain_end_key`] holds exactly the
//! objects of that domain. Numeric ids are encoded big-endian to keep
//! range scans in numeric order.

use redb::TableDefinition;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sitevault_core::{Category, ContentId, StoreError, StoreResult};

pub type Table = TableDefinition<'static, &'static [u8], &'static [u8]>;

/// Domains by name.
pub const DOMAINS: Table = TableDefinition::new("domains");

/// Hosts by host name. Host names are global, so this table is not scoped.
pub const HOSTS: Table = TableDefinition::new("hosts");

/// Groups by domain and name.
pub const GROUPS: Table = TableDefinition::new("groups");

/// Users by domain and name.
pub const USERS: Table = TableDefinition::new("users");

/// Content records by id.
pub const CONTENTS: Table = TableDefinition::new("contents");

/// Content tree index: domain, parent id and content id to category code.
pub const CONTENT_TREE: Table = TableDefinition::new("content_tree");

/// Revisions by content id and revision number.
pub const REVISIONS: Table = TableDefinition::new("revisions");

/// Permission lists by domain and content id.
pub const PERMISSIONS: Table = TableDefinition::new("permissions");

/// Locks by content id.
pub const LOCKS: Table = TableDefinition::new("locks");

/// Counters.
pub const META: Table = TableDefinition::new("meta");

/// Every table, for creation on open.
pub const ALL_TABLES: [Table; 10] = [
    DOMAINS,
    HOSTS,
    GROUPS,
    USERS,
    CONTENTS,
    CONTENT_TREE,
    REVISIONS,
    PERMISSIONS,
    LOCKS,
    META,
];

/// Key of the content id counter in [`META`].
pub const NEXT_CONTENT_ID: &[u8] = b"next_content_id";

/// Separator byte between the domain name and the rest of a scoped key.
pub const KEY_SEPARATOR: u8 = 0x00;

/// The per-content record kept next to its revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub domain: String,
    pub category: Category,
    pub parent: ContentId,
}

/// First key of a domain's key range.
pub fn domain_start_key(domain: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(domain.len() + 1);
    key.extend_from_slice(domain.as_bytes());
    key.push(KEY_SEPARATOR);
    key
}

/// First key after a domain's key range.
pub fn domain_end_key(domain: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(domain.len() + 1);
    key.extend_from_slice(domain.as_bytes());
    key.push(KEY_SEPARATOR + 1);
    key
}

/// Key of a named object inside a domain.
pub fn scoped_key(domain: &str, name: &str) -> Vec<u8> {
    let mut key = domain_start_key(domain);
    key.extend_from_slice(name.as_bytes());
    key
}

/// Key of a content-scoped object inside a domain.
pub fn scoped_id_key(domain: &str, id: ContentId) -> Vec<u8> {
    let mut key = domain_start_key(domain);
    key.extend_from_slice(&id.as_u64().to_be_bytes());
    key
}

/// Key of a content id.
pub fn id_key(id: ContentId) -> [u8; 8] {
    id.as_u64().to_be_bytes()
}

/// Key of a content in the tree index.
pub fn tree_key(domain: &str, parent: ContentId, id: ContentId) -> Vec<u8> {
    let mut key = scoped_id_key(domain, parent);
    key.extend_from_slice(&id.as_u64().to_be_bytes());
    key
}

/// Decode the content id at the end of a tree index key.
pub fn tree_key_id(key: &[u8]) -> Option<ContentId> {
    let tail: [u8; 8] = key.get(key.len().checked_sub(8)?..)?.try_into().ok()?;
    Some(ContentId::new(u64::from_be_bytes(tail)))
}

/// Key of one revision of a content.
pub fn revision_key(id: ContentId, number: u32) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..8].copy_from_slice(&id.as_u64().to_be_bytes());
    key[8..].copy_from_slice(&number.to_be_bytes());
    key
}

/// Key range covering every revision of a content.
pub fn revision_range(id: ContentId) -> ([u8; 12], Vec<u8>) {
    let mut end = revision_key(id, u32::MAX).to_vec();
    end.push(0xff);
    (revision_key(id, 0), end)
}

/// Encode a record with bincode.
pub fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| StoreError::Encoding(e.to_string()))
}

/// Decode a record encoded with [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .map(|(value, _)| value)
        .map_err(|e| StoreError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_keys_stay_in_domain_range() {
        let start = domain_start_key("EXAMPLE");
        let end = domain_end_key("EXAMPLE");

        let inside = scoped_key("EXAMPLE", "alice");
        assert!(inside >= start && inside < end);

        let other = scoped_key("EXAMPLE.ORG", "alice");
        assert!(!(other >= start && other < end));
    }

    #[test]
    fn test_tree_key_round_trip() {
        let key = tree_key("EXAMPLE", ContentId::new(3), ContentId::new(258));
        assert_eq!(tree_key_id(&key), Some(ContentId::new(258)));
        assert_eq!(tree_key_id(b"short"), None);
    }

    #[test]
    fn test_revision_keys_sort_numerically() {
        let id = ContentId::new(1);
        assert!(revision_key(id, 2) < revision_key(id, 10));
        assert!(revision_key(id, 10) < revision_key(ContentId::new(2), 0));

        let (start, end) = revision_range(id);
        let last = revision_key(id, u32::MAX);
        assert!(start <= last && last.as_slice() < end.as_slice());
        assert!(revision_key(ContentId::new(2), 0).as_slice() > end.as_slice());
    }

    #[test]
    fn test_record_codec() {
        let record = ContentRecord {
            domain: "EXAMPLE".to_string(),
            category: Category::Folder,
            parent: ContentId::new(9),
        };
        let bytes = encode(&record).expect("failed to encode");
        let back: ContentRecord = decode(&bytes).expect("failed to decode");
        assert_eq!(back, record);

        assert!(decode::<ContentRecord>(&[0xff, 0xff]).is_err());
    }
}
