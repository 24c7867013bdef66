//! Integration tests for the on-disk redb content store.

use sitevault_core::{Actor, Category, ContentQuery, ContentStore, Domain, Revision};
use sitevault_storage::{RedbStore, StoreConfig};

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = dir.path().join("site.redb");
    let config = StoreConfig::new(dir.path().join("files"));
    let admin = Actor::system();

    let id = {
        let store = RedbStore::open(&db_path, config.clone()).expect("failed to open store");
        store
            .restore_domain(&admin, &Domain::new("EXAMPLE").with_description("Example site"))
            .expect("failed to create domain");
        let mut site = Revision::new("EXAMPLE", Category::Site, "www").with_number(1);
        store.restore_revision(&admin, &mut site).expect("failed to write revision")
    };

    let store = RedbStore::open(&db_path, config).expect("failed to reopen store");
    let domain = store.domain(&admin, "EXAMPLE").expect("lookup").expect("domain exists");
    assert_eq!(domain.description, "Example site");

    let roots = store.contents(&admin, &ContentQuery::roots("EXAMPLE")).expect("roots");
    assert_eq!(roots, vec![id]);

    let mut next = Revision::new("EXAMPLE", Category::Folder, "docs");
    let next_id = store.restore_revision(&admin, &mut next).expect("failed to write revision");
    assert!(next_id > id);
}

// ============================================================================
// Paging
// ============================================================================

#[test]
fn test_content_pages_cover_all_roots() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store = RedbStore::in_memory(StoreConfig::new(dir.path())).expect("failed to open store");
    let admin = Actor::system();
    store.restore_domain(&admin, &Domain::new("EXAMPLE")).expect("failed to create domain");

    for i in 0..25 {
        let mut rev = Revision::new("EXAMPLE", Category::Site, format!("site{i}"));
        store.restore_revision(&admin, &mut rev).expect("failed to write revision");
    }

    let query = ContentQuery::roots("EXAMPLE");
    assert_eq!(store.content_count(&admin, &query).expect("count"), 25);

    let mut seen = Vec::new();
    let mut offset = 0;
    loop {
        let page = store.contents(&admin, &query.clone().page(offset, 10)).expect("page");
        if page.is_empty() {
            break;
        }
        offset += page.len();
        seen.extend(page);
    }
    assert_eq!(seen.len(), 25);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}
