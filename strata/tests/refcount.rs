use strata::rendering::cache::RefCountTable;
use strata::rendering::{BackendCall, GpuContext, RecordingBackend};

mod common;

fn table() -> (RefCountTable, strata::rendering::CallLog) {
    common::init_logging();

    let backend = RecordingBackend::new();
    let log = backend.log();
    let ctx = GpuContext::new(backend);

    (RefCountTable::new(&ctx), log)
}

#[test]
fn acquire_uploads_once_and_counts_owners() {
    let (mut table, log) = table();

    let (hash, ids) = table.acquire(&common::quad(0.0), true).unwrap();
    let (again, same_ids) = table.acquire(&common::quad(0.0), true).unwrap();

    assert_eq!(hash, again);
    assert_eq!(ids, same_ids);
    assert_eq!(table.ref_count(hash), 2);
    assert_eq!(table.len(), 1);
    assert_eq!(log.count(|c| matches!(c, BackendCall::CreateVertexArray { .. })), 1);
}

#[test]
fn buffers_are_destroyed_when_the_last_owner_releases() {
    let (mut table, log) = table();

    let (hash, ids) = table.acquire(&common::quad(0.0), true).unwrap();
    assert!(table.increase_ref(hash));
    assert_eq!(table.ref_count(hash), 2);

    assert!(!table.release(hash));
    assert_eq!(log.live().arrays, 1);

    assert!(table.release(hash));
    assert!(table.is_empty());
    assert_eq!(table.get(hash), None);
    assert!(log.calls().contains(&BackendCall::DestroyVertexArray(ids.array)));
    assert_eq!(log.live().buffers, 0);
}

#[test]
fn unknown_hashes_are_ignored() {
    let (mut table, log) = table();
    let hash = common::quad(0.0).content_hash();

    assert!(!table.increase_ref(hash));
    assert!(!table.release(hash));
    assert_eq!(table.ref_count(hash), 0);
    assert!(log.is_empty());
}

#[test]
fn dropping_the_table_destroys_everything_left() {
    let (mut table, log) = table();

    table.acquire(&common::quad(0.0), true).unwrap();
    table.acquire(&common::quad(1.0), true).unwrap();
    table.acquire(&common::triangle(), true).unwrap();
    assert_eq!(log.live().arrays, 3);

    drop(table);

    assert_eq!(log.live().arrays, 0);
    assert_eq!(log.live().buffers, 0);
    assert_eq!(log.misuses(), 0);
}

#[test]
fn invalid_geometry_is_rejected() {
    let (mut table, log) = table();

    assert!(table.acquire(&strata::assets::Geometry::new(vec![]), true).is_err());
    assert!(table.is_empty());
    assert!(log.is_empty());
}
