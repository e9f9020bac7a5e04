use iptag_index::{error_kind, ErrorKind, RangeIndex};
use iptag_primitives::{parse_address, Position, Tag, TaggedRange, MAX_ADDRESS, SENTINEL_HIGH, SENTINEL_LOW};
use iptag_storage::{Database, MarkerRead, MarkerStore, MemoryStore};

mod utils;
use utils::{lookups, memory_index, rocksdb_index, setup_db, tag, FailingStore};


macro_rules! store_tests {
    ($($check:ident),* $(,)?) => {
        mod memory {
            $(
            #[test]
            fn $check() {
                super::$check(&super::memory_index());
            }
            )*
        }

        mod rocksdb {
            $(
            #[test]
            fn $check() {
                let (index, _dir) = super::rocksdb_index();
                super::$check(&index);
            }
            )*
        }
    };
}


store_tests!(
    empty_index_is_untagged,
    tagged_range_resolves,
    tag_then_untag_restores_lookups,
    tagging_a_superset_replaces_the_range,
    overlapping_tag_truncates_older_range,
    untagging_inner_span_splits_range,
    reversed_span_is_rejected_without_mutation,
    single_address_ranges,
    domain_edges,
    get_range_resolves_extent,
    overlapping_ranges_are_ordered,
    untag_of_untagged_space_is_noop,
    update_reasons_keeps_extent,
    clear_removes_everything,
    empty_id_is_rejected
);


fn empty_index_is_untagged<S: MarkerStore>(index: &RangeIndex<S>) {
    assert_eq!(index.lookup(0).unwrap(), None);
    assert_eq!(index.lookup(0x0a000001).unwrap(), None);
    assert_eq!(index.lookup(MAX_ADDRESS).unwrap(), None);
    assert!(index.list().unwrap().is_empty());
    assert_eq!(index.check_integrity().unwrap(), 0);
}


fn tagged_range_resolves<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(10, 20, "a", "spam").unwrap();

    assert_eq!(lookups(index, 5, 9), vec![None::<Tag>; 5]);
    assert_eq!(lookups(index, 10, 20), vec![tag("a", "spam"); 11]);
    assert_eq!(lookups(index, 21, 30), vec![None::<Tag>; 10]);
    assert_eq!(index.check_integrity().unwrap(), 1);
}


fn tag_then_untag_restores_lookups<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(0, 9, "low", "x").unwrap();
    index.tag(40, 50, "high", "y").unwrap();
    let before = lookups(index, 0, 60);

    index.tag(15, 30, "tmp", "z").unwrap();
    assert_eq!(index.untag(15, 30).unwrap(), 1);

    assert_eq!(lookups(index, 0, 60), before);
    assert_eq!(index.list().unwrap(), vec![
        TaggedRange::new(0, 9, "low", "x"),
        TaggedRange::new(40, 50, "high", "y")
    ]);
}


fn tagging_a_superset_replaces_the_range<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(12, 18, "a", "spam").unwrap();
    index.tag(15, 15, "b", "scan").unwrap();
    assert_eq!(index.tag(10, 20, "c", "abuse").unwrap(), 3);

    assert_eq!(lookups(index, 10, 20), vec![tag("c", "abuse"); 11]);
    assert_eq!(index.list().unwrap(), vec![TaggedRange::new(10, 20, "c", "abuse")]);
    assert_eq!(index.check_integrity().unwrap(), 1);
}


fn overlapping_tag_truncates_older_range<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(10, 20, "A", "spam").unwrap();
    index.tag(15, 25, "B", "scan").unwrap();

    assert_eq!(lookups(index, 10, 14), vec![tag("A", "spam"); 5]);
    assert_eq!(lookups(index, 15, 25), vec![tag("B", "scan"); 11]);
    assert_eq!(index.list().unwrap(), vec![
        TaggedRange::new(10, 14, "A", "spam"),
        TaggedRange::new(15, 25, "B", "scan")
    ]);

    // and from the other side
    index.tag(5, 11, "C", "abuse").unwrap();
    assert_eq!(index.list().unwrap(), vec![
        TaggedRange::new(5, 11, "C", "abuse"),
        TaggedRange::new(12, 14, "A", "spam"),
        TaggedRange::new(15, 25, "B", "scan")
    ]);
    assert_eq!(index.check_integrity().unwrap(), 3);
}


fn untagging_inner_span_splits_range<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(10, 20, "A", "spam").unwrap();
    assert_eq!(index.untag(12, 18).unwrap(), 1);

    assert_eq!(lookups(index, 10, 11), vec![tag("A", "spam"); 2]);
    assert_eq!(lookups(index, 12, 18), vec![None::<Tag>; 7]);
    assert_eq!(lookups(index, 19, 20), vec![tag("A", "spam"); 2]);
    assert_eq!(index.list().unwrap(), vec![
        TaggedRange::new(10, 11, "A", "spam"),
        TaggedRange::new(19, 20, "A", "spam")
    ]);

    let snapshot = index.store().snapshot();
    let markers = snapshot.scan(Position::Addr(0), Position::Addr(MAX_ADDRESS))
        .map(|m| m.unwrap())
        .collect::<Vec<_>>();
    assert_eq!(markers.len(), 4);
    assert!(markers.iter().all(|m| m.id == "A"));
}


fn reversed_span_is_rejected_without_mutation<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(10, 20, "a", "spam").unwrap();

    let err = index.tag(30, 25, "b", "scan").unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::InvalidRange);
    let err = index.untag(20, 10).unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::InvalidRange);

    assert_eq!(index.list().unwrap(), vec![TaggedRange::new(10, 20, "a", "spam")]);
    assert_eq!(lookups(index, 25, 30), vec![None::<Tag>; 6]);
}


fn single_address_ranges<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(10, 10, "a", "x").unwrap();
    index.tag(11, 11, "b", "y").unwrap();
    index.tag(13, 20, "c", "z").unwrap();

    assert_eq!(lookups(index, 9, 13), vec![None, tag("a", "x"), tag("b", "y"), None, tag("c", "z")]);

    // splitting a two-address range leaves two single points
    index.tag(30, 31, "d", "w").unwrap();
    index.untag(31, 31).unwrap();
    index.tag(40, 42, "e", "v").unwrap();
    index.untag(41, 41).unwrap();

    assert_eq!(index.list().unwrap(), vec![
        TaggedRange::new(10, 10, "a", "x"),
        TaggedRange::new(11, 11, "b", "y"),
        TaggedRange::new(13, 20, "c", "z"),
        TaggedRange::new(30, 30, "d", "w"),
        TaggedRange::new(40, 40, "e", "v"),
        TaggedRange::new(42, 42, "e", "v")
    ]);
    assert_eq!(index.check_integrity().unwrap(), 6);
}


fn domain_edges<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(0, MAX_ADDRESS, "all", "x").unwrap();
    assert_eq!(index.lookup(0).unwrap(), tag("all", "x"));
    assert_eq!(index.lookup(MAX_ADDRESS).unwrap(), tag("all", "x"));

    index.untag(0, 0).unwrap();
    index.untag(MAX_ADDRESS, MAX_ADDRESS).unwrap();
    assert_eq!(index.lookup(0).unwrap(), None);
    assert_eq!(index.lookup(1).unwrap(), tag("all", "x"));
    assert_eq!(index.lookup(MAX_ADDRESS - 1).unwrap(), tag("all", "x"));
    assert_eq!(index.lookup(MAX_ADDRESS).unwrap(), None);

    index.tag(0, 0, "zero", "y").unwrap();
    index.tag(MAX_ADDRESS, MAX_ADDRESS, "max", "z").unwrap();
    assert_eq!(index.list().unwrap(), vec![
        TaggedRange::new(0, 0, "zero", "y"),
        TaggedRange::new(1, MAX_ADDRESS - 1, "all", "x"),
        TaggedRange::new(MAX_ADDRESS, MAX_ADDRESS, "max", "z")
    ]);

    // sentinels are never touched
    let snapshot = index.store().snapshot();
    assert_eq!(snapshot.get(Position::NegInf).unwrap(), Some(SENTINEL_LOW.clone()));
    assert_eq!(snapshot.get(Position::PosInf).unwrap(), Some(SENTINEL_HIGH.clone()));
}


fn get_range_resolves_extent<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(10, 20, "a", "spam").unwrap();
    index.tag(30, 30, "b", "scan").unwrap();

    let a = Some(TaggedRange::new(10, 20, "a", "spam"));
    assert_eq!(index.get_range(10).unwrap(), a);
    assert_eq!(index.get_range(15).unwrap(), a);
    assert_eq!(index.get_range(20).unwrap(), a);
    assert_eq!(index.get_range(30).unwrap(), Some(TaggedRange::new(30, 30, "b", "scan")));
    assert_eq!(index.get_range(25).unwrap(), None);
    assert_eq!(index.get_range(0).unwrap(), None);
    assert_eq!(index.get_range(MAX_ADDRESS).unwrap(), None);
}


fn overlapping_ranges_are_ordered<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(10, 20, "a", "x").unwrap();
    index.tag(22, 22, "b", "x").unwrap();
    index.tag(25, 40, "c", "x").unwrap();

    let ids = |start, end| index.ranges_overlapping(start, end)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect::<Vec<_>>();

    assert_eq!(ids(0, 9), Vec::<String>::new());
    assert_eq!(ids(0, 10), vec!["a"]);
    assert_eq!(ids(15, 15), vec!["a"]);
    assert_eq!(ids(20, 20), vec!["a"]);
    assert_eq!(ids(20, 25), vec!["a", "b", "c"]);
    assert_eq!(ids(21, 24), vec!["b"]);
    assert_eq!(ids(40, MAX_ADDRESS), vec!["c"]);
    assert_eq!(ids(41, MAX_ADDRESS), Vec::<String>::new());

    // the sequence can be consumed partially and restarted
    let snapshot = index.snapshot();
    let first = snapshot.ranges_overlapping(0, MAX_ADDRESS).next().unwrap().unwrap();
    assert_eq!(first.id, "a");
    assert_eq!(snapshot.ranges_overlapping(0, MAX_ADDRESS).count(), 3);
    assert_eq!(snapshot.ranges_overlapping(20, 10).count(), 0);
}


fn untag_of_untagged_space_is_noop<S: MarkerStore>(index: &RangeIndex<S>) {
    assert_eq!(index.untag(0, MAX_ADDRESS).unwrap(), 0);
    index.tag(10, 20, "a", "x").unwrap();
    assert_eq!(index.untag(21, 30).unwrap(), 0);
    assert_eq!(index.list().unwrap(), vec![TaggedRange::new(10, 20, "a", "x")]);
}


fn update_reasons_keeps_extent<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(10, 20, "a", "spam").unwrap();
    index.tag(30, 30, "b", "scan").unwrap();
    index.tag(40, 50, "c", "spam").unwrap();

    let updated = index.update_reasons(15, 45, |range| range.reason.replace("spam", "junk")).unwrap();
    assert_eq!(updated, 2);

    assert_eq!(index.list().unwrap(), vec![
        TaggedRange::new(10, 20, "a", "junk"),
        TaggedRange::new(30, 30, "b", "scan"),
        TaggedRange::new(40, 50, "c", "junk")
    ]);
    assert_eq!(index.check_integrity().unwrap(), 3);
}


fn clear_removes_everything<S: MarkerStore>(index: &RangeIndex<S>) {
    index.tag(0, 0, "a", "x").unwrap();
    index.tag(10, 20, "b", "x").unwrap();
    index.tag(MAX_ADDRESS, MAX_ADDRESS, "c", "x").unwrap();

    assert_eq!(index.clear().unwrap(), 4);
    assert!(index.list().unwrap().is_empty());
    assert_eq!(index.check_integrity().unwrap(), 0);
}


fn empty_id_is_rejected<S: MarkerStore>(index: &RangeIndex<S>) {
    let err = index.tag(1, 2, "", "x").unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::Other);
    assert!(index.list().unwrap().is_empty());
}


#[test]
fn malformed_address_is_invalid_address() {
    let err = anyhow::Error::from(parse_address("999.1.1.1").unwrap_err());
    assert_eq!(error_kind(&err), ErrorKind::InvalidAddress);
}


#[test]
fn reopened_database_keeps_ranges() {
    let (db, dir) = setup_db();
    {
        let index = RangeIndex::open(db).unwrap();
        index.tag(10, 20, "a", "spam").unwrap();
        index.tag(15, 25, "b", "scan").unwrap();
    }

    let index = RangeIndex::open(Database::open(dir.path()).unwrap()).unwrap();
    assert_eq!(index.list().unwrap(), vec![
        TaggedRange::new(10, 14, "a", "spam"),
        TaggedRange::new(15, 25, "b", "scan")
    ]);
    assert_eq!(index.check_integrity().unwrap(), 2);
}


#[test]
fn open_rejects_foreign_sentinel() {
    let store = MemoryStore::new();
    {
        use iptag_primitives::{Marker, MarkerKind};
        use iptag_storage::MarkerWrite;
        let mut tx = store.transaction();
        tx.put(&Marker {
            position: Position::NegInf,
            kind: MarkerKind::SentinelLow,
            id: "bogus".to_string(),
            reason: String::new()
        }).unwrap();
        tx.commit().unwrap();
    }
    assert!(RangeIndex::open(store).is_err());
}


#[test]
fn snapshot_does_not_see_later_tags() {
    let (index, _dir) = rocksdb_index();
    index.tag(10, 20, "a", "spam").unwrap();

    let snapshot = index.snapshot();
    index.tag(15, 15, "b", "scan").unwrap();

    assert_eq!(snapshot.lookup(15).unwrap(), tag("a", "spam"));
    assert_eq!(index.lookup(15).unwrap(), tag("b", "scan"));
}


#[test]
fn stray_range_end_at_first_address_is_store_unavailable() {
    use iptag_primitives::Marker;
    use iptag_storage::MarkerWrite;

    let index = memory_index();
    {
        let mut tx = index.store().transaction();
        tx.put(&Marker::range_end(0, "a", "x")).unwrap();
        tx.commit().unwrap();
    }

    let err = index.get_range(0).unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::StoreUnavailable);

    let err = index.untag(0, 5).unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::StoreUnavailable);

    let err = index.list().unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::StoreUnavailable);

    assert!(index.check_integrity().is_err());
}


#[test]
fn failed_tag_leaves_index_unchanged() {
    let index = RangeIndex::open(FailingStore::default()).unwrap();
    index.tag(10, 20, "a", "spam").unwrap();
    let before = lookups(&index, 5, 30);

    // truncating the older range takes more than one write
    index.store().fail_after(1);
    let err = index.tag(15, 25, "b", "scan").unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::StoreUnavailable);

    assert_eq!(index.list().unwrap(), vec![TaggedRange::new(10, 20, "a", "spam")]);
    assert_eq!(lookups(&index, 5, 30), before);

    index.store().heal();
    index.tag(15, 25, "b", "scan").unwrap();
    assert_eq!(index.list().unwrap(), vec![
        TaggedRange::new(10, 14, "a", "spam"),
        TaggedRange::new(15, 25, "b", "scan")
    ]);
}


#[test]
fn failed_untag_leaves_index_unchanged() {
    let index = RangeIndex::open(FailingStore::default()).unwrap();
    index.tag(10, 20, "a", "spam").unwrap();
    let before = lookups(&index, 5, 30);

    // splitting the range writes a new end and a new start
    index.store().fail_after(1);
    let err = index.untag(12, 18).unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::StoreUnavailable);

    assert_eq!(index.list().unwrap(), vec![TaggedRange::new(10, 20, "a", "spam")]);
    assert_eq!(lookups(&index, 5, 30), before);
    assert_eq!(index.check_integrity().unwrap(), 1);
}
