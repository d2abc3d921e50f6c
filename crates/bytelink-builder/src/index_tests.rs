use bytelink_format::{INDEX_ENTRY_SIZE, INDEX_HEADER_SIZE, IndexType};

use crate::index::{IndexDep, IndexSection};
use crate::items::ItemId;

fn id(n: u32) -> ItemId {
    ItemId(n)
}

fn by_id(item: ItemId) -> (u8, u32) {
    (1, item.0)
}

#[test]
fn referrers_share_a_region_until_full() {
    let mut section = IndexSection::new(2);
    assert_eq!(section.add(id(10), &[IndexDep::class(id(1))]), 0);
    // Already present entries cost nothing.
    assert_eq!(
        section.add(id(11), &[IndexDep::class(id(1)), IndexDep::class(id(2))]),
        0
    );
    assert_eq!(section.add(id(12), &[IndexDep::class(id(3))]), 1);
    assert_eq!(section.len(), 2);
    assert_eq!(section.headers()[0].referrers(), [id(10), id(11)]);
    assert_eq!(section.headers()[1].referrers(), [id(12)]);
}

#[test]
fn failed_add_inserts_nothing() {
    let mut section = IndexSection::new(2);
    section.add(id(10), &[IndexDep::class(id(1)), IndexDep::proto(id(5))]);
    section.add(
        id(11),
        &[IndexDep::proto(id(6)), IndexDep::class(id(2)), IndexDep::class(id(3))],
    );
    section.finish(by_id);

    let first = &section.headers()[0];
    assert_eq!(first.table(IndexType::Proto), [id(5)]);
    assert_eq!(first.table(IndexType::Class), [id(1)]);
    assert_eq!(section.headers()[1].table(IndexType::Proto), [id(6)]);
}

#[test]
fn kinds_have_separate_capacity() {
    let mut section = IndexSection::new(1);
    let region = section.add(
        id(10),
        &[
            IndexDep::class(id(1)),
            IndexDep::method_string(id(2)),
            IndexDep::field(id(3)),
            IndexDep::proto(id(4)),
        ],
    );
    assert_eq!(region, 0);
    assert_eq!(section.headers()[0].table_sizes(), [1, 1, 1, 1]);
}

#[test]
fn empty_dependency_sets_always_fit() {
    let mut section = IndexSection::new(1);
    section.add(id(10), &[IndexDep::class(id(1))]);
    assert_eq!(section.add(id(11), &[]), 0);
}

#[test]
#[should_panic(expected = "needs 3 index entries")]
fn oversized_dependency_set_panics() {
    let mut section = IndexSection::new(2);
    section.add(
        id(10),
        &[IndexDep::class(id(1)), IndexDep::class(id(2)), IndexDep::class(id(3))],
    );
}

#[test]
#[should_panic(expected = "more than one region holds")]
fn oversized_set_after_overflow_panics() {
    let mut section = IndexSection::new(2);
    section.add(id(10), &[IndexDep::class(id(1))]);
    section.add(
        id(11),
        &[IndexDep::class(id(2)), IndexDep::class(id(3)), IndexDep::class(id(4))],
    );
}

#[test]
fn finish_sorts_and_indexes_tables() {
    let mut section = IndexSection::new(8);
    section.add(
        id(10),
        &[
            IndexDep::class(id(9)),
            IndexDep::class(id(4)),
            IndexDep::class(id(6)),
            IndexDep::method_string(id(3)),
        ],
    );
    // Pretend #6 is a primitive type: primitives sort first.
    section.finish(|item| if item == id(6) { (0, 1) } else { (1, item.0) });

    let region = &section.headers()[0];
    assert_eq!(region.table(IndexType::Class), [id(6), id(4), id(9)]);
    assert_eq!(section.index_of(0, IndexType::Class, id(9)), Some(2));
    assert_eq!(section.index_of(0, IndexType::MethodStringLiteral, id(3)), Some(0));
    assert_eq!(section.index_of(0, IndexType::Field, id(3)), None);
    assert_eq!(section.index_of(1, IndexType::Class, id(9)), None);
    assert!(region.table(IndexType::LineNumberProgram).is_empty());
}

#[test]
fn byte_size_counts_headers_and_entries() {
    let mut section = IndexSection::new(1);
    section.add(id(10), &[IndexDep::class(id(1)), IndexDep::proto(id(2))]);
    section.add(id(11), &[IndexDep::class(id(3))]);
    assert_eq!(
        section.byte_size(),
        2 * INDEX_HEADER_SIZE + 3 * INDEX_ENTRY_SIZE
    );
}
