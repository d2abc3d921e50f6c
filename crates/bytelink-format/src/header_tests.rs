use crate::header::{Header, IndexHeader, Version};
use crate::{HEADER_SIZE, MAGIC};

#[test]
fn header_default() {
    let h = Header::default();
    assert!(h.validate_magic());
    assert_eq!(h.version, Version::CURRENT);
    assert_eq!(h.file_size, 0);
}

#[test]
fn header_roundtrip() {
    let h = Header {
        magic: MAGIC,
        checksum: 0x1234_5678,
        version: Version::CURRENT,
        file_size: 1024,
        foreign_off: 200,
        foreign_size: 24,
        num_classes: 3,
        class_idx_off: 60,
        num_lnps: 2,
        lnp_idx_off: 1016,
        num_literal_arrays: 1,
        literal_array_idx_off: 72,
        num_indexes: 1,
        index_section_off: 76,
    };

    let bytes = h.to_bytes();
    assert_eq!(bytes.len(), HEADER_SIZE);
    assert_eq!(&bytes[0..8], &MAGIC);
    assert_eq!(Header::from_bytes(&bytes), h);
}

#[test]
fn foreign_window() {
    let h = Header {
        foreign_off: 100,
        foreign_size: 20,
        ..Default::default()
    };
    assert!(!h.is_foreign(99));
    assert!(h.is_foreign(100));
    assert!(h.is_foreign(119));
    assert!(!h.is_foreign(120));
}

#[test]
fn empty_foreign_window_contains_nothing() {
    let h = Header {
        foreign_off: 100,
        ..Default::default()
    };
    assert!(!h.is_foreign(100));
}

#[test]
fn version_ordering_is_lexicographic() {
    assert!(Version([0, 1, 0, 0]) < Version([0, 1, 2, 0]));
    assert!(Version([0, 2, 0, 0]) > Version([0, 1, 9, 9]));
    assert!(Version::MIN <= Version::CURRENT);
    assert_eq!(Version([1, 2, 3, 4]).to_string(), "1.2.3.4");
}

#[test]
fn index_header_roundtrip() {
    let h = IndexHeader {
        start: 300,
        end: 900,
        tables: [(4, 100), (2, 116), (0, 124), (1, 124)],
    };
    let bytes = h.to_bytes();
    assert_eq!(IndexHeader::from_bytes(&bytes), h);
    assert!(h.covers(300));
    assert!(h.covers(899));
    assert!(!h.covers(900));
}
