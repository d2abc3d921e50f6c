use std::io::Write as _;

use crate::constants::{CHECKSUM_OFFSET, CHECKSUMMED_START, HEADER_SIZE};
use crate::{File, FormatError, Header, MemoryWriter, Version, Writer, check_header};

/// Header-only container, or the header followed by `body`.
fn build(version: Version, body: &[u8]) -> Vec<u8> {
    let header = Header {
        version,
        file_size: (HEADER_SIZE + body.len()) as u32,
        class_idx_off: HEADER_SIZE as u32,
        literal_array_idx_off: HEADER_SIZE as u32,
        index_section_off: HEADER_SIZE as u32,
        foreign_off: HEADER_SIZE as u32,
        lnp_idx_off: (HEADER_SIZE + body.len()) as u32,
        ..Header::default()
    };
    let bytes = header.to_bytes();

    let mut w = MemoryWriter::new();
    w.write_bytes(&bytes[..CHECKSUMMED_START]).unwrap();
    w.count_checksum(true);
    w.write_bytes(&bytes[CHECKSUMMED_START..]).unwrap();
    w.write_bytes(body).unwrap();
    w.count_checksum(false);
    w.rewrite_checksum(CHECKSUM_OFFSET).unwrap();
    w.into_inner()
}

#[test]
fn minimal_file_validates() {
    let bytes = build(Version::CURRENT, &[]);
    let header = check_header(&bytes).unwrap();
    assert_eq!(header.file_size, HEADER_SIZE as u32);

    let file = File::from_bytes("min", bytes).unwrap();
    assert_eq!(file.class_ids().count(), 0);
    assert_eq!(file.get_class_id("LA;"), None);
    assert!(file.regions().is_empty());
}

#[test]
fn too_small() {
    let err = check_header(&[0u8; 10]).unwrap_err();
    assert!(matches!(err, FormatError::FileTooSmall(10)));
}

#[test]
fn bad_magic() {
    let mut bytes = build(Version::CURRENT, &[]);
    bytes[0] = b'X';
    assert!(matches!(
        check_header(&bytes),
        Err(FormatError::InvalidMagic)
    ));
}

#[test]
fn version_range_has_distinct_errors() {
    let old = build(Version([0, 0, 9, 9]), &[]);
    assert!(matches!(
        check_header(&old),
        Err(FormatError::VersionTooOld { .. })
    ));

    let new = build(Version([9, 0, 0, 0]), &[]);
    let err = check_header(&new).unwrap_err();
    assert!(matches!(err, FormatError::VersionTooNew { .. }));
    insta::assert_snapshot!(err.to_string(), @"version 9.0.0.0 is too new (maximum supported is 0.1.2.0)");

    assert!(check_header(&build(Version::MIN, &[])).is_ok());
}

#[test]
fn size_mismatch() {
    let mut bytes = build(Version::CURRENT, &[1, 2, 3]);
    bytes.push(0);
    assert!(matches!(
        check_header(&bytes),
        Err(FormatError::SizeMismatch {
            header: 63,
            actual: 64
        })
    ));
}

#[test]
fn checksum_covers_every_byte_after_the_slot() {
    let bytes = build(Version::CURRENT, &[0xaa; 16]);
    assert!(check_header(&bytes).is_ok());

    // Flipping header bytes may trip an earlier check; any failure counts.
    for at in CHECKSUMMED_START..bytes.len() {
        let mut flipped = bytes.clone();
        flipped[at] ^= 0x01;
        assert!(check_header(&flipped).is_err(), "flip at {at} not detected");
    }

    let mut body_flip = bytes.clone();
    body_flip[HEADER_SIZE + 3] ^= 0x80;
    assert!(matches!(
        check_header(&body_flip),
        Err(FormatError::ChecksumMismatch { .. })
    ));
}

#[test]
fn open_from_disk() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&build(Version::CURRENT, &[0; 4])).unwrap();
    tmp.flush().unwrap();

    let file = File::open(tmp.path()).unwrap();
    assert_eq!(file.header().file_size, 64);
    assert_eq!(file.bytes().len(), 64);
}

#[test]
fn open_empty_file() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    let err = File::open(tmp.path()).unwrap_err();
    assert!(matches!(err, FormatError::FileTooSmall(0)));
}

#[test]
fn open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = File::open(dir.path().join("missing.blk")).unwrap_err();
    assert!(matches!(err, FormatError::Io(_)));
}

#[test]
fn out_of_bounds_class_index() {
    let mut header = Header::from_bytes(&build(Version::CURRENT, &[]));
    header.num_classes = 4;
    let bytes = header.to_bytes().to_vec();

    // Re-checksum so only the table bounds are wrong.
    let mut w = MemoryWriter::new();
    w.write_bytes(&bytes[..CHECKSUMMED_START]).unwrap();
    w.count_checksum(true);
    w.write_bytes(&bytes[CHECKSUMMED_START..]).unwrap();
    w.count_checksum(false);
    w.rewrite_checksum(CHECKSUM_OFFSET).unwrap();

    let err = File::from_bytes("bad", w.into_inner()).unwrap_err();
    assert!(matches!(
        err,
        FormatError::Malformed {
            what: "class index",
            ..
        }
    ));
}
