use crate::leb128::*;

fn uleb(value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    encode_uleb128(value, &mut out);
    out
}

fn sleb(value: i64) -> Vec<u8> {
    let mut out = Vec::new();
    encode_sleb128(value, &mut out);
    out
}

#[test]
fn uleb_known_encodings() {
    assert_eq!(uleb(0), vec![0x00]);
    assert_eq!(uleb(127), vec![0x7f]);
    assert_eq!(uleb(128), vec![0x80, 0x01]);
    assert_eq!(uleb(624_485), vec![0xe5, 0x8e, 0x26]);
}

#[test]
fn sleb_known_encodings() {
    assert_eq!(sleb(0), vec![0x00]);
    assert_eq!(sleb(-1), vec![0x7f]);
    assert_eq!(sleb(63), vec![0x3f]);
    assert_eq!(sleb(64), vec![0xc0, 0x00]);
    assert_eq!(sleb(-123_456), vec![0xc0, 0xbb, 0x78]);
}

#[test]
fn size_matches_encoding() {
    for value in [0u64, 1, 127, 128, 16_383, 16_384, u64::from(u32::MAX), u64::MAX] {
        assert_eq!(uleb128_size(value), uleb(value).len(), "value {value}");
    }
    assert_eq!(sleb128_size(-1), 1);
    assert_eq!(sleb128_size(64), 2);
}

#[test]
fn decode_reports_consumed_bytes() {
    assert_eq!(decode_uleb128(&[0xe5, 0x8e, 0x26, 0xff]), Some((624_485, 3)));
    assert_eq!(decode_sleb128(&[0xc0, 0xbb, 0x78]), Some((-123_456, 3)));
    assert_eq!(decode_sleb128(&[0x7f]), Some((-1, 1)));
}

#[test]
fn decode_truncated_input() {
    assert_eq!(decode_uleb128(&[0x80, 0x80]), None);
    assert_eq!(decode_uleb128(&[]), None);
    assert_eq!(decode_sleb128(&[0xff]), None);
}

#[test]
fn extreme_values_survive() {
    let bytes = uleb(u64::MAX);
    assert_eq!(decode_uleb128(&bytes), Some((u64::MAX, bytes.len())));
    let bytes = sleb(i64::MIN);
    assert_eq!(decode_sleb128(&bytes), Some((i64::MIN, bytes.len())));
}
