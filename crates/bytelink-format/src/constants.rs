//! Format constants.

/// Magic bytes identifying a bytelink container.
pub const MAGIC: [u8; 8] = *b"BLINK\0\0\0";

/// Byte offset of the checksum field.
pub const CHECKSUM_OFFSET: usize = 8;

/// First byte covered by the checksum (everything after the checksum field).
pub const CHECKSUMMED_START: usize = CHECKSUM_OFFSET + 4;

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 60;

/// Size of one region header in the index section.
pub const INDEX_HEADER_SIZE: usize = 40;

/// Size of one entry in any index table.
pub const INDEX_ENTRY_SIZE: usize = 4;

/// Capacity of each per-kind table in a region header.
///
/// Region indexes are encoded as `u16` operands.
pub const MAX_INDEX_16: usize = 0xffff;

/// Tagged-value markers inside class, method and field items.
pub mod tags {
    pub const END: u8 = 0x00;

    pub const CLASS_INTERFACES: u8 = 0x01;
    pub const CLASS_SOURCE_LANG: u8 = 0x02;
    pub const CLASS_ANNOTATION: u8 = 0x03;
    pub const CLASS_SOURCE_FILE: u8 = 0x04;

    pub const FIELD_VALUE: u8 = 0x01;
    pub const FIELD_ANNOTATION: u8 = 0x02;

    pub const METHOD_CODE: u8 = 0x01;
    pub const METHOD_SOURCE_LANG: u8 = 0x02;
    pub const METHOD_ANNOTATION: u8 = 0x03;
    pub const METHOD_DEBUG_INFO: u8 = 0x04;
}

/// Line number program opcodes.
pub mod lnp {
    pub const END: u8 = 0x00;
    pub const ADVANCE_PC: u8 = 0x01;
    pub const ADVANCE_LINE: u8 = 0x02;
    pub const SET_FILE: u8 = 0x03;
    pub const SET_COLUMN: u8 = 0x04;
}
