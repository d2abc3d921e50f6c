//! File header (60 bytes) and region headers (40 bytes each).
//!
//! Section order: Header → ClassIndex → LiteralArrayIndex → IndexSection →
//! ForeignItems → Items → LineNumberProgramIndex

use std::fmt;

use super::constants::{HEADER_SIZE, INDEX_HEADER_SIZE, MAGIC};

/// Format version, compared lexicographically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(pub [u8; 4]);

impl Version {
    /// Version written by this implementation.
    pub const CURRENT: Self = Self([0, 1, 2, 0]);
    /// Oldest version the reader accepts.
    pub const MIN: Self = Self([0, 1, 0, 0]);
    /// Newest version the reader accepts.
    pub const MAX: Self = Self::CURRENT;
}

impl Default for Version {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}

#[inline]
fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// File header - first 60 bytes of a container.
///
/// - 0-7: magic
/// - 8-11: adler32 of bytes `[12..file_size)`
/// - 12-15: version
/// - 16-59: sizes, counts and section offsets (11 × u32)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 8],
    pub checksum: u32,
    pub version: Version,
    pub file_size: u32,
    /// Start of the foreign item window.
    pub foreign_off: u32,
    /// Length of the foreign item window in bytes.
    pub foreign_size: u32,
    pub num_classes: u32,
    pub class_idx_off: u32,
    pub num_lnps: u32,
    pub lnp_idx_off: u32,
    pub num_literal_arrays: u32,
    pub literal_array_idx_off: u32,
    /// Number of region headers in the index section.
    pub num_indexes: u32,
    pub index_section_off: u32,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            checksum: 0,
            version: Version::CURRENT,
            file_size: 0,
            foreign_off: 0,
            foreign_size: 0,
            num_classes: 0,
            class_idx_off: 0,
            num_lnps: 0,
            lnp_idx_off: 0,
            num_literal_arrays: 0,
            literal_array_idx_off: 0,
            num_indexes: 0,
            index_section_off: 0,
        }
    }
}

impl Header {
    /// Decode header from the first 60 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= HEADER_SIZE, "header too short");

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[0..8]);

        Self {
            magic,
            checksum: read_u32_le(bytes, 8),
            version: Version([bytes[12], bytes[13], bytes[14], bytes[15]]),
            file_size: read_u32_le(bytes, 16),
            foreign_off: read_u32_le(bytes, 20),
            foreign_size: read_u32_le(bytes, 24),
            num_classes: read_u32_le(bytes, 28),
            class_idx_off: read_u32_le(bytes, 32),
            num_lnps: read_u32_le(bytes, 36),
            lnp_idx_off: read_u32_le(bytes, 40),
            num_literal_arrays: read_u32_le(bytes, 44),
            literal_array_idx_off: read_u32_le(bytes, 48),
            num_indexes: read_u32_le(bytes, 52),
            index_section_off: read_u32_le(bytes, 56),
        }
    }

    /// Encode header to 60 bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.version.0);
        let words = [
            self.file_size,
            self.foreign_off,
            self.foreign_size,
            self.num_classes,
            self.class_idx_off,
            self.num_lnps,
            self.lnp_idx_off,
            self.num_literal_arrays,
            self.literal_array_idx_off,
            self.num_indexes,
            self.index_section_off,
        ];
        for (i, word) in words.iter().enumerate() {
            let at = 16 + i * 4;
            bytes[at..at + 4].copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub fn validate_magic(&self) -> bool {
        self.magic == MAGIC
    }

    /// Whether `offset` falls inside the foreign item window.
    pub fn is_foreign(&self, offset: u32) -> bool {
        offset >= self.foreign_off && offset - self.foreign_off < self.foreign_size
    }
}

/// One region header of the index section.
///
/// Covers the items in `[start, end)`; an item in that range resolves its
/// 16-bit indexes through this header's tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexHeader {
    pub start: u32,
    pub end: u32,
    /// `(entry count, table offset)` per region kind, in
    /// [`IndexType::REGION_KINDS`](crate::IndexType::REGION_KINDS) order.
    pub tables: [(u32, u32); 4],
}

impl IndexHeader {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        assert!(bytes.len() >= INDEX_HEADER_SIZE, "index header too short");

        let mut tables = [(0u32, 0u32); 4];
        for (slot, table) in tables.iter_mut().enumerate() {
            let at = 8 + slot * 8;
            *table = (read_u32_le(bytes, at), read_u32_le(bytes, at + 4));
        }

        Self {
            start: read_u32_le(bytes, 0),
            end: read_u32_le(bytes, 4),
            tables,
        }
    }

    pub fn to_bytes(&self) -> [u8; INDEX_HEADER_SIZE] {
        let mut bytes = [0u8; INDEX_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.start.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.end.to_le_bytes());
        for (slot, (size, off)) in self.tables.iter().enumerate() {
            let at = 8 + slot * 8;
            bytes[at..at + 4].copy_from_slice(&size.to_le_bytes());
            bytes[at + 4..at + 8].copy_from_slice(&off.to_le_bytes());
        }
        bytes
    }

    pub fn covers(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }
}
