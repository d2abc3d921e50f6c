//! Read side of the container format.
//!
//! [`check_header`] validates a buffer; [`File`] owns (or maps) a validated
//! buffer and resolves entity ids through the index tables. Entity payloads
//! are decoded lazily by the accessors in [`data`].

mod cursor;
pub mod data;

#[cfg(test)]
mod file_tests;

use std::fs;
use std::path::Path;

use adler2::Adler32;
use memmap2::Mmap;

use crate::FormatError;
use crate::constants::{CHECKSUMMED_START, HEADER_SIZE, INDEX_ENTRY_SIZE, INDEX_HEADER_SIZE};
use crate::header::{Header, IndexHeader, Version};
use crate::ids::{EntityId, IndexType};
use crate::types::TypeId;

use cursor::Cursor;
pub use data::{
    AnnotationData, AnnotationElement, ArrayValueData, ClassData, CodeData, DebugInfoData,
    FieldData, ForeignFieldData, ForeignMethodData, LineOp, LineProgramData, LiteralArrayData,
    LiteralValue, MethodData, ProtoData, ScalarData,
};

/// Validate magic, version range, declared size and checksum.
pub fn check_header(bytes: &[u8]) -> Result<Header, FormatError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FormatError::FileTooSmall(bytes.len()));
    }

    let header = Header::from_bytes(bytes);
    if !header.validate_magic() {
        return Err(FormatError::InvalidMagic);
    }
    if header.version < Version::MIN {
        return Err(FormatError::VersionTooOld {
            found: header.version,
            min: Version::MIN,
        });
    }
    if header.version > Version::MAX {
        return Err(FormatError::VersionTooNew {
            found: header.version,
            max: Version::MAX,
        });
    }
    if header.file_size as usize != bytes.len() {
        return Err(FormatError::SizeMismatch {
            header: header.file_size,
            actual: bytes.len(),
        });
    }

    let mut adler = Adler32::new();
    adler.write_slice(&bytes[CHECKSUMMED_START..]);
    let computed = adler.checksum();
    if computed != header.checksum {
        return Err(FormatError::ChecksumMismatch {
            stored: header.checksum,
            computed,
        });
    }

    Ok(header)
}

/// Resolved entry of a class-kind index table.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TypeRef {
    Primitive(TypeId),
    Class(EntityId),
}

enum Storage {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Storage {
    fn bytes(&self) -> &[u8] {
        match self {
            Storage::Mapped(map) => &map[..],
            Storage::Owned(vec) => vec.as_slice(),
        }
    }
}

/// A validated container.
pub struct File {
    name: String,
    storage: Storage,
    header: Header,
    regions: Vec<IndexHeader>,
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("name", &self.name)
            .field("header", &self.header)
            .field("regions", &self.regions.len())
            .finish()
    }
}

impl File {
    /// Map a file from disk read-only and validate it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        let len = file.metadata()?.len() as usize;
        if len < HEADER_SIZE {
            return Err(FormatError::FileTooSmall(len));
        }
        // SAFETY: the mapping is read-only and lives as long as `File`.
        // Inputs are not expected to be modified while a link runs.
        let map = unsafe { Mmap::map(&file)? };
        Self::from_storage(path.display().to_string(), Storage::Mapped(map))
    }

    /// Validate an in-memory buffer.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, FormatError> {
        Self::from_storage(name.into(), Storage::Owned(bytes))
    }

    fn from_storage(name: String, storage: Storage) -> Result<Self, FormatError> {
        let bytes = storage.bytes();
        let header = check_header(bytes)?;

        let table_in_bounds = |off: u32, count: u32, entry: usize| {
            (count as usize)
                .checked_mul(entry)
                .and_then(|len| (off as usize).checked_add(len))
                .is_some_and(|end| end <= bytes.len())
        };
        let tables = [
            (header.class_idx_off, header.num_classes, "class index"),
            (
                header.literal_array_idx_off,
                header.num_literal_arrays,
                "literal array index",
            ),
            (header.lnp_idx_off, header.num_lnps, "line program index"),
        ];
        for (off, count, what) in tables {
            if !table_in_bounds(off, count, INDEX_ENTRY_SIZE) {
                return Err(FormatError::malformed(off as usize, what));
            }
        }
        if !table_in_bounds(header.index_section_off, header.num_indexes, INDEX_HEADER_SIZE) {
            return Err(FormatError::malformed(
                header.index_section_off as usize,
                "index section",
            ));
        }

        let mut regions = Vec::with_capacity(header.num_indexes as usize);
        for i in 0..header.num_indexes as usize {
            let at = header.index_section_off as usize + i * INDEX_HEADER_SIZE;
            let region = IndexHeader::from_bytes(&bytes[at..]);
            for (count, off) in region.tables {
                if !table_in_bounds(off, count, INDEX_ENTRY_SIZE) {
                    return Err(FormatError::malformed(at, "region table"));
                }
            }
            regions.push(region);
        }

        Ok(Self {
            name,
            storage,
            header,
            regions,
        })
    }

    /// Path or label the file was opened from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn bytes(&self) -> &[u8] {
        self.storage.bytes()
    }

    pub(crate) fn cursor(&self, id: EntityId, what: &'static str) -> Cursor<'_> {
        Cursor::new(self.bytes(), id.offset(), what)
    }

    /// Read the `index`-th `u32` of a table at `off` (bounds checked at open).
    fn table_entry(&self, off: u32, index: usize) -> u32 {
        let at = off as usize + index * INDEX_ENTRY_SIZE;
        let bytes = self.bytes();
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    /// Class offsets in name order, foreign classes included.
    pub fn class_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0..self.header.num_classes as usize)
            .map(|i| EntityId(self.table_entry(self.header.class_idx_off, i)))
    }

    /// Binary search the class index by mangled name.
    pub fn get_class_id(&self, name: &str) -> Option<EntityId> {
        let mut lo = 0usize;
        let mut hi = self.header.num_classes as usize;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let id = EntityId(self.table_entry(self.header.class_idx_off, mid));
            let probe = self.string_at(id).ok()?;
            match probe.as_bytes().cmp(name.as_bytes()) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Some(id),
            }
        }
        None
    }

    pub fn is_foreign(&self, id: EntityId) -> bool {
        self.header.is_foreign(id.0)
    }

    /// String data at `id`. Class items start with their name, so this also
    /// reads class names.
    pub fn string_at(&self, id: EntityId) -> Result<&str, FormatError> {
        self.cursor(id, "string").string()
    }

    pub fn regions(&self) -> &[IndexHeader] {
        &self.regions
    }

    /// Region whose range covers `id`.
    pub fn region_for(&self, id: EntityId) -> Option<&IndexHeader> {
        let at = self.regions.partition_point(|r| r.end <= id.0);
        self.regions.get(at).filter(|r| r.covers(id.0))
    }

    /// Resolve a 16-bit region index of `kind` as seen from the item at `from`.
    pub fn resolve_index(
        &self,
        from: EntityId,
        kind: IndexType,
        index: u16,
    ) -> Result<EntityId, FormatError> {
        let slot = kind
            .region_slot()
            .ok_or_else(|| FormatError::malformed(from.offset(), "index kind"))?;
        let region = self
            .region_for(from)
            .ok_or_else(|| FormatError::malformed(from.offset(), "region"))?;
        let (count, off) = region.tables[slot];
        if u32::from(index) >= count {
            return Err(FormatError::malformed(from.offset(), kind.name()));
        }
        Ok(EntityId(self.table_entry(off, index as usize)))
    }

    /// Resolve a class-kind index; small values name primitive types.
    pub fn resolve_type(&self, from: EntityId, index: u16) -> Result<TypeRef, FormatError> {
        let raw = self.resolve_index(from, IndexType::Class, index)?;
        if raw.offset() < HEADER_SIZE {
            let ty = u8::try_from(raw.0)
                .ok()
                .and_then(TypeId::from_u8)
                .ok_or_else(|| FormatError::malformed(from.offset(), "primitive type"))?;
            return Ok(TypeRef::Primitive(ty));
        }
        Ok(TypeRef::Class(raw))
    }

    /// Mangled descriptor of a resolved type (`I`, `Lpkg/Cls;`).
    pub fn type_descriptor(&self, ty: TypeRef) -> Result<String, FormatError> {
        match ty {
            TypeRef::Primitive(ty) => Ok(ty.descriptor().to_string()),
            TypeRef::Class(id) => Ok(self.string_at(id)?.to_string()),
        }
    }

    pub fn literal_array_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0..self.header.num_literal_arrays as usize)
            .map(|i| EntityId(self.table_entry(self.header.literal_array_idx_off, i)))
    }

    pub fn literal_array_id(&self, index: u32) -> Option<EntityId> {
        (index < self.header.num_literal_arrays)
            .then(|| EntityId(self.table_entry(self.header.literal_array_idx_off, index as usize)))
    }

    pub fn line_program_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        (0..self.header.num_lnps as usize)
            .map(|i| EntityId(self.table_entry(self.header.lnp_idx_off, i)))
    }

    pub fn line_program_id(&self, index: u32) -> Option<EntityId> {
        (index < self.header.num_lnps)
            .then(|| EntityId(self.table_entry(self.header.lnp_idx_off, index as usize)))
    }
}
