use std::io;

use bytelink_format::Writer;
use bytelink_format::isa::IdKind;
use bytelink_format::leb128::uleb128_size;

use super::{ItemContent, ItemId, ItemType, Items};
use crate::container::WriteCx;
use crate::index::IndexDep;

/// An id operand that must be rewritten once indexes are known.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reloc {
    /// Byte position of the operand inside the code buffer.
    pub pos: usize,
    pub kind: IdKind,
    pub target: ItemId,
}

/// Bytecode of one method body. May be shared by several methods after
/// deduplication.
#[derive(Clone, Debug, Default)]
pub struct CodeItem {
    pub num_vregs: u32,
    pub num_args: u32,
    pub bytes: Vec<u8>,
    pub relocs: Vec<Reloc>,
    /// Methods using this body; the first one owns it for index resolution.
    pub sharers: Vec<ItemId>,
}

impl CodeItem {
    pub fn new(num_vregs: u32, num_args: u32, bytes: Vec<u8>, relocs: Vec<Reloc>) -> Self {
        Self {
            num_vregs,
            num_args,
            bytes,
            relocs,
            sharers: Vec::new(),
        }
    }

    /// Region dependencies implied by the relocations.
    pub fn reloc_deps(&self, deps: &mut Vec<IndexDep>) {
        deps.extend(self.relocs.iter().filter_map(|r| {
            r.kind
                .index_type()
                .map(|kind| IndexDep::new(kind, r.target))
        }));
    }
}

impl ItemContent for CodeItem {
    fn item_type(&self) -> ItemType {
        ItemType::Code
    }

    fn alignment(&self) -> usize {
        4
    }

    fn size(&self, _items: &Items) -> usize {
        uleb128_size(self.num_vregs.into())
            + uleb128_size(self.num_args.into())
            + uleb128_size(self.bytes.len() as u64)
            + self.bytes.len()
    }

    fn write(&self, _cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        w.write_uleb128(self.num_vregs.into())?;
        w.write_uleb128(self.num_args.into())?;
        w.write_uleb128(self.bytes.len() as u64)?;
        w.write_bytes(&self.bytes)
    }
}
