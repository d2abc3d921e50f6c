//! Serialization of a laid-out container.

use std::io;
use std::path::Path;

use bytelink_format::{
    CHECKSUM_OFFSET, CHECKSUMMED_START, FileWriter, Header, INDEX_ENTRY_SIZE, INDEX_HEADER_SIZE,
    IndexHeader, IndexType, MAGIC, MemoryWriter, Writer,
};
use tracing::debug;

use super::{ItemContainer, Layout};
use crate::dedup::DedupPasses;
use crate::invariants::{ensure_file_size, ensure_offset, infallible};
use crate::items::{ItemId, Items};

/// What an item sees while writing itself.
pub struct WriteCx<'a> {
    container: &'a ItemContainer,
    layout: &'a Layout,
    /// Region of the item being written.
    region: Option<usize>,
}

impl<'a> WriteCx<'a> {
    pub(crate) fn new(container: &'a ItemContainer, layout: &'a Layout, item: ItemId) -> Self {
        Self {
            container,
            layout,
            region: layout.region_of(item),
        }
    }

    pub fn items(&self) -> &'a Items {
        &self.container.items
    }

    pub fn offset(&self, id: ItemId) -> u32 {
        self.container.items.offset(id)
    }

    /// 16-bit index of `id` in the current region's `kind` table.
    pub fn index(&self, kind: IndexType, id: ItemId) -> u16 {
        self.layout.ensure_index(self.region, kind, id)
    }

    pub fn line_program_index(&self, id: ItemId) -> u32 {
        self.layout.ensure_line_program(id)
    }
}

impl ItemContainer {
    /// Write the whole file.
    ///
    /// # Panics
    /// Without a current layout, or with code relocations left unpatched.
    pub fn write(&self, w: &mut dyn Writer) -> io::Result<()> {
        let layout = self.ensure_layout("write");
        self.ensure_patched();
        let regions = layout.regions.headers();

        let header = Header {
            magic: MAGIC,
            checksum: 0,
            version: self.config.version,
            file_size: layout.file_size,
            foreign_off: layout.foreign_off,
            foreign_size: layout.foreign_size,
            num_classes: layout.class_index.len() as u32,
            class_idx_off: layout.class_idx_off,
            num_lnps: layout.lnp_index.len() as u32,
            lnp_idx_off: layout.lnp_idx_off,
            num_literal_arrays: layout.literal_index.len() as u32,
            literal_array_idx_off: layout.literal_idx_off,
            num_indexes: regions.len() as u32,
            index_section_off: layout.index_section_off,
        };
        let bytes = header.to_bytes();
        w.write_bytes(&bytes[..CHECKSUMMED_START])?;
        w.count_checksum(true);
        w.write_bytes(&bytes[CHECKSUMMED_START..])?;

        for &id in layout.class_index.iter().chain(&layout.literal_index) {
            w.write_u32(self.items.offset(id))?;
        }

        let mut table_off = layout.index_section_off as usize + INDEX_HEADER_SIZE * regions.len();
        for region in regions {
            let mut tables = [(0u32, 0u32); 4];
            for (slot, len) in region.table_sizes().into_iter().enumerate() {
                tables[slot] = (len as u32, table_off as u32);
                table_off += INDEX_ENTRY_SIZE * len;
            }
            let index_header = IndexHeader {
                start: region.start,
                end: region.end,
                tables,
            };
            w.write_bytes(&index_header.to_bytes())?;
        }
        for region in regions {
            for kind in IndexType::REGION_KINDS {
                for &id in region.table(kind) {
                    w.write_u32(Layout::index_entry(self, id))?;
                }
            }
        }

        for id in self.emitted_items() {
            w.align(self.items.alignment(id))?;
            ensure_offset(id, self.items.offset(id), w.offset());
            let cx = WriteCx::new(self, layout, id);
            self.items.get(id).content().write(&cx, w)?;
        }

        w.align(INDEX_ENTRY_SIZE)?;
        for &id in &layout.lnp_index {
            w.write_u32(self.items.offset(id))?;
        }
        ensure_file_size(layout.file_size, w.offset());

        w.count_checksum(false);
        w.rewrite_checksum(CHECKSUM_OFFSET)?;
        debug!(size = layout.file_size, "container written");
        Ok(())
    }

    pub fn write_to_vec(&self) -> io::Result<Vec<u8>> {
        let mut w = MemoryWriter::new();
        self.write(&mut w)?;
        Ok(w.into_inner())
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut w = FileWriter::create(path)?;
        self.write(&mut w)?;
        w.finish()
    }

    /// Bytes of a single item at its assigned offset.
    pub(crate) fn serialize_item(&self, id: ItemId) -> Vec<u8> {
        let layout = self.ensure_layout("serialize");
        let mut w = MemoryWriter::with_base(self.items.offset(id) as usize);
        let cx = WriteCx::new(self, layout, id);
        infallible(self.items.get(id).content().write(&cx, &mut w));
        w.into_inner()
    }

    /// Layout, patch, optional dedup, then the final layout. Returns the
    /// file size.
    pub fn finalize(&mut self, passes: DedupPasses) -> u32 {
        let size = self.compute_layout();
        self.patch_code();
        if !passes.any() {
            return size;
        }
        self.deduplicate_items(passes);
        self.compute_layout()
    }
}
