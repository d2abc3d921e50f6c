//! Item ordering and offset assignment.
//!
//! File order: header, class index, literal-array index, region section,
//! foreign items, emitted items, line-number-program index.

use std::collections::HashMap;

use bytelink_format::{HEADER_SIZE, INDEX_ENTRY_SIZE, IndexType, align_up};
use tracing::debug;

use super::ItemContainer;
use crate::index::IndexSection;
use crate::items::{Item, ItemId, ItemType};

/// Result of [`ItemContainer::compute_layout`].
#[derive(Clone, Debug)]
pub struct Layout {
    pub(crate) regions: IndexSection,
    /// Region of every referrer and class member.
    pub(crate) region_of: HashMap<ItemId, usize>,
    pub(crate) class_index: Vec<ItemId>,
    pub(crate) literal_index: Vec<ItemId>,
    pub(crate) lnp_index: Vec<ItemId>,
    literal_pos: HashMap<ItemId, u32>,
    lnp_pos: HashMap<ItemId, u32>,
    pub(crate) class_idx_off: u32,
    pub(crate) literal_idx_off: u32,
    pub(crate) index_section_off: u32,
    pub(crate) foreign_off: u32,
    pub(crate) foreign_size: u32,
    pub(crate) lnp_idx_off: u32,
    pub(crate) file_size: u32,
}

impl Layout {
    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    pub fn regions(&self) -> &IndexSection {
        &self.regions
    }

    pub fn region_of(&self, id: ItemId) -> Option<usize> {
        self.region_of.get(&id).copied()
    }

    /// Classes in name order, as written to the class index.
    pub fn class_index(&self) -> &[ItemId] {
        &self.class_index
    }

    pub fn literal_index_of(&self, id: ItemId) -> Option<u32> {
        self.literal_pos.get(&id).copied()
    }

    pub fn line_program_index_of(&self, id: ItemId) -> Option<u32> {
        self.lnp_pos.get(&id).copied()
    }

    pub fn line_programs(&self) -> &[ItemId] {
        &self.lnp_index
    }

    /// Entry value a region table stores for `id`.
    pub(crate) fn index_entry(container: &ItemContainer, id: ItemId) -> u32 {
        match container.items.get(id) {
            Item::PrimitiveType(p) => p.ty as u32,
            _ => container.items.offset(id),
        }
    }
}

fn positions(ids: &[ItemId]) -> HashMap<ItemId, u32> {
    ids.iter().enumerate().map(|(i, &id)| (id, i as u32)).collect()
}

impl ItemContainer {
    /// Move class items first and string items second. Within each group
    /// profile-ranked items stay ahead, otherwise the relative order is kept.
    pub fn relocate_hot_items(&mut self) {
        let rank = |ty: ItemType| match ty {
            ItemType::Class => 0,
            ItemType::String => 1,
            _ => 2,
        };
        let items = &self.items;
        self.order.sort_by_key(|&id| {
            let pgo = items.base(id).pgo_rank.unwrap_or(u8::MAX);
            (rank(items.item_type(id)), pgo)
        });
        self.invalidate();
    }

    /// Assign order indexes, rebuild the region section and assign offsets.
    ///
    /// Returns the total file size.
    pub fn compute_layout(&mut self) -> u32 {
        let mut next = 0u32;
        for &id in self.foreign.iter().chain(&self.order) {
            self.items.base_mut(id).order_index = next;
            next += 1;
        }

        let (regions, region_of) = self.build_regions();

        let mut named: Vec<(&str, ItemId)> = self
            .classes()
            .filter(|&(_, id)| self.is_emitted(id))
            .collect();
        named.sort_by(|a, b| a.0.cmp(b.0));
        let class_index: Vec<ItemId> = named.into_iter().map(|(_, id)| id).collect();

        let emitted_of = |ty: ItemType| -> Vec<ItemId> {
            self.order
                .iter()
                .copied()
                .filter(|&id| self.items.item_type(id) == ty && self.is_emitted(id))
                .collect()
        };
        let literal_index = emitted_of(ItemType::LiteralArray);
        let lnp_index = emitted_of(ItemType::LineNumberProgram);

        let mut off = HEADER_SIZE;
        let class_idx_off = off;
        off += INDEX_ENTRY_SIZE * class_index.len();
        let literal_idx_off = off;
        off += INDEX_ENTRY_SIZE * literal_index.len();
        let index_section_off = off;
        off += regions.byte_size();

        let foreign_off = off;
        for i in 0..self.foreign.len() {
            let id = self.foreign[i];
            if self.is_emitted(id) {
                off = self.place(id, off);
            }
        }
        let foreign_size = off - foreign_off;

        for i in 0..self.order.len() {
            let id = self.order[i];
            if self.is_emitted(id) {
                off = self.place(id, off);
            }
        }

        let lnp_idx_off = align_up(off, INDEX_ENTRY_SIZE);
        let file_size = lnp_idx_off + INDEX_ENTRY_SIZE * lnp_index.len();

        let mut regions = regions;
        for header in regions.headers_mut() {
            if let (Some(&first), Some(&last)) = (header.referrers().first(), header.referrers().last()) {
                header.start = self.items.offset(first);
                header.end = self.items.offset(last) + self.items.size(last) as u32;
            }
        }

        debug!(
            regions = regions.len(),
            classes = class_index.len(),
            literal_arrays = literal_index.len(),
            line_programs = lnp_index.len(),
            size = file_size,
            "layout computed"
        );

        self.layout = Some(Layout {
            regions,
            region_of,
            literal_pos: positions(&literal_index),
            lnp_pos: positions(&lnp_index),
            class_index,
            literal_index,
            lnp_index,
            class_idx_off: class_idx_off as u32,
            literal_idx_off: literal_idx_off as u32,
            index_section_off: index_section_off as u32,
            foreign_off: foreign_off as u32,
            foreign_size: foreign_size as u32,
            lnp_idx_off: lnp_idx_off as u32,
            file_size: file_size as u32,
        });
        file_size as u32
    }

    /// Assign `id` (and the members of a class) an offset at or after `off`;
    /// returns the offset past the item.
    fn place(&mut self, id: ItemId, off: usize) -> usize {
        let start = align_up(off, self.items.alignment(id));
        self.items.base_mut(id).offset = start as u32;

        if let Item::Class(class) = self.items.get(id) {
            let mut at = start + class.header_size();
            let members: Vec<ItemId> = class.members().collect();
            for member in members {
                self.items.base_mut(member).offset = at as u32;
                at += self.items.size(member);
            }
        }
        start + self.items.size(id)
    }

    /// Register every referrer in layout order with its index dependencies.
    fn build_regions(&self) -> (IndexSection, HashMap<ItemId, usize>) {
        let mut regions = IndexSection::new(self.config.index_capacity);
        let mut region_of = HashMap::new();
        let mut deps = Vec::new();

        for &id in self.foreign.iter().chain(&self.order) {
            let referrer = matches!(
                self.items.item_type(id),
                ItemType::Class | ItemType::Proto | ItemType::ForeignMethod | ItemType::ForeignField
            );
            if !referrer || !self.is_emitted(id) {
                continue;
            }

            deps.clear();
            let item = self.items.get(id);
            item.content().index_deps(&self.items, &mut deps);
            let region = regions.add(id, &deps);
            region_of.insert(id, region);
            if let Item::Class(class) = item {
                region_of.extend(class.members().map(|m| (m, region)));
            }
        }

        let items = &self.items;
        regions.finish(|id| match items.get(id) {
            Item::PrimitiveType(p) => (0, p.ty as u32),
            _ => (1, id.0),
        });
        (regions, region_of)
    }

    /// Region index of `target` as seen from `referrer`, if layout is current.
    pub fn region_index(&self, referrer: ItemId, kind: IndexType, target: ItemId) -> Option<u16> {
        let layout = self.layout.as_ref()?;
        let region = layout.region_of(referrer)?;
        layout.regions.index_of(region, kind, target)
    }
}
