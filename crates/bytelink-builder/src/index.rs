//! Region index section.
//!
//! Items refer to classes, methods, strings, fields and protos through 16-bit
//! indexes. Each region header owns one fixed-capacity table per kind and
//! covers a contiguous range of referrers; a referrer's indexes resolve
//! through the header covering it.

use std::collections::HashMap;

use bytelink_format::{INDEX_ENTRY_SIZE, INDEX_HEADER_SIZE, IndexType};
use indexmap::IndexSet;

use crate::invariants::region_overflow;
use crate::items::ItemId;

/// One entry a referrer needs in its region's tables.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IndexDep {
    pub kind: IndexType,
    pub item: ItemId,
}

impl IndexDep {
    pub fn new(kind: IndexType, item: ItemId) -> Self {
        debug_assert!(kind.region_slot().is_some(), "{kind:?} has no region table");
        Self { kind, item }
    }

    pub fn class(item: ItemId) -> Self {
        Self::new(IndexType::Class, item)
    }

    pub fn proto(item: ItemId) -> Self {
        Self::new(IndexType::Proto, item)
    }

    pub fn field(item: ItemId) -> Self {
        Self::new(IndexType::Field, item)
    }

    /// Strings and methods share one table.
    pub fn method_string(item: ItemId) -> Self {
        Self::new(IndexType::MethodStringLiteral, item)
    }
}

/// Tables of one region.
#[derive(Clone, Debug, Default)]
pub struct RegionHeader {
    sets: [IndexSet<ItemId>; 4],
    tables: [Vec<ItemId>; 4],
    referrers: Vec<ItemId>,
    positions: [HashMap<ItemId, u16>; 4],
    /// Covered offset range, filled in after offsets are assigned.
    pub start: u32,
    pub end: u32,
}

impl RegionHeader {
    pub fn is_empty(&self) -> bool {
        self.referrers.is_empty()
    }

    pub fn referrers(&self) -> &[ItemId] {
        &self.referrers
    }

    /// Entries of one kind's table, sorted once the section is finished.
    pub fn table(&self, kind: IndexType) -> &[ItemId] {
        match kind.region_slot() {
            Some(slot) => &self.tables[slot],
            None => &[],
        }
    }

    pub fn index_of(&self, kind: IndexType, item: ItemId) -> Option<u16> {
        let slot = kind.region_slot()?;
        self.positions[slot].get(&item).copied()
    }

    /// Insert all of `deps` or nothing.
    fn try_add(&mut self, referrer: ItemId, deps: &[IndexDep], capacity: usize) -> bool {
        let mut fresh = [0usize; 4];
        let mut seen: [IndexSet<ItemId>; 4] = Default::default();
        for dep in deps {
            let Some(slot) = dep.kind.region_slot() else {
                continue;
            };
            if !self.sets[slot].contains(&dep.item) && seen[slot].insert(dep.item) {
                fresh[slot] += 1;
            }
        }
        if (0..4).any(|slot| self.sets[slot].len() + fresh[slot] > capacity) {
            return false;
        }

        for (slot, items) in seen.into_iter().enumerate() {
            self.sets[slot].extend(items);
        }
        self.referrers.push(referrer);
        true
    }

    fn finish(&mut self, sort_key: &impl Fn(ItemId) -> (u8, u32)) {
        for slot in 0..4 {
            let mut table: Vec<ItemId> = self.sets[slot].iter().copied().collect();
            table.sort_by_key(|&id| sort_key(id));
            self.tables[slot] = table;
            self.positions[slot] = self.tables[slot]
                .iter()
                .enumerate()
                .map(|(i, &id)| (id, i as u16))
                .collect();
        }
    }

    /// Entry count per kind in on-disk order.
    pub fn table_sizes(&self) -> [usize; 4] {
        [0, 1, 2, 3].map(|slot| self.sets[slot].len())
    }
}

/// All region headers of a container.
#[derive(Clone, Debug)]
pub struct IndexSection {
    headers: Vec<RegionHeader>,
    capacity: usize,
}

impl IndexSection {
    pub fn new(capacity: usize) -> Self {
        Self {
            headers: Vec::new(),
            capacity,
        }
    }

    /// Register `referrer` with its dependencies and return its region.
    ///
    /// Opens a new header when the current one cannot take the whole set.
    pub fn add(&mut self, referrer: ItemId, deps: &[IndexDep]) -> usize {
        if self.headers.is_empty() {
            self.headers.push(RegionHeader::default());
        }
        let last = self.headers.len() - 1;
        if self.headers[last].try_add(referrer, deps, self.capacity) {
            return last;
        }
        if self.headers[last].is_empty() {
            region_overflow(referrer, deps.len(), self.capacity);
        }

        let mut header = RegionHeader::default();
        if !header.try_add(referrer, deps, self.capacity) {
            region_overflow(referrer, deps.len(), self.capacity);
        }
        self.headers.push(header);
        self.headers.len() - 1
    }

    /// Sort every table with `sort_key` and build the lookup maps.
    pub fn finish(&mut self, sort_key: impl Fn(ItemId) -> (u8, u32)) {
        for header in &mut self.headers {
            header.finish(&sort_key);
        }
    }

    pub fn headers(&self) -> &[RegionHeader] {
        &self.headers
    }

    pub(crate) fn headers_mut(&mut self) -> &mut [RegionHeader] {
        &mut self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Encoded size: every header followed by every table.
    pub fn byte_size(&self) -> usize {
        self.headers
            .iter()
            .map(|h| INDEX_HEADER_SIZE + INDEX_ENTRY_SIZE * h.table_sizes().iter().sum::<usize>())
            .sum()
    }

    pub fn index_of(&self, region: usize, kind: IndexType, item: ItemId) -> Option<u16> {
        self.headers.get(region)?.index_of(kind, item)
    }
}
