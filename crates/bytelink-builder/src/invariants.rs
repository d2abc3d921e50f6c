//! Invariant checks excluded from coverage reports.
//!
//! Each of these signals a bug in the caller's pipeline, not bad input.

#![cfg_attr(coverage_nightly, coverage(off))]

use bytelink_format::IndexType;

use crate::container::{ItemContainer, Layout};
use crate::items::{ItemId, ItemType};

pub(crate) fn wrong_kind(id: ItemId, expected: ItemType, found: ItemType) -> ! {
    panic!("item {id}: expected {expected:?}, found {found:?}")
}

pub(crate) fn foreign_mismatch(name: &str, existing_is_foreign: bool) -> ! {
    let (had, wanted) = if existing_is_foreign {
        ("foreign", "local")
    } else {
        ("local", "foreign")
    };
    panic!("class `{name}` already exists as {had}, requested as {wanted}")
}

pub(crate) fn suppressed_dedup(id: ItemId) -> ! {
    panic!("item {id} was already suppressed by deduplication and cannot be deduplicated again")
}

pub(crate) fn split_code(code: ItemId, first: Option<usize>, other: Option<usize>) -> ! {
    panic!(
        "code {code} is shared by methods in regions {first:?} and {other:?}; \
         id operands can only be patched for one region"
    )
}

pub(crate) fn region_overflow(referrer: ItemId, deps: usize, capacity: usize) -> ! {
    panic!(
        "item {referrer} needs {deps} index entries, more than one region \
         holds (capacity {capacity} per kind)"
    )
}

impl ItemContainer {
    pub(crate) fn ensure_layout(&self, op: &str) -> &Layout {
        self.layout
            .as_ref()
            .unwrap_or_else(|| panic!("{op} requires compute_layout() first"))
    }

    pub(crate) fn ensure_patched(&self) {
        if !self.code_patched && self.has_relocations() {
            panic!("write requires patch_code() after the last layout change");
        }
    }
}

impl Layout {
    pub(crate) fn ensure_index(&self, region: Option<usize>, kind: IndexType, item: ItemId) -> u16 {
        region
            .and_then(|r| self.regions.index_of(r, kind, item))
            .unwrap_or_else(|| {
                panic!(
                    "item {item} has no {} index in region {region:?} \
                     (missing index dependency)",
                    kind.name()
                )
            })
    }
}

pub(crate) fn ensure_offset(id: ItemId, expected: u32, actual: usize) {
    if expected as usize != actual {
        panic!("item {id}: laid out at {expected:#x} but written at {actual:#x}");
    }
}

impl Layout {
    pub(crate) fn ensure_line_program(&self, id: ItemId) -> u32 {
        self.line_program_index_of(id)
            .unwrap_or_else(|| panic!("line program {id} is not in the line program index"))
    }

    pub(crate) fn ensure_literal_array(&self, id: ItemId) -> u32 {
        self.literal_index_of(id)
            .unwrap_or_else(|| panic!("literal array {id} is not in the literal array index"))
    }
}

pub(crate) fn infallible<T>(result: std::io::Result<T>) -> T {
    result.unwrap_or_else(|e| panic!("in-memory serialization failed: {e}"))
}

pub(crate) fn operand_mismatch(mnemonic: &str, position: usize) -> ! {
    panic!("{mnemonic}: operand {position} does not match the opcode's operand kind")
}

pub(crate) fn ensure_file_size(planned: u32, written: usize) {
    if planned as usize != written {
        panic!("wrote {written} bytes, layout planned {planned}");
    }
}
