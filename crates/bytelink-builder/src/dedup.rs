//! Structural deduplication.
//!
//! Two items are equivalent when their serialized bytes are identical. The
//! first item seen with given bytes becomes canonical; later ones are
//! redirected to it and stop being emitted.

use std::collections::HashMap;

use bytelink_format::ValueTag;
use serde::Serialize;
use tracing::info;

use crate::container::ItemContainer;
use crate::invariants::suppressed_dedup;
use crate::items::{ElementValue, ItemId};

/// Which passes [`ItemContainer::deduplicate_items`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DedupPasses {
    pub debug_info: bool,
    pub code: bool,
    pub annotations: bool,
}

impl DedupPasses {
    pub const ALL: Self = Self {
        debug_info: true,
        code: true,
        annotations: true,
    };

    pub const NONE: Self = Self {
        debug_info: false,
        code: false,
        annotations: false,
    };

    pub fn any(&self) -> bool {
        self.debug_info || self.code || self.annotations
    }
}

impl Default for DedupPasses {
    fn default() -> Self {
        Self::ALL
    }
}

/// Items suppressed per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    pub debug_info: usize,
    pub line_programs: usize,
    pub code: usize,
    pub annotations: usize,
    pub array_values: usize,
}

/// Byte-equality set with a redirect memo.
///
/// `scope` keeps otherwise equal bytes apart when their meaning depends on
/// context, such as code whose operands index a particular region.
#[derive(Debug, Default)]
pub struct ItemDeduper {
    canonical: HashMap<(Option<usize>, Vec<u8>), ItemId>,
    memo: HashMap<ItemId, ItemId>,
}

impl ItemDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical item of an already processed item.
    pub fn lookup(&self, id: ItemId) -> Option<ItemId> {
        self.memo.get(&id).copied()
    }

    /// Return the canonical item for `id`, registering `id` as canonical if
    /// its bytes are new.
    ///
    /// # Panics
    /// If `id` was suppressed without passing through this deduper.
    pub fn deduplicate(
        &mut self,
        container: &ItemContainer,
        id: ItemId,
        scope: Option<usize>,
    ) -> ItemId {
        if let Some(canonical) = self.lookup(id) {
            return canonical;
        }
        if !container.items().needs_emit(id) {
            suppressed_dedup(id);
        }
        let bytes = container.serialize_item(id);
        let canonical = *self.canonical.entry((scope, bytes)).or_insert(id);
        self.memo.insert(id, canonical);
        canonical
    }
}

impl ItemContainer {
    /// Run the selected passes. Requires a current layout and leaves the
    /// container without one.
    pub fn deduplicate_items(&mut self, passes: DedupPasses) -> DedupStats {
        self.ensure_layout("deduplicate_items");
        let mut stats = DedupStats::default();

        if passes.debug_info {
            self.dedup_debug_info(&mut stats);
        }
        if passes.code {
            self.dedup_code(&mut stats);
        }
        if passes.annotations {
            self.dedup_annotations(&mut stats);
        }

        info!(
            debug_info = stats.debug_info,
            line_programs = stats.line_programs,
            code = stats.code,
            annotations = stats.annotations,
            array_values = stats.array_values,
            "deduplicated items"
        );
        self.layout = None;
        stats
    }

    /// Mark `id` as not emitted; returns whether it was emitted before.
    fn suppress(&mut self, id: ItemId) -> bool {
        std::mem::replace(&mut self.items.base_mut(id).needs_emit, false)
    }

    /// Drop one reference to a line program.
    fn release_line_program(&mut self, program: ItemId, stats: &mut DedupStats) {
        let lnp = self.items.line_program_mut(program);
        lnp.ref_count = lnp.ref_count.saturating_sub(1);
        if lnp.ref_count == 0 && self.suppress(program) {
            stats.line_programs += 1;
        }
    }

    fn dedup_debug_info(&mut self, stats: &mut DedupStats) {
        let mut programs = ItemDeduper::new();
        let mut debug_infos = ItemDeduper::new();

        for method in self.methods() {
            let Some(debug) = self.items.method(method).debug_info else {
                continue;
            };
            if let Some(canonical) = debug_infos.lookup(debug) {
                self.items.method_mut(method).debug_info = Some(canonical);
                continue;
            }

            let program = self.items.debug_info(debug).program;
            let canonical_program = programs.deduplicate(self, program, None);
            if canonical_program != program {
                self.items.debug_info_mut(debug).program = canonical_program;
                self.items.line_program_mut(canonical_program).ref_count += 1;
                self.release_line_program(program, stats);
            }

            let canonical = debug_infos.deduplicate(self, debug, None);
            if canonical != debug {
                self.items.method_mut(method).debug_info = Some(canonical);
                if self.suppress(debug) {
                    stats.debug_info += 1;
                }
                self.release_line_program(canonical_program, stats);
            }
        }
    }

    fn dedup_code(&mut self, stats: &mut DedupStats) {
        let mut codes = ItemDeduper::new();
        let layout_regions: Vec<(ItemId, Option<usize>)> = {
            let layout = self.ensure_layout("dedup_code");
            self.methods()
                .into_iter()
                .map(|m| (m, layout.region_of(m)))
                .collect()
        };

        for (method, region) in layout_regions {
            let Some(code) = self.items.method(method).code else {
                continue;
            };
            let canonical = codes.deduplicate(self, code, region);
            if canonical == code {
                continue;
            }
            self.items.method_mut(method).code = Some(canonical);
            self.items.code_mut(code).sharers.retain(|&m| m != method);
            let sharers = &mut self.items.code_mut(canonical).sharers;
            if !sharers.contains(&method) {
                sharers.push(method);
            }
            if self.suppress(code) {
                stats.code += 1;
            }
        }
    }

    fn dedup_annotations(&mut self, stats: &mut DedupStats) {
        let mut annotations = ItemDeduper::new();
        let mut arrays = ItemDeduper::new();

        let mut owners = Vec::new();
        for (_, class) in self.classes() {
            if self.is_foreign(class) {
                continue;
            }
            let item = self.items.class(class);
            owners.push(class);
            owners.extend(item.members());
        }

        for owner in owners {
            let list = self.annotations_mut(owner).clone();
            for (i, ann) in list.into_iter().enumerate() {
                let canonical = match annotations.lookup(ann) {
                    Some(canonical) => canonical,
                    None => {
                        self.dedup_array_elements(ann, &mut arrays, stats);
                        annotations.deduplicate(self, ann, None)
                    }
                };
                if canonical != ann {
                    self.annotations_mut(owner)[i] = canonical;
                    if self.suppress(ann) {
                        stats.annotations += 1;
                    }
                }
            }
        }
    }

    /// Deduplicate the array values of one annotation before the annotation
    /// itself, so equal arrays make equal annotation bytes.
    fn dedup_array_elements(
        &mut self,
        annotation: ItemId,
        arrays: &mut ItemDeduper,
        stats: &mut DedupStats,
    ) {
        let elements = self.items.annotation(annotation).elements.clone();
        for (i, elem) in elements.iter().enumerate() {
            let (true, ElementValue::Item(array)) = (ValueTag::is_array(elem.tag), elem.value)
            else {
                continue;
            };
            let canonical = arrays.deduplicate(self, array, None);
            if canonical != array {
                self.items.annotation_mut(annotation).elements[i].value =
                    ElementValue::Item(canonical);
                if self.suppress(array) {
                    stats.array_values += 1;
                }
            }
        }
    }
}
