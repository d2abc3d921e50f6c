//! Relocation of id operands in code.

use bytelink_format::isa::patch_id;
use tracing::debug;

use super::ItemContainer;
use crate::invariants::split_code;
use crate::items::{Item, ItemId};

impl ItemContainer {
    /// Rewrite every id operand of every emitted code item with the index
    /// the current layout assigns to its target.
    ///
    /// Region indexes resolve through the region shared by all of the code's
    /// methods. Returns the number of operands written.
    ///
    /// # Panics
    /// When the methods sharing one code item sit in different regions.
    pub fn patch_code(&mut self) -> usize {
        let layout = self.ensure_layout("patch_code");

        let mut patches: Vec<(ItemId, Vec<(usize, u32)>)> = Vec::new();
        for &id in &self.order {
            let Item::Code(code) = self.items.get(id) else {
                continue;
            };
            if code.relocs.is_empty() || !self.items.needs_emit(id) {
                continue;
            }
            let region = code.sharers.first().and_then(|&m| layout.region_of(m));
            if let Some(&other) = code
                .sharers
                .iter()
                .find(|&&m| layout.region_of(m) != region)
            {
                split_code(id, region, layout.region_of(other));
            }
            let values = code
                .relocs
                .iter()
                .map(|reloc| {
                    let value = match reloc.kind.index_type() {
                        Some(kind) => u32::from(layout.ensure_index(region, kind, reloc.target)),
                        None => layout.ensure_literal_array(reloc.target),
                    };
                    (reloc.pos, value)
                })
                .collect();
            patches.push((id, values));
        }

        let mut count = 0;
        for (id, values) in patches {
            let code = self.items.code_mut(id);
            for (reloc, (pos, value)) in code.relocs.iter().zip(values) {
                patch_id(&mut code.bytes, pos, reloc.kind, value);
                count += 1;
            }
        }
        self.code_patched = true;
        debug!(operands = count, "code patched");
        count
    }
}
