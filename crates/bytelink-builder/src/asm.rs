//! Code assembler.
//!
//! Id operands are written as zero and recorded as relocations;
//! [`ItemContainer::patch_code`](crate::ItemContainer::patch_code) fills them
//! in once layout has assigned indexes.

use bytelink_format::isa::{self, Opcode, OperandKind};

use crate::invariants::operand_mismatch;
use crate::items::{CodeItem, ItemId, Reloc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Reg(u8),
    Imm(i64),
    /// String, class, field, method or literal array, per the opcode.
    Item(ItemId),
}

#[derive(Debug, Default)]
pub struct Assembler {
    bytes: Vec<u8>,
    relocs: Vec<Reloc>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of the next instruction.
    pub fn pc(&self) -> usize {
        self.bytes.len()
    }

    /// Append one instruction.
    ///
    /// # Panics
    /// If the operands do not match the opcode's operand kinds.
    pub fn emit(&mut self, opcode: Opcode, operands: &[Operand]) -> &mut Self {
        let kinds = opcode.operands();
        if kinds.len() != operands.len() {
            operand_mismatch(opcode.mnemonic(), operands.len().min(kinds.len()));
        }

        let mut raw = Vec::with_capacity(operands.len());
        let mut pos = self.bytes.len() + 1;
        for (i, (&kind, &operand)) in kinds.iter().zip(operands).enumerate() {
            let value = match (kind, operand) {
                (OperandKind::Id(id_kind), Operand::Item(target)) => {
                    self.relocs.push(Reloc {
                        pos,
                        kind: id_kind,
                        target,
                    });
                    0
                }
                (OperandKind::Id(_), _) | (_, Operand::Item(_)) => {
                    operand_mismatch(opcode.mnemonic(), i)
                }
                (_, Operand::Reg(reg)) => u64::from(reg),
                (_, Operand::Imm(imm)) => imm as u64,
            };
            raw.push(value);
            pos += kind.width();
        }
        isa::encode(opcode, &raw, &mut self.bytes);
        self
    }

    pub fn finish(self, num_vregs: u32, num_args: u32) -> CodeItem {
        CodeItem::new(num_vregs, num_args, self.bytes, self.relocs)
    }
}
