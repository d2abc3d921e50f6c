use std::io;

use bytelink_format::Writer;
use bytelink_format::constants::lnp;
use bytelink_format::leb128::{sleb128_size, uleb128_size};

use super::{ItemContent, ItemId, ItemType, Items};
use crate::container::WriteCx;

/// Per-method debug info pointing at a shared line number program.
#[derive(Clone, Debug)]
pub struct DebugInfoItem {
    pub line_start: u32,
    /// String items with parameter names.
    pub param_names: Vec<ItemId>,
    pub program: ItemId,
}

impl ItemContent for DebugInfoItem {
    fn item_type(&self) -> ItemType {
        ItemType::DebugInfo
    }

    fn size(&self, _items: &Items) -> usize {
        uleb128_size(self.line_start.into())
            + uleb128_size(self.param_names.len() as u64)
            + 4 * self.param_names.len()
            + 4
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        w.write_uleb128(self.line_start.into())?;
        w.write_uleb128(self.param_names.len() as u64)?;
        for &name in &self.param_names {
            w.write_u32(cx.offset(name))?;
        }
        w.write_u32(cx.line_program_index(self.program))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LnpOp {
    AdvancePc(u32),
    AdvanceLine(i32),
    /// String item with the file name.
    SetFile(ItemId),
    SetColumn(u32),
}

/// Line number program, shared by every debug info that refers to it.
#[derive(Clone, Debug, Default)]
pub struct LineNumberProgramItem {
    pub ops: Vec<LnpOp>,
    /// Number of debug info items referring to the program.
    pub ref_count: u32,
}

impl ItemContent for LineNumberProgramItem {
    fn item_type(&self) -> ItemType {
        ItemType::LineNumberProgram
    }

    fn size(&self, _items: &Items) -> usize {
        let ops: usize = self
            .ops
            .iter()
            .map(|op| match *op {
                LnpOp::AdvancePc(d) => 1 + uleb128_size(d.into()),
                LnpOp::AdvanceLine(d) => 1 + sleb128_size(d.into()),
                LnpOp::SetFile(_) => 5,
                LnpOp::SetColumn(c) => 1 + uleb128_size(c.into()),
            })
            .sum();
        ops + 1
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        for op in &self.ops {
            match *op {
                LnpOp::AdvancePc(d) => {
                    w.write_u8(lnp::ADVANCE_PC)?;
                    w.write_uleb128(d.into())?;
                }
                LnpOp::AdvanceLine(d) => {
                    w.write_u8(lnp::ADVANCE_LINE)?;
                    w.write_sleb128(d.into())?;
                }
                LnpOp::SetFile(file) => {
                    w.write_u8(lnp::SET_FILE)?;
                    w.write_u32(cx.offset(file))?;
                }
                LnpOp::SetColumn(c) => {
                    w.write_u8(lnp::SET_COLUMN)?;
                    w.write_uleb128(c.into())?;
                }
            }
        }
        w.write_u8(lnp::END)
    }
}

/// Builds a line number program from `(pc, line)` rows.
#[derive(Debug, Default)]
pub struct LineProgramBuilder {
    ops: Vec<LnpOp>,
    pc: u32,
    line: i64,
}

impl LineProgramBuilder {
    /// Start at `line`, the debug info's `line_start`.
    pub fn new(line: u32) -> Self {
        Self {
            ops: Vec::new(),
            pc: 0,
            line: line.into(),
        }
    }

    pub fn set_file(&mut self, file: ItemId) -> &mut Self {
        self.ops.push(LnpOp::SetFile(file));
        self
    }

    pub fn set_column(&mut self, column: u32) -> &mut Self {
        self.ops.push(LnpOp::SetColumn(column));
        self
    }

    /// Record that code from `pc` on belongs to `line`.
    pub fn row(&mut self, pc: u32, line: u32) -> &mut Self {
        if pc > self.pc {
            self.ops.push(LnpOp::AdvancePc(pc - self.pc));
            self.pc = pc;
        }
        let delta = i64::from(line) - self.line;
        if delta != 0 {
            self.ops.push(LnpOp::AdvanceLine(delta as i32));
            self.line = line.into();
        }
        self
    }

    pub fn finish(&mut self) -> Vec<LnpOp> {
        std::mem::take(&mut self.ops)
    }
}
