use std::io;

use bytelink_format::{LiteralTag, Writer};

use super::{ItemContent, ItemId, ItemType, Items};
use crate::container::WriteCx;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    String(ItemId),
    Method(ItemId),
    Null,
}

impl Literal {
    pub fn tag(&self) -> LiteralTag {
        match self {
            Literal::Bool(_) => LiteralTag::Bool,
            Literal::I32(_) => LiteralTag::I32,
            Literal::I64(_) => LiteralTag::I64,
            Literal::F64(_) => LiteralTag::F64,
            Literal::String(_) => LiteralTag::String,
            Literal::Method(_) => LiteralTag::Method,
            Literal::Null => LiteralTag::Null,
        }
    }
}

/// Constant array referenced from code through the file-wide literal index.
#[derive(Clone, Debug, Default)]
pub struct LiteralArrayItem {
    pub values: Vec<Literal>,
}

impl ItemContent for LiteralArrayItem {
    fn item_type(&self) -> ItemType {
        ItemType::LiteralArray
    }

    fn alignment(&self) -> usize {
        4
    }

    fn size(&self, _items: &Items) -> usize {
        4 + self
            .values
            .iter()
            .map(|v| 1 + v.tag().payload_size())
            .sum::<usize>()
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        w.write_u32(self.values.len() as u32)?;
        for value in &self.values {
            w.write_u8(value.tag() as u8)?;
            match *value {
                Literal::Bool(b) => w.write_u8(b.into())?,
                Literal::I32(v) => w.write_u32(v as u32)?,
                Literal::I64(v) => w.write_u64(v as u64)?,
                Literal::F64(v) => w.write_u64(v.to_bits())?,
                Literal::String(id) | Literal::Method(id) => w.write_u32(cx.offset(id))?,
                Literal::Null => {}
            }
        }
        Ok(())
    }
}
