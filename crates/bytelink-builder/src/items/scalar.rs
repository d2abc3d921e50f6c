use std::io;

use bytelink_format::Writer;

use super::{ItemContent, ItemId, ItemType, Items};
use crate::container::WriteCx;

/// Constant value stored out of line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalarItem {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// Offset of another item.
    Id(ItemId),
}

/// Interning key: the value's bit pattern, so `0.0` and `-0.0` stay apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKey {
    I32(u32),
    I64(u64),
    F32(u32),
    F64(u64),
    Id(ItemId),
}

impl ScalarItem {
    pub fn key(&self) -> ScalarKey {
        match *self {
            ScalarItem::I32(v) => ScalarKey::I32(v as u32),
            ScalarItem::I64(v) => ScalarKey::I64(v as u64),
            ScalarItem::F32(v) => ScalarKey::F32(v.to_bits()),
            ScalarItem::F64(v) => ScalarKey::F64(v.to_bits()),
            ScalarItem::Id(id) => ScalarKey::Id(id),
        }
    }

    pub fn is_wide(&self) -> bool {
        matches!(self, ScalarItem::I64(_) | ScalarItem::F64(_))
    }
}

impl ItemContent for ScalarItem {
    fn item_type(&self) -> ItemType {
        ItemType::Scalar
    }

    fn alignment(&self) -> usize {
        if self.is_wide() { 8 } else { 4 }
    }

    fn size(&self, _items: &Items) -> usize {
        if self.is_wide() { 8 } else { 4 }
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        match *self {
            ScalarItem::I32(v) => w.write_u32(v as u32),
            ScalarItem::I64(v) => w.write_u64(v as u64),
            ScalarItem::F32(v) => w.write_u32(v.to_bits()),
            ScalarItem::F64(v) => w.write_u64(v.to_bits()),
            ScalarItem::Id(id) => w.write_u32(cx.offset(id)),
        }
    }
}
