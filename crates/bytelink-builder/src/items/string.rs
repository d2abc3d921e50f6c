use std::io;

use bytelink_format::Writer;
use bytelink_format::leb128::uleb128_size;

use super::{ItemContent, ItemType, Items};
use crate::container::WriteCx;

/// UTF-8 string data: `uleb len`, bytes, `0`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringItem {
    pub data: String,
}

impl StringItem {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }

    /// Encoded size of `s` as string data.
    pub fn encoded_size(s: &str) -> usize {
        uleb128_size(s.len() as u64) + s.len() + 1
    }

    pub(crate) fn write_data(s: &str, w: &mut dyn Writer) -> io::Result<()> {
        w.write_uleb128(s.len() as u64)?;
        w.write_bytes(s.as_bytes())?;
        w.write_u8(0)
    }
}

impl ItemContent for StringItem {
    fn item_type(&self) -> ItemType {
        ItemType::String
    }

    fn size(&self, _items: &Items) -> usize {
        Self::encoded_size(&self.data)
    }

    fn write(&self, _cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        Self::write_data(&self.data, w)
    }
}
