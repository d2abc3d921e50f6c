use std::io;

use bytelink_format::leb128::uleb128_size;
use bytelink_format::{ValueTag, Writer};

use super::{ItemContent, ItemId, ItemType, Items};
use crate::container::WriteCx;

/// Value slot of an annotation element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementValue {
    /// `i32` or `f32` bits stored inline.
    Immediate(u32),
    /// Offset of a scalar, string, class, method or array value item.
    Item(ItemId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnnotationElement {
    /// String item with the element name.
    pub name: ItemId,
    pub tag: ValueTag,
    pub value: ElementValue,
}

#[derive(Clone, Debug)]
pub struct AnnotationItem {
    /// Class or foreign class of the annotation type.
    pub class: ItemId,
    pub elements: Vec<AnnotationElement>,
}

impl ItemContent for AnnotationItem {
    fn item_type(&self) -> ItemType {
        ItemType::Annotation
    }

    fn alignment(&self) -> usize {
        4
    }

    fn size(&self, _items: &Items) -> usize {
        6 + 9 * self.elements.len()
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        w.write_u32(cx.offset(self.class))?;
        w.write_u16(self.elements.len() as u16)?;
        for elem in &self.elements {
            w.write_u32(cx.offset(elem.name))?;
            match elem.value {
                ElementValue::Immediate(bits) => w.write_u32(bits)?,
                ElementValue::Item(item) => w.write_u32(cx.offset(item))?,
            }
        }
        for elem in &self.elements {
            w.write_u8(elem.tag.to_byte())?;
        }
        Ok(())
    }
}

/// One array element: a number stored inline or a referenced item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayElement {
    Immediate(u64),
    Item(ItemId),
}

/// Array-valued annotation element.
#[derive(Clone, Debug)]
pub struct ArrayValueItem {
    /// Element tag, never an array tag.
    pub tag: ValueTag,
    pub elements: Vec<ArrayElement>,
}

impl ItemContent for ArrayValueItem {
    fn item_type(&self) -> ItemType {
        ItemType::ArrayValue
    }

    fn alignment(&self) -> usize {
        4
    }

    fn size(&self, _items: &Items) -> usize {
        uleb128_size(self.elements.len() as u64) + self.elements.len() * self.tag.width()
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        w.write_uleb128(self.elements.len() as u64)?;
        let wide = self.tag.width() == 8;
        for elem in &self.elements {
            let value = match *elem {
                ArrayElement::Immediate(bits) => bits,
                ArrayElement::Item(item) => cx.offset(item).into(),
            };
            if wide {
                w.write_u64(value)?;
            } else {
                w.write_u32(value as u32)?;
            }
        }
        Ok(())
    }
}
