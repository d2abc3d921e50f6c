//! Classes and their members.
//!
//! A class item is followed in the file by its fields and then its methods;
//! members are laid out and written as part of the class.

use std::io;

use bytelink_format::constants::tags;
use bytelink_format::leb128::uleb128_size;
use bytelink_format::{IndexType, Writer};

use super::string::StringItem;
use super::{ItemContent, ItemId, ItemType, Items};
use crate::container::WriteCx;
use crate::index::IndexDep;

#[derive(Clone, Debug, Default)]
pub struct ClassItem {
    /// Mangled name, e.g. `Lpkg/Cls;`.
    pub name: String,
    pub super_class: Option<ItemId>,
    pub flags: u32,
    pub interfaces: Vec<ItemId>,
    pub source_lang: Option<u8>,
    pub annotations: Vec<ItemId>,
    /// String item naming the source file.
    pub source_file: Option<ItemId>,
    pub fields: Vec<ItemId>,
    pub methods: Vec<ItemId>,
}

impl ClassItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Size of the class's own bytes, members excluded.
    pub(crate) fn header_size(&self) -> usize {
        let mut size = StringItem::encoded_size(&self.name)
            + 4
            + uleb128_size(self.flags.into())
            + uleb128_size(self.fields.len() as u64)
            + uleb128_size(self.methods.len() as u64);
        if !self.interfaces.is_empty() {
            size += 1 + uleb128_size(self.interfaces.len() as u64) + 2 * self.interfaces.len();
        }
        if self.source_lang.is_some() {
            size += 2;
        }
        size += 5 * self.annotations.len();
        if self.source_file.is_some() {
            size += 5;
        }
        size + 1
    }

    /// Members in file order: fields, then methods.
    pub fn members(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.fields.iter().chain(&self.methods).copied()
    }
}

impl ItemContent for ClassItem {
    fn item_type(&self) -> ItemType {
        ItemType::Class
    }

    fn size(&self, items: &Items) -> usize {
        self.header_size() + self.members().map(|m| items.size(m)).sum::<usize>()
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        StringItem::write_data(&self.name, w)?;
        w.write_u32(self.super_class.map_or(0, |s| cx.offset(s)))?;
        w.write_uleb128(self.flags.into())?;
        w.write_uleb128(self.fields.len() as u64)?;
        w.write_uleb128(self.methods.len() as u64)?;

        if !self.interfaces.is_empty() {
            w.write_u8(tags::CLASS_INTERFACES)?;
            w.write_uleb128(self.interfaces.len() as u64)?;
            for &iface in &self.interfaces {
                w.write_u16(cx.index(IndexType::Class, iface))?;
            }
        }
        if let Some(lang) = self.source_lang {
            w.write_u8(tags::CLASS_SOURCE_LANG)?;
            w.write_u8(lang)?;
        }
        for &ann in &self.annotations {
            w.write_u8(tags::CLASS_ANNOTATION)?;
            w.write_u32(cx.offset(ann))?;
        }
        if let Some(file) = self.source_file {
            w.write_u8(tags::CLASS_SOURCE_FILE)?;
            w.write_u32(cx.offset(file))?;
        }
        w.write_u8(tags::END)?;

        for member in self.members() {
            cx.items().get(member).content().write(cx, w)?;
        }
        Ok(())
    }

    fn index_deps(&self, items: &Items, deps: &mut Vec<IndexDep>) {
        deps.extend(self.interfaces.iter().map(|&i| IndexDep::class(i)));
        for member in self.members() {
            items.get(member).content().index_deps(items, deps);
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldItem {
    pub class: ItemId,
    pub name: ItemId,
    /// Primitive type item or class item.
    pub ty: ItemId,
    pub flags: u32,
    /// Scalar item with the initial value.
    pub value: Option<ItemId>,
    pub annotations: Vec<ItemId>,
}

impl ItemContent for FieldItem {
    fn item_type(&self) -> ItemType {
        ItemType::Field
    }

    fn size(&self, _items: &Items) -> usize {
        8 + uleb128_size(self.flags.into())
            + if self.value.is_some() { 5 } else { 0 }
            + 5 * self.annotations.len()
            + 1
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        w.write_u16(cx.index(IndexType::Class, self.class))?;
        w.write_u16(cx.index(IndexType::Class, self.ty))?;
        w.write_u32(cx.offset(self.name))?;
        w.write_uleb128(self.flags.into())?;
        if let Some(value) = self.value {
            w.write_u8(tags::FIELD_VALUE)?;
            w.write_u32(cx.offset(value))?;
        }
        for &ann in &self.annotations {
            w.write_u8(tags::FIELD_ANNOTATION)?;
            w.write_u32(cx.offset(ann))?;
        }
        w.write_u8(tags::END)
    }

    fn index_deps(&self, _items: &Items, deps: &mut Vec<IndexDep>) {
        deps.push(IndexDep::class(self.class));
        deps.push(IndexDep::class(self.ty));
    }
}

#[derive(Clone, Debug)]
pub struct MethodItem {
    pub class: ItemId,
    pub name: ItemId,
    pub proto: ItemId,
    pub flags: u32,
    pub code: Option<ItemId>,
    pub source_lang: Option<u8>,
    pub annotations: Vec<ItemId>,
    pub debug_info: Option<ItemId>,
    /// Dependencies added on top of those implied by the code's relocations.
    pub extra_deps: Vec<IndexDep>,
}

impl ItemContent for MethodItem {
    fn item_type(&self) -> ItemType {
        ItemType::Method
    }

    fn size(&self, _items: &Items) -> usize {
        8 + uleb128_size(self.flags.into())
            + if self.code.is_some() { 5 } else { 0 }
            + if self.source_lang.is_some() { 2 } else { 0 }
            + 5 * self.annotations.len()
            + if self.debug_info.is_some() { 5 } else { 0 }
            + 1
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        w.write_u16(cx.index(IndexType::Class, self.class))?;
        w.write_u16(cx.index(IndexType::Proto, self.proto))?;
        w.write_u32(cx.offset(self.name))?;
        w.write_uleb128(self.flags.into())?;
        if let Some(code) = self.code {
            w.write_u8(tags::METHOD_CODE)?;
            w.write_u32(cx.offset(code))?;
        }
        if let Some(lang) = self.source_lang {
            w.write_u8(tags::METHOD_SOURCE_LANG)?;
            w.write_u8(lang)?;
        }
        for &ann in &self.annotations {
            w.write_u8(tags::METHOD_ANNOTATION)?;
            w.write_u32(cx.offset(ann))?;
        }
        if let Some(debug) = self.debug_info {
            w.write_u8(tags::METHOD_DEBUG_INFO)?;
            w.write_u32(cx.offset(debug))?;
        }
        w.write_u8(tags::END)
    }

    fn index_deps(&self, items: &Items, deps: &mut Vec<IndexDep>) {
        deps.push(IndexDep::class(self.class));
        deps.push(IndexDep::proto(self.proto));
        if let Some(code) = self.code {
            items.code(code).reloc_deps(deps);
        }
        deps.extend_from_slice(&self.extra_deps);
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignClassItem {
    pub name: String,
}

impl ItemContent for ForeignClassItem {
    fn item_type(&self) -> ItemType {
        ItemType::ForeignClass
    }

    fn size(&self, _items: &Items) -> usize {
        StringItem::encoded_size(&self.name)
    }

    fn write(&self, _cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        StringItem::write_data(&self.name, w)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignMethodItem {
    pub class: ItemId,
    pub name: ItemId,
    pub proto: ItemId,
    pub flags: u32,
}

impl ItemContent for ForeignMethodItem {
    fn item_type(&self) -> ItemType {
        ItemType::ForeignMethod
    }

    fn size(&self, _items: &Items) -> usize {
        8 + uleb128_size(self.flags.into())
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        w.write_u16(cx.index(IndexType::Class, self.class))?;
        w.write_u16(cx.index(IndexType::Proto, self.proto))?;
        w.write_u32(cx.offset(self.name))?;
        w.write_uleb128(self.flags.into())
    }

    fn index_deps(&self, _items: &Items, deps: &mut Vec<IndexDep>) {
        deps.push(IndexDep::class(self.class));
        deps.push(IndexDep::proto(self.proto));
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignFieldItem {
    pub class: ItemId,
    pub name: ItemId,
    pub ty: ItemId,
}

impl ItemContent for ForeignFieldItem {
    fn item_type(&self) -> ItemType {
        ItemType::ForeignField
    }

    fn size(&self, _items: &Items) -> usize {
        8
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        w.write_u16(cx.index(IndexType::Class, self.class))?;
        w.write_u16(cx.index(IndexType::Class, self.ty))?;
        w.write_u32(cx.offset(self.name))
    }

    fn index_deps(&self, _items: &Items, deps: &mut Vec<IndexDep>) {
        deps.push(IndexDep::class(self.class));
        deps.push(IndexDep::class(self.ty));
    }
}
