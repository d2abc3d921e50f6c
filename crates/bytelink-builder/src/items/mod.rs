//! Item model.
//!
//! Every unit of a container is an [`Item`] stored in the [`Items`] slab and
//! addressed by a stable [`ItemId`]. Items are never removed; a superseded
//! duplicate only loses its `needs_emit` flag.

mod annotation;
mod class;
mod code;
mod debug;
mod literal;
mod proto;
mod scalar;
mod string;

use std::fmt;
use std::io;

use bytelink_format::Writer;

use crate::container::WriteCx;
use crate::index::IndexDep;
use crate::invariants::wrong_kind;

pub use annotation::{AnnotationElement, AnnotationItem, ArrayElement, ArrayValueItem, ElementValue};
pub use class::{
    ClassItem, FieldItem, ForeignClassItem, ForeignFieldItem, ForeignMethodItem, MethodItem,
};
pub use code::{CodeItem, Reloc};
pub use debug::{DebugInfoItem, LineNumberProgramItem, LineProgramBuilder, LnpOp};
pub use literal::{Literal, LiteralArrayItem};
pub use proto::{PrimitiveTypeItem, ProtoItem, ProtoKey, TypeRef};
pub use scalar::{ScalarItem, ScalarKey};
pub use string::StringItem;

/// Stable handle of an item inside its container.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ItemId(pub(crate) u32);

impl ItemId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ItemType {
    String,
    Scalar,
    ArrayValue,
    PrimitiveType,
    Proto,
    Class,
    ForeignClass,
    Method,
    ForeignMethod,
    Field,
    ForeignField,
    Code,
    DebugInfo,
    LineNumberProgram,
    Annotation,
    LiteralArray,
}

impl ItemType {
    pub fn is_foreign(self) -> bool {
        matches!(
            self,
            ItemType::ForeignClass | ItemType::ForeignMethod | ItemType::ForeignField
        )
    }
}

/// Bookkeeping shared by every item.
#[derive(Clone, Copy, Debug)]
pub struct ItemBase {
    /// Assigned by layout; 0 until then.
    pub offset: u32,
    /// Dense position in layout order.
    pub order_index: u32,
    pub needs_emit: bool,
    /// Profile rank; lower is hotter.
    pub pgo_rank: Option<u8>,
}

impl Default for ItemBase {
    fn default() -> Self {
        Self {
            offset: 0,
            order_index: 0,
            needs_emit: true,
            pgo_rank: None,
        }
    }
}

/// Contract implemented by every item kind.
pub trait ItemContent {
    fn item_type(&self) -> ItemType;

    /// Power-of-two alignment of the item's first byte.
    fn alignment(&self) -> usize {
        1
    }

    /// Encoded size. Never depends on offsets assigned by layout.
    fn size(&self, items: &Items) -> usize;

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()>;

    /// Region index entries the item's encoding refers to.
    fn index_deps(&self, _items: &Items, _deps: &mut Vec<IndexDep>) {}
}

#[derive(Clone, Debug)]
pub enum Item {
    String(StringItem),
    Scalar(ScalarItem),
    ArrayValue(ArrayValueItem),
    PrimitiveType(PrimitiveTypeItem),
    Proto(ProtoItem),
    Class(ClassItem),
    ForeignClass(ForeignClassItem),
    Method(MethodItem),
    ForeignMethod(ForeignMethodItem),
    Field(FieldItem),
    ForeignField(ForeignFieldItem),
    Code(CodeItem),
    DebugInfo(DebugInfoItem),
    LineNumberProgram(LineNumberProgramItem),
    Annotation(AnnotationItem),
    LiteralArray(LiteralArrayItem),
}

impl Item {
    pub fn content(&self) -> &dyn ItemContent {
        match self {
            Item::String(i) => i,
            Item::Scalar(i) => i,
            Item::ArrayValue(i) => i,
            Item::PrimitiveType(i) => i,
            Item::Proto(i) => i,
            Item::Class(i) => i,
            Item::ForeignClass(i) => i,
            Item::Method(i) => i,
            Item::ForeignMethod(i) => i,
            Item::Field(i) => i,
            Item::ForeignField(i) => i,
            Item::Code(i) => i,
            Item::DebugInfo(i) => i,
            Item::LineNumberProgram(i) => i,
            Item::Annotation(i) => i,
            Item::LiteralArray(i) => i,
        }
    }

    pub fn item_type(&self) -> ItemType {
        self.content().item_type()
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Entry {
    pub(crate) base: ItemBase,
    pub(crate) item: Item,
}

/// Slab of items.
#[derive(Clone, Debug, Default)]
pub struct Items {
    entries: Vec<Entry>,
}

impl Items {
    pub(crate) fn push(&mut self, item: Item) -> ItemId {
        let id = ItemId(self.entries.len() as u32);
        self.entries.push(Entry {
            base: ItemBase::default(),
            item,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + use<> {
        (0..self.entries.len() as u32).map(ItemId)
    }

    pub fn get(&self, id: ItemId) -> &Item {
        &self.entries[id.index()].item
    }

    pub(crate) fn get_mut(&mut self, id: ItemId) -> &mut Item {
        &mut self.entries[id.index()].item
    }

    pub fn base(&self, id: ItemId) -> &ItemBase {
        &self.entries[id.index()].base
    }

    pub(crate) fn base_mut(&mut self, id: ItemId) -> &mut ItemBase {
        &mut self.entries[id.index()].base
    }

    pub fn item_type(&self, id: ItemId) -> ItemType {
        self.get(id).item_type()
    }

    pub fn size(&self, id: ItemId) -> usize {
        self.get(id).content().size(self)
    }

    pub fn alignment(&self, id: ItemId) -> usize {
        self.get(id).content().alignment()
    }

    pub fn offset(&self, id: ItemId) -> u32 {
        self.base(id).offset
    }

    pub fn needs_emit(&self, id: ItemId) -> bool {
        self.base(id).needs_emit
    }
}

macro_rules! typed_access {
    ($($get:ident, $get_mut:ident => $variant:ident($ty:ty);)*) => {
        impl Items {
            $(
                pub fn $get(&self, id: ItemId) -> &$ty {
                    match self.get(id) {
                        Item::$variant(item) => item,
                        other => wrong_kind(id, ItemType::$variant, other.item_type()),
                    }
                }

                #[allow(dead_code)]
                pub(crate) fn $get_mut(&mut self, id: ItemId) -> &mut $ty {
                    match self.get_mut(id) {
                        Item::$variant(item) => item,
                        other => wrong_kind(id, ItemType::$variant, other.item_type()),
                    }
                }
            )*
        }
    };
}

typed_access! {
    string, string_mut => String(StringItem);
    scalar, scalar_mut => Scalar(ScalarItem);
    array_value, array_value_mut => ArrayValue(ArrayValueItem);
    proto, proto_mut => Proto(ProtoItem);
    class, class_mut => Class(ClassItem);
    foreign_class, foreign_class_mut => ForeignClass(ForeignClassItem);
    method, method_mut => Method(MethodItem);
    foreign_method, foreign_method_mut => ForeignMethod(ForeignMethodItem);
    field, field_mut => Field(FieldItem);
    foreign_field, foreign_field_mut => ForeignField(ForeignFieldItem);
    code, code_mut => Code(CodeItem);
    debug_info, debug_info_mut => DebugInfo(DebugInfoItem);
    line_program, line_program_mut => LineNumberProgram(LineNumberProgramItem);
    annotation, annotation_mut => Annotation(AnnotationItem);
    literal_array, literal_array_mut => LiteralArray(LiteralArrayItem);
}
