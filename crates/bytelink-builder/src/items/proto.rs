use std::hash::{Hash, Hasher};
use std::io;

use bytelink_format::{IndexType, TypeId, Writer};

use super::{ItemContent, ItemId, ItemType, Items};
use crate::container::WriteCx;
use crate::index::IndexDep;

/// A type as seen by members and prototypes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TypeRef {
    Primitive(TypeId),
    /// A class or foreign class item.
    Class(ItemId),
}

impl TypeRef {
    pub fn shorty(self) -> TypeId {
        match self {
            TypeRef::Primitive(ty) => ty,
            TypeRef::Class(_) => TypeId::Reference,
        }
    }
}

/// One instance per type id. Occupies class-kind index slots, never emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrimitiveTypeItem {
    pub ty: TypeId,
}

impl ItemContent for PrimitiveTypeItem {
    fn item_type(&self) -> ItemType {
        ItemType::PrimitiveType
    }

    fn size(&self, _items: &Items) -> usize {
        0
    }

    fn write(&self, _cx: &WriteCx<'_>, _w: &mut dyn Writer) -> io::Result<()> {
        Ok(())
    }
}

/// Prototype identity: shorty (return type first) and the class of each
/// reference element in shorty order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtoKey {
    pub shorty: Vec<TypeId>,
    pub refs: Vec<ItemId>,
}

impl ProtoKey {
    pub fn new(ret: TypeRef, params: &[TypeRef]) -> Self {
        let mut shorty = Vec::with_capacity(params.len() + 1);
        let mut refs = Vec::new();
        for ty in std::iter::once(&ret).chain(params) {
            shorty.push(ty.shorty());
            if let TypeRef::Class(class) = ty {
                refs.push(*class);
            }
        }
        Self { shorty, refs }
    }

    /// Shorty as descriptor letters, e.g. `VIL`.
    pub fn shorty_string(&self) -> String {
        self.shorty.iter().map(|t| t.descriptor()).collect()
    }

    /// Return type followed by the parameters.
    pub fn types(&self) -> Vec<TypeRef> {
        let mut refs = self.refs.iter();
        self.shorty
            .iter()
            .map(|&ty| {
                if ty.is_reference()
                    && let Some(&class) = refs.next()
                {
                    TypeRef::Class(class)
                } else {
                    TypeRef::Primitive(ty)
                }
            })
            .collect()
    }
}

impl Hash for ProtoKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shorty_string().hash(state);
        let mut refs = self.refs.iter();
        // Return type, then each parameter.
        for ty in &self.shorty {
            ty.hash(state);
            if ty.is_reference()
                && let Some(class) = refs.next()
            {
                class.hash(state);
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtoItem {
    pub key: ProtoKey,
}

impl ProtoItem {
    fn shorty_words(&self) -> usize {
        // One terminating nibble.
        (self.key.shorty.len() + 1).div_ceil(4)
    }
}

impl ItemContent for ProtoItem {
    fn item_type(&self) -> ItemType {
        ItemType::Proto
    }

    fn alignment(&self) -> usize {
        2
    }

    fn size(&self, _items: &Items) -> usize {
        (self.shorty_words() + self.key.refs.len()) * 2
    }

    fn write(&self, cx: &WriteCx<'_>, w: &mut dyn Writer) -> io::Result<()> {
        let mut words = vec![0u16; self.shorty_words()];
        for (i, ty) in self.key.shorty.iter().enumerate() {
            words[i / 4] |= (*ty as u16) << ((i % 4) * 4);
        }
        for word in words {
            w.write_u16(word)?;
        }
        for &class in &self.key.refs {
            w.write_u16(cx.index(IndexType::Class, class))?;
        }
        Ok(())
    }

    fn index_deps(&self, _items: &Items, deps: &mut Vec<IndexDep>) {
        deps.extend(self.key.refs.iter().map(|&c| IndexDep::class(c)));
    }
}
