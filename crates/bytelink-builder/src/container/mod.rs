//! The item container: interning factories and attachment helpers.
//!
//! Ordering, layout, patching and writing live in the submodules; dedup in
//! [`crate::dedup`] and profile ordering in [`crate::profile`].

mod layout;
mod patch;
mod write;

use std::collections::HashMap;

use bytelink_format::{TypeId, ValueTag};
use indexmap::IndexMap;

use crate::config::ContainerConfig;
use crate::index::IndexDep;
use crate::invariants::foreign_mismatch;
use crate::items::{
    AnnotationElement, AnnotationItem, ArrayElement, ArrayValueItem, ClassItem, CodeItem,
    DebugInfoItem, FieldItem, ForeignClassItem, ForeignFieldItem, ForeignMethodItem, Item,
    ItemId, ItemType, Items, LineNumberProgramItem, Literal, LiteralArrayItem, LnpOp, MethodItem,
    PrimitiveTypeItem, ProtoItem, ProtoKey, ScalarItem, ScalarKey, StringItem, TypeRef,
};

pub use layout::Layout;
pub use write::WriteCx;

/// Where a new item goes in layout order.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Emitted items, in container order.
    Ordered,
    /// The foreign window at the front.
    Foreign,
    /// Written inside its class, or never written.
    Detached,
}

/// Owns every item of one compiled unit.
#[derive(Debug)]
pub struct ItemContainer {
    config: ContainerConfig,
    pub(crate) items: Items,
    pub(crate) order: Vec<ItemId>,
    pub(crate) foreign: Vec<ItemId>,
    /// Classes and foreign classes share one name-keyed map.
    classes: IndexMap<String, ItemId>,
    strings: HashMap<String, ItemId>,
    scalars: HashMap<ScalarKey, ItemId>,
    primitives: HashMap<TypeId, ItemId>,
    protos: HashMap<ProtoKey, ItemId>,
    foreign_methods: HashMap<(ItemId, ItemId, ItemId), ItemId>,
    foreign_fields: HashMap<(ItemId, ItemId, ItemId), ItemId>,
    pub(crate) layout: Option<Layout>,
    pub(crate) code_patched: bool,
}

impl Default for ItemContainer {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}

impl ItemContainer {
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            items: Items::default(),
            order: Vec::new(),
            foreign: Vec::new(),
            classes: IndexMap::new(),
            strings: HashMap::new(),
            scalars: HashMap::new(),
            primitives: HashMap::new(),
            protos: HashMap::new(),
            foreign_methods: HashMap::new(),
            foreign_fields: HashMap::new(),
            layout: None,
            code_patched: false,
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub fn items(&self) -> &Items {
        &self.items
    }

    /// Emitted items in container order, foreign window excluded.
    pub fn order(&self) -> &[ItemId] {
        &self.order
    }

    /// Layout computed by the last [`compute_layout`](Self::compute_layout),
    /// if nothing changed since.
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Drop layout and patch state after a structural change.
    pub(crate) fn invalidate(&mut self) {
        self.layout = None;
        self.code_patched = false;
    }

    fn push(&mut self, item: Item, placement: Placement) -> ItemId {
        let id = self.items.push(item);
        match placement {
            Placement::Ordered => self.order.push(id),
            Placement::Foreign => self.foreign.push(id),
            Placement::Detached => {}
        }
        self.invalidate();
        id
    }

    pub fn get_or_create_string(&mut self, data: &str) -> ItemId {
        if let Some(&id) = self.strings.get(data) {
            return id;
        }
        let id = self.push(Item::String(StringItem::new(data)), Placement::Ordered);
        self.strings.insert(data.to_string(), id);
        id
    }

    pub fn find_string(&self, data: &str) -> Option<ItemId> {
        self.strings.get(data).copied()
    }

    pub fn get_or_create_scalar(&mut self, value: ScalarItem) -> ItemId {
        let key = value.key();
        if let Some(&id) = self.scalars.get(&key) {
            return id;
        }
        let id = self.push(Item::Scalar(value), Placement::Ordered);
        self.scalars.insert(key, id);
        id
    }

    pub fn get_or_create_primitive_type(&mut self, ty: TypeId) -> ItemId {
        if let Some(&id) = self.primitives.get(&ty) {
            return id;
        }
        let id = self.push(
            Item::PrimitiveType(PrimitiveTypeItem { ty }),
            Placement::Detached,
        );
        // Stored by type id in class tables, never written.
        self.items.base_mut(id).needs_emit = false;
        self.primitives.insert(ty, id);
        id
    }

    /// Item occupying the class-kind index slot for `ty`.
    pub fn type_item(&mut self, ty: TypeRef) -> ItemId {
        match ty {
            TypeRef::Primitive(ty) => self.get_or_create_primitive_type(ty),
            TypeRef::Class(class) => class,
        }
    }

    /// Inverse of [`type_item`](Self::type_item).
    pub fn type_ref(&self, item: ItemId) -> TypeRef {
        match self.items.get(item) {
            Item::PrimitiveType(p) => TypeRef::Primitive(p.ty),
            _ => TypeRef::Class(item),
        }
    }

    pub fn get_or_create_proto(&mut self, ret: TypeRef, params: &[TypeRef]) -> ItemId {
        let key = ProtoKey::new(ret, params);
        if let Some(&id) = self.protos.get(&key) {
            return id;
        }
        let id = self.push(
            Item::Proto(ProtoItem { key: key.clone() }),
            Placement::Ordered,
        );
        self.protos.insert(key, id);
        id
    }

    /// Get or create a local class.
    ///
    /// # Panics
    /// If `name` already names a foreign class.
    pub fn get_or_create_class(&mut self, name: &str) -> ItemId {
        if let Some(&id) = self.classes.get(name) {
            if self.is_foreign(id) {
                foreign_mismatch(name, true);
            }
            return id;
        }
        let id = self.push(Item::Class(ClassItem::new(name)), Placement::Ordered);
        self.classes.insert(name.to_string(), id);
        id
    }

    /// Get or create a class defined elsewhere.
    ///
    /// # Panics
    /// If `name` already names a local class.
    pub fn get_or_create_foreign_class(&mut self, name: &str) -> ItemId {
        if let Some(&id) = self.classes.get(name) {
            if !self.is_foreign(id) {
                foreign_mismatch(name, false);
            }
            return id;
        }
        let item = Item::ForeignClass(ForeignClassItem {
            name: name.to_string(),
        });
        let id = self.push(item, Placement::Foreign);
        self.classes.insert(name.to_string(), id);
        id
    }

    /// Class or foreign class by mangled name.
    pub fn find_class(&self, name: &str) -> Option<ItemId> {
        self.classes.get(name).copied()
    }

    /// Classes and foreign classes in creation order.
    pub fn classes(&self) -> impl Iterator<Item = (&str, ItemId)> + '_ {
        self.classes.iter().map(|(name, &id)| (name.as_str(), id))
    }

    pub fn is_foreign(&self, id: ItemId) -> bool {
        self.items.item_type(id).is_foreign()
    }

    /// Mangled name of a class or foreign class.
    pub fn class_name(&self, id: ItemId) -> &str {
        match self.items.get(id) {
            Item::ForeignClass(c) => &c.name,
            _ => &self.items.class(id).name,
        }
    }

    pub fn string(&self, id: ItemId) -> &str {
        &self.items.string(id).data
    }

    pub fn find_method(&self, class: ItemId, name: &str, proto: ItemId) -> Option<ItemId> {
        self.items.class(class).methods.iter().copied().find(|&m| {
            let method = self.items.method(m);
            method.proto == proto && self.string(method.name) == name
        })
    }

    /// Methods of `class` named `name`, whatever their prototype.
    pub fn methods_named<'a>(
        &'a self,
        class: ItemId,
        name: &'a str,
    ) -> impl Iterator<Item = ItemId> + 'a {
        self.items
            .class(class)
            .methods
            .iter()
            .copied()
            .filter(move |&m| self.string(self.items.method(m).name) == name)
    }

    pub fn find_field(&self, class: ItemId, name: &str) -> Option<ItemId> {
        self.items
            .class(class)
            .fields
            .iter()
            .copied()
            .find(|&f| self.string(self.items.field(f).name) == name)
    }

    /// Get or create a method of a local class, keyed by name, prototype
    /// and flags.
    pub fn get_or_create_method(
        &mut self,
        class: ItemId,
        name: &str,
        proto: ItemId,
        flags: u32,
    ) -> ItemId {
        if let Some(m) = self.find_method(class, name, proto)
            && self.items.method(m).flags == flags
        {
            return m;
        }
        let name = self.get_or_create_string(name);
        let method = MethodItem {
            class,
            name,
            proto,
            flags,
            code: None,
            source_lang: None,
            annotations: Vec::new(),
            debug_info: None,
            extra_deps: Vec::new(),
        };
        let id = self.push(Item::Method(method), Placement::Detached);
        self.items.class_mut(class).methods.push(id);
        id
    }

    /// Get or create a field of a local class, keyed by name and type.
    pub fn get_or_create_field(
        &mut self,
        class: ItemId,
        name: &str,
        ty: TypeRef,
        flags: u32,
    ) -> ItemId {
        let ty = self.type_item(ty);
        if let Some(f) = self.find_field(class, name)
            && self.items.field(f).ty == ty
        {
            return f;
        }
        let name = self.get_or_create_string(name);
        let field = FieldItem {
            class,
            name,
            ty,
            flags,
            value: None,
            annotations: Vec::new(),
        };
        let id = self.push(Item::Field(field), Placement::Detached);
        self.items.class_mut(class).fields.push(id);
        id
    }

    pub fn get_or_create_foreign_method(
        &mut self,
        class: ItemId,
        name: &str,
        proto: ItemId,
        flags: u32,
    ) -> ItemId {
        let name = self.get_or_create_string(name);
        if let Some(&id) = self.foreign_methods.get(&(class, name, proto)) {
            return id;
        }
        let item = Item::ForeignMethod(ForeignMethodItem {
            class,
            name,
            proto,
            flags,
        });
        let id = self.push(item, Placement::Foreign);
        self.foreign_methods.insert((class, name, proto), id);
        id
    }

    pub fn get_or_create_foreign_field(&mut self, class: ItemId, name: &str, ty: TypeRef) -> ItemId {
        let name = self.get_or_create_string(name);
        let ty = self.type_item(ty);
        if let Some(&id) = self.foreign_fields.get(&(class, name, ty)) {
            return id;
        }
        let item = Item::ForeignField(ForeignFieldItem { class, name, ty });
        let id = self.push(item, Placement::Foreign);
        self.foreign_fields.insert((class, name, ty), id);
        id
    }

    pub fn create_code(&mut self, code: CodeItem) -> ItemId {
        self.push(Item::Code(code), Placement::Ordered)
    }

    /// Attach `code` as the body of `method`.
    pub fn set_code(&mut self, method: ItemId, code: ItemId) {
        if let Some(previous) = self.items.method_mut(method).code.replace(code) {
            self.items.code_mut(previous).sharers.retain(|&m| m != method);
        }
        let sharers = &mut self.items.code_mut(code).sharers;
        if !sharers.contains(&method) {
            sharers.push(method);
        }
        self.invalidate();
    }

    pub fn create_line_program(&mut self, ops: Vec<LnpOp>) -> ItemId {
        let program = LineNumberProgramItem { ops, ref_count: 0 };
        self.push(Item::LineNumberProgram(program), Placement::Ordered)
    }

    /// Create debug info referring to `program`, taking one reference on it.
    pub fn create_debug_info(
        &mut self,
        line_start: u32,
        param_names: Vec<ItemId>,
        program: ItemId,
    ) -> ItemId {
        self.items.line_program_mut(program).ref_count += 1;
        let debug = DebugInfoItem {
            line_start,
            param_names,
            program,
        };
        self.push(Item::DebugInfo(debug), Placement::Ordered)
    }

    pub fn set_debug_info(&mut self, method: ItemId, debug: ItemId) {
        self.items.method_mut(method).debug_info = Some(debug);
        self.invalidate();
    }

    pub fn create_annotation(&mut self, class: ItemId, elements: Vec<AnnotationElement>) -> ItemId {
        self.push(
            Item::Annotation(AnnotationItem { class, elements }),
            Placement::Ordered,
        )
    }

    pub fn create_array_value(
        &mut self,
        tag: ValueTag,
        elements: Vec<ArrayElement>,
    ) -> ItemId {
        let item = ArrayValueItem {
            tag: tag.element(),
            elements,
        };
        self.push(Item::ArrayValue(item), Placement::Ordered)
    }

    pub fn create_literal_array(&mut self, values: Vec<Literal>) -> ItemId {
        self.push(
            Item::LiteralArray(LiteralArrayItem { values }),
            Placement::Ordered,
        )
    }

    /// Annotation list of a class, method or field.
    pub(crate) fn annotations_mut(&mut self, owner: ItemId) -> &mut Vec<ItemId> {
        match self.items.item_type(owner) {
            ItemType::Method => &mut self.items.method_mut(owner).annotations,
            ItemType::Field => &mut self.items.field_mut(owner).annotations,
            _ => &mut self.items.class_mut(owner).annotations,
        }
    }

    /// Attach an annotation to a class, method or field.
    pub fn add_annotation(&mut self, owner: ItemId, annotation: ItemId) {
        self.annotations_mut(owner).push(annotation);
        self.invalidate();
    }

    pub fn set_super_class(&mut self, class: ItemId, super_class: ItemId) {
        self.items.class_mut(class).super_class = Some(super_class);
        self.invalidate();
    }

    pub fn add_interface(&mut self, class: ItemId, iface: ItemId) {
        self.items.class_mut(class).interfaces.push(iface);
        self.invalidate();
    }

    pub fn set_class_flags(&mut self, class: ItemId, flags: u32) {
        self.items.class_mut(class).flags = flags;
        self.invalidate();
    }

    pub fn set_source_file(&mut self, class: ItemId, file: &str) {
        let file = self.get_or_create_string(file);
        self.items.class_mut(class).source_file = Some(file);
        self.invalidate();
    }

    /// Set the source language of a class or method.
    pub fn set_source_lang(&mut self, owner: ItemId, lang: u8) {
        match self.items.item_type(owner) {
            ItemType::Method => self.items.method_mut(owner).source_lang = Some(lang),
            _ => self.items.class_mut(owner).source_lang = Some(lang),
        }
        self.invalidate();
    }

    pub fn set_field_value(&mut self, field: ItemId, value: ItemId) {
        self.items.field_mut(field).value = Some(value);
        self.invalidate();
    }

    /// Add an index entry `method` needs beyond its code's relocations.
    pub fn add_index_dependency(&mut self, method: ItemId, dep: IndexDep) {
        self.items.method_mut(method).extra_deps.push(dep);
        self.invalidate();
    }

    /// Every method of every local class, in class creation order.
    pub fn methods(&self) -> Vec<ItemId> {
        self.classes
            .values()
            .filter(|&&c| self.items.item_type(c) == ItemType::Class)
            .flat_map(|&c| self.items.class(c).methods.iter().copied())
            .collect()
    }

    /// Whether `id` takes up bytes in the output.
    pub fn is_emitted(&self, id: ItemId) -> bool {
        if !self.items.needs_emit(id) {
            return false;
        }
        match self.items.get(id) {
            Item::LineNumberProgram(p) => p.ref_count > 0,
            _ => true,
        }
    }

    /// Emitted top-level items in layout order, foreign window first.
    pub fn emitted_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.foreign
            .iter()
            .chain(&self.order)
            .copied()
            .filter(|&id| self.is_emitted(id))
    }

    pub(crate) fn has_relocations(&self) -> bool {
        self.order.iter().any(|&id| {
            self.is_emitted(id)
                && matches!(self.items.get(id), Item::Code(code) if !code.relocs.is_empty())
        })
    }
}
