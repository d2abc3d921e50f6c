//! Parse stage: materialize every input into the output container.
//!
//! Runs in two passes over the inputs. The first declares the fields and
//! methods of every local class, so that the second pass, which copies
//! bodies, can bind foreign member references to definitions from any
//! input. Foreign members are resolved lazily, the first time a body
//! refers to them.

use std::collections::HashMap;

use bytelink_builder::items::{
    AnnotationElement, ArrayElement, CodeItem, ElementValue, Literal, LnpOp, Reloc, ScalarItem,
};
use bytelink_builder::{ItemContainer, ItemId, TypeRef};
use bytelink_core::{demangle_field, demangle_method};
use bytelink_format::file::{LineOp, LiteralValue};
use bytelink_format::isa::IdKind;
use bytelink_format::{
    EntityId, File, FormatError, IndexType, TypeId, TypeRef as InputType, ValueTag,
};
use tracing::{debug, trace};

use super::{Context, InputMap, Stage};
use crate::config::LinkerConfig;
use crate::error::LinkError;

impl Context {
    pub fn parse(&mut self) -> bool {
        self.run_stage(Stage::Parse, |cx| {
            for index in 0..cx.inputs.len() {
                cx.parser(index).run(InputParser::declare_members);
            }
            for index in 0..cx.inputs.len() {
                cx.parser(index).run(InputParser::materialize);
            }
            debug!(
                items = cx.container.items().len(),
                members = cx.member_owners.len(),
                "inputs parsed"
            );
        })
    }

    fn parser(&mut self, index: usize) -> InputParser<'_> {
        let Self {
            config,
            container,
            inputs,
            maps,
            definers,
            member_owners,
            errors,
            ..
        } = self;
        let inputs: &[File] = inputs;
        InputParser {
            index,
            file: &inputs[index],
            inputs,
            config,
            container,
            map: &mut maps[index],
            definers,
            member_owners,
            errors,
        }
    }
}

/// Translates one input, borrowing the shared link state.
struct InputParser<'a> {
    index: usize,
    file: &'a File,
    inputs: &'a [File],
    config: &'a LinkerConfig,
    container: &'a mut ItemContainer,
    map: &'a mut InputMap,
    definers: &'a HashMap<String, usize>,
    member_owners: &'a mut HashMap<ItemId, usize>,
    errors: &'a mut Vec<LinkError>,
}

impl InputParser<'_> {
    fn run(mut self, step: fn(&mut Self) -> Result<(), FormatError>) {
        if let Err(e) = step(&mut self) {
            self.errors.push(LinkError::malformed(self.file.name(), e));
        }
    }

    /// Local classes of this input that made it through the merge.
    fn local_classes(&self) -> Vec<(EntityId, ItemId)> {
        let file = self.file;
        file.class_ids()
            .filter(|&id| !file.is_foreign(id))
            .filter_map(|id| self.map.classes.get(&id).map(|&item| (id, item)))
            .collect()
    }

    fn declare_members(&mut self) -> Result<(), FormatError> {
        let file = self.file;
        for (id, class) in self.local_classes() {
            let data = file.class(id)?;
            for field in &data.fields {
                let name = file.string_at(field.name)?;
                let ty = self.type_ref(field.id, field.type_idx)?;
                if let Some(existing) = self.container.find_field(class, name) {
                    let member = field_signature(self.container, existing);
                    self.redefinition(existing, member);
                    continue;
                }
                let item = self.container.get_or_create_field(class, name, ty, field.flags);
                self.declare(field.id, item);
            }
            for method in &data.methods {
                let name = file.string_at(method.name)?;
                let proto = self.proto(method.id, method.proto_idx)?;
                if let Some(existing) = self.container.find_method(class, name, proto) {
                    let member = method_signature(self.container, class, name, proto);
                    self.redefinition(existing, member);
                    continue;
                }
                let item = self
                    .container
                    .get_or_create_method(class, name, proto, method.flags);
                self.declare(method.id, item);
            }
        }
        Ok(())
    }

    fn declare(&mut self, id: EntityId, item: ItemId) {
        self.map.members.insert(id, item);
        self.member_owners.insert(item, self.index);
    }

    fn redefinition(&mut self, existing: ItemId, member: String) {
        let first = self
            .member_owners
            .get(&existing)
            .map_or(self.file.name(), |&i| self.inputs[i].name());
        self.errors.push(LinkError::MemberRedefinition {
            member,
            first: first.to_string(),
            second: self.file.name().to_string(),
        });
    }

    fn materialize(&mut self) -> Result<(), FormatError> {
        let file = self.file;
        // Literal arrays first, so their output index follows input order.
        for id in file.literal_array_ids() {
            self.literal_array(id)?;
        }
        for (id, class) in self.local_classes() {
            self.class_body(id, class)?;
        }
        Ok(())
    }

    fn class_body(&mut self, id: EntityId, class: ItemId) -> Result<(), FormatError> {
        let file = self.file;
        let data = file.class(id)?;

        // Attributes of a partial class come from its first definer.
        if self.definers.get(data.name) == Some(&self.index) {
            self.container.set_class_flags(class, data.flags);
            if let Some(super_class) = data.super_class {
                let super_class = self.class(super_class)?;
                self.container.set_super_class(class, super_class);
            }
            if let Some(lang) = data.source_lang {
                self.container.set_source_lang(class, lang);
            }
            if let Some(source) = data.source_file {
                let source = file.string_at(source)?;
                self.container.set_source_file(class, source);
            }
        }
        for &index in &data.interfaces {
            let TypeRef::Class(iface) = self.type_ref(id, index)? else {
                return Err(malformed(id, "interface"));
            };
            if !self.container.items().class(class).interfaces.contains(&iface) {
                self.container.add_interface(class, iface);
            }
        }
        for &annotation in &data.annotations {
            let annotation = self.annotation(annotation)?;
            self.container.add_annotation(class, annotation);
        }

        for field in &data.fields {
            let Some(&item) = self.map.members.get(&field.id) else {
                continue;
            };
            if let Some(value) = field.value {
                let value = self.field_value(item, value)?;
                self.container.set_field_value(item, value);
            }
            for &annotation in &field.annotations {
                let annotation = self.annotation(annotation)?;
                self.container.add_annotation(item, annotation);
            }
        }

        for method in &data.methods {
            let Some(&item) = self.map.members.get(&method.id) else {
                continue;
            };
            if let Some(lang) = method.source_lang {
                self.container.set_source_lang(item, lang);
            }
            for &annotation in &method.annotations {
                let annotation = self.annotation(annotation)?;
                self.container.add_annotation(item, annotation);
            }
            if let Some(code) = method.code {
                let code = self.code(method.id, code)?;
                self.container.set_code(item, code);
            }
            if let Some(debug_info) = method.debug_info
                && !self.config.strip_debug_info
            {
                let debug_info = self.debug_info(debug_info)?;
                self.container.set_debug_info(item, debug_info);
            }
        }
        Ok(())
    }

    // Types and prototypes

    fn class(&self, id: EntityId) -> Result<ItemId, FormatError> {
        self.map
            .classes
            .get(&id)
            .copied()
            .ok_or_else(|| malformed(id, "class reference"))
    }

    fn input_type(&self, ty: InputType) -> Result<TypeRef, FormatError> {
        match ty {
            InputType::Primitive(ty) => Ok(TypeRef::Primitive(ty)),
            InputType::Class(id) => self.class(id).map(TypeRef::Class),
        }
    }

    /// Class-kind index `index` as seen from `from`.
    fn type_ref(&self, from: EntityId, index: u16) -> Result<TypeRef, FormatError> {
        self.input_type(self.file.resolve_type(from, index)?)
    }

    fn owner_class(&self, from: EntityId, index: u16) -> Result<ItemId, FormatError> {
        match self.type_ref(from, index)? {
            TypeRef::Class(class) => Ok(class),
            TypeRef::Primitive(_) => Err(malformed(from, "member class")),
        }
    }

    fn proto(&mut self, from: EntityId, index: u16) -> Result<ItemId, FormatError> {
        let file = self.file;
        let id = file.resolve_index(from, IndexType::Proto, index)?;
        if let Some(&item) = self.map.protos.get(&id) {
            return Ok(item);
        }
        let types = file
            .proto(id)?
            .types(file)?
            .into_iter()
            .map(|ty| self.input_type(ty))
            .collect::<Result<Vec<_>, _>>()?;
        let (ret, params) = types.split_first().ok_or_else(|| malformed(id, "proto"))?;
        let item = self.container.get_or_create_proto(*ret, params);
        self.map.protos.insert(id, item);
        Ok(item)
    }

    fn string(&mut self, id: EntityId) -> Result<ItemId, FormatError> {
        let data = self.file.string_at(id)?;
        Ok(self.container.get_or_create_string(data))
    }

    // Member references

    /// Output method for a method entity of this input, binding foreign
    /// references on first use. `None` once the reference has been reported
    /// as unresolved.
    fn method_ref(&mut self, id: EntityId) -> Result<Option<ItemId>, FormatError> {
        if let Some(&item) = self.map.members.get(&id) {
            return Ok(Some(item));
        }
        if self.map.unresolved.contains(&id) {
            return Ok(None);
        }
        let file = self.file;
        if !file.is_foreign(id) {
            return Err(malformed(id, "method reference"));
        }
        let data = file.foreign_method(id)?;
        let class = self.owner_class(id, data.class_idx)?;
        let name = file.string_at(data.name)?;
        let proto = self.proto(id, data.proto_idx)?;

        let resolved = if self.container.is_foreign(class) {
            Some(
                self.container
                    .get_or_create_foreign_method(class, name, proto, data.flags),
            )
        } else {
            self.container.find_method(class, name, proto)
        };
        if let Some(item) = resolved {
            trace!(method = name, input = file.name(), "method reference bound");
            self.map.members.insert(id, item);
            return Ok(Some(item));
        }

        let method = method_signature(self.container, class, name, proto);
        let input = file.name().to_string();
        let error = match self.container.methods_named(class, name).next() {
            Some(found) => LinkError::PrototypeMismatch {
                method,
                file: input,
                found: method_item_signature(self.container, found),
            },
            None => LinkError::UnresolvedMethod {
                method,
                file: input,
            },
        };
        self.errors.push(error);
        self.map.unresolved.insert(id);
        Ok(None)
    }

    fn field_ref(&mut self, id: EntityId) -> Result<Option<ItemId>, FormatError> {
        if let Some(&item) = self.map.members.get(&id) {
            return Ok(Some(item));
        }
        if self.map.unresolved.contains(&id) {
            return Ok(None);
        }
        let file = self.file;
        if !file.is_foreign(id) {
            return Err(malformed(id, "field reference"));
        }
        let data = file.foreign_field(id)?;
        let class = self.owner_class(id, data.class_idx)?;
        let name = file.string_at(data.name)?;
        let ty = self.type_ref(id, data.type_idx)?;

        if self.container.is_foreign(class) {
            let item = self.container.get_or_create_foreign_field(class, name, ty);
            self.map.members.insert(id, item);
            return Ok(Some(item));
        }

        let field = demangle_field(
            self.container.class_name(class),
            name,
            &descriptor(self.container, ty),
        );
        let error = match self.container.find_field(class, name) {
            Some(found) if field_type(self.container, found) == ty => {
                trace!(field = name, input = file.name(), "field reference bound");
                self.map.members.insert(id, found);
                return Ok(Some(found));
            }
            Some(found) => LinkError::FieldTypeMismatch {
                field,
                file: file.name().to_string(),
                found: field_signature(self.container, found),
            },
            None => LinkError::UnresolvedField {
                field,
                file: file.name().to_string(),
            },
        };
        self.errors.push(error);
        self.map.unresolved.insert(id);
        Ok(None)
    }

    // Bodies

    /// One code item per method. Bodies shared in the input may land in
    /// different output regions; the code dedup pass re-shares them per region.
    fn code(&mut self, method: EntityId, id: EntityId) -> Result<ItemId, FormatError> {
        let file = self.file;
        let data = file.code(id)?;
        let mut relocs = Vec::new();
        for insn in data.instructions() {
            let Some(operand) = insn?.id_operand() else {
                continue;
            };
            // Region-table operands are 16 bits wide.
            let index = operand.value as u16;
            let target = match operand.kind {
                IdKind::String => {
                    let string = file.resolve_index(method, IndexType::MethodStringLiteral, index)?;
                    self.string(string)?
                }
                IdKind::Method => {
                    let callee = file.resolve_index(method, IndexType::MethodStringLiteral, index)?;
                    match self.method_ref(callee)? {
                        Some(item) => item,
                        None => continue,
                    }
                }
                IdKind::Field => {
                    let field = file.resolve_index(method, IndexType::Field, index)?;
                    match self.field_ref(field)? {
                        Some(item) => item,
                        None => continue,
                    }
                }
                IdKind::Class => {
                    let ty = self.type_ref(method, index)?;
                    self.container.type_item(ty)
                }
                IdKind::LiteralArray => {
                    let array = file
                        .literal_array_id(operand.value)
                        .ok_or_else(|| malformed(data.id, "literal array index"))?;
                    self.literal_array(array)?
                }
            };
            relocs.push(Reloc {
                pos: operand.pos,
                kind: operand.kind,
                target,
            });
        }
        let code = CodeItem::new(data.num_vregs, data.num_args, data.code.to_vec(), relocs);
        Ok(self.container.create_code(code))
    }

    fn debug_info(&mut self, id: EntityId) -> Result<ItemId, FormatError> {
        if let Some(&item) = self.map.debug_info.get(&id) {
            return Ok(item);
        }
        let file = self.file;
        let data = file.debug_info(id)?;
        let program = file
            .line_program_id(data.lnp_index)
            .ok_or_else(|| malformed(id, "line program index"))?;
        let program = self.line_program(program)?;
        let params = data
            .param_names
            .iter()
            .map(|&name| self.string(name))
            .collect::<Result<Vec<_>, _>>()?;
        let item = self
            .container
            .create_debug_info(data.line_start, params, program);
        self.map.debug_info.insert(id, item);
        Ok(item)
    }

    fn line_program(&mut self, id: EntityId) -> Result<ItemId, FormatError> {
        if let Some(&item) = self.map.line_programs.get(&id) {
            return Ok(item);
        }
        let data = self.file.line_program(id)?;
        let mut ops = Vec::with_capacity(data.ops.len());
        for op in data.ops {
            ops.push(match op {
                LineOp::AdvancePc(delta) => LnpOp::AdvancePc(delta),
                LineOp::AdvanceLine(delta) => LnpOp::AdvanceLine(delta),
                LineOp::SetFile(name) => LnpOp::SetFile(self.string(name)?),
                LineOp::SetColumn(column) => LnpOp::SetColumn(column),
            });
        }
        let item = self.container.create_line_program(ops);
        self.map.line_programs.insert(id, item);
        Ok(item)
    }

    fn literal_array(&mut self, id: EntityId) -> Result<ItemId, FormatError> {
        if let Some(&item) = self.map.literals.get(&id) {
            return Ok(item);
        }
        let data = self.file.literal_array(id)?;
        let mut values = Vec::with_capacity(data.values.len());
        for value in data.values {
            values.push(match value {
                LiteralValue::Bool(v) => Literal::Bool(v),
                LiteralValue::I32(v) => Literal::I32(v),
                LiteralValue::I64(v) => Literal::I64(v),
                LiteralValue::F64(v) => Literal::F64(v),
                LiteralValue::String(s) => Literal::String(self.string(s)?),
                LiteralValue::Method(m) => self.method_ref(m)?.map_or(Literal::Null, Literal::Method),
                LiteralValue::Null => Literal::Null,
            });
        }
        let item = self.container.create_literal_array(values);
        self.map.literals.insert(id, item);
        Ok(item)
    }

    fn field_value(&mut self, field: ItemId, id: EntityId) -> Result<ItemId, FormatError> {
        let file = self.file;
        let value = match field_type(self.container, field) {
            TypeRef::Primitive(TypeId::F32) => {
                ScalarItem::F32(f32::from_bits(file.scalar(id, false)?.bits as u32))
            }
            TypeRef::Primitive(TypeId::F64) => {
                ScalarItem::F64(f64::from_bits(file.scalar(id, true)?.bits))
            }
            TypeRef::Primitive(TypeId::I64 | TypeId::U64) => {
                ScalarItem::I64(file.scalar(id, true)?.bits as i64)
            }
            TypeRef::Class(_) | TypeRef::Primitive(TypeId::Reference | TypeId::Tagged) => {
                let target = EntityId(file.scalar(id, false)?.bits as u32);
                ScalarItem::Id(self.string(target)?)
            }
            TypeRef::Primitive(_) => ScalarItem::I32(file.scalar(id, false)?.bits as i32),
        };
        Ok(self.container.get_or_create_scalar(value))
    }

    // Annotations

    fn annotation(&mut self, id: EntityId) -> Result<ItemId, FormatError> {
        if let Some(&item) = self.map.annotations.get(&id) {
            return Ok(item);
        }
        let data = self.file.annotation(id)?;
        let class = self.class(data.class)?;
        let mut elements = Vec::with_capacity(data.elements.len());
        for element in &data.elements {
            let name = self.string(element.name)?;
            let Some(value) = self.element_value(element.tag, element.value)? else {
                continue;
            };
            elements.push(AnnotationElement {
                name,
                tag: element.tag,
                value,
            });
        }
        let item = self.container.create_annotation(class, elements);
        self.map.annotations.insert(id, item);
        Ok(item)
    }

    fn element_value(&mut self, tag: ValueTag, raw: u32) -> Result<Option<ElementValue>, FormatError> {
        let file = self.file;
        let target = EntityId(raw);
        let item = match tag {
            ValueTag::I32 | ValueTag::F32 => return Ok(Some(ElementValue::Immediate(raw))),
            ValueTag::I64 => {
                let bits = file.scalar(target, true)?.bits;
                self.container.get_or_create_scalar(ScalarItem::I64(bits as i64))
            }
            ValueTag::F64 => {
                let bits = file.scalar(target, true)?.bits;
                self.container
                    .get_or_create_scalar(ScalarItem::F64(f64::from_bits(bits)))
            }
            ValueTag::String => self.string(target)?,
            ValueTag::Class => self.class(target)?,
            ValueTag::Method => match self.method_ref(target)? {
                Some(item) => item,
                None => return Ok(None),
            },
            _ => self.array_value(target, tag)?,
        };
        Ok(Some(ElementValue::Item(item)))
    }

    fn array_value(&mut self, id: EntityId, tag: ValueTag) -> Result<ItemId, FormatError> {
        if let Some(&item) = self.map.arrays.get(&id) {
            return Ok(item);
        }
        let data = self.file.array_value(id, tag)?;
        let mut elements = Vec::with_capacity(data.values.len());
        for value in data.values {
            let target = EntityId(value as u32);
            elements.push(match data.tag {
                ValueTag::String => ArrayElement::Item(self.string(target)?),
                ValueTag::Class => ArrayElement::Item(self.class(target)?),
                ValueTag::Method => match self.method_ref(target)? {
                    Some(item) => ArrayElement::Item(item),
                    None => continue,
                },
                _ => ArrayElement::Immediate(value),
            });
        }
        let item = self.container.create_array_value(tag, elements);
        self.map.arrays.insert(id, item);
        Ok(item)
    }
}

fn malformed(id: EntityId, what: &'static str) -> FormatError {
    FormatError::Malformed {
        offset: id.offset(),
        what,
    }
}

// Demangled names for diagnostics, rendered from the output container.

fn descriptor(c: &ItemContainer, ty: TypeRef) -> String {
    match ty {
        TypeRef::Primitive(ty) => ty.descriptor().to_string(),
        TypeRef::Class(class) => c.class_name(class).to_string(),
    }
}

fn field_type(c: &ItemContainer, field: ItemId) -> TypeRef {
    c.type_ref(c.items().field(field).ty)
}

fn field_signature(c: &ItemContainer, field: ItemId) -> String {
    let data = c.items().field(field);
    demangle_field(
        c.class_name(data.class),
        c.string(data.name),
        &descriptor(c, field_type(c, field)),
    )
}

fn method_signature(c: &ItemContainer, class: ItemId, name: &str, proto: ItemId) -> String {
    let types: Vec<String> = c
        .items()
        .proto(proto)
        .key
        .types()
        .into_iter()
        .map(|ty| descriptor(c, ty))
        .collect();
    let (ret, params) = types.split_first().map_or(("V", &[][..]), |(r, p)| (r.as_str(), p));
    let params: Vec<&str> = params.iter().map(String::as_str).collect();
    demangle_method(c.class_name(class), name, &params, ret)
}

fn method_item_signature(c: &ItemContainer, method: ItemId) -> String {
    let data = c.items().method(method);
    method_signature(c, data.class, c.string(data.name), data.proto)
}
