//! Human-readable dump of a container.

use std::fmt::Write as _;

use bytelink_core::{Colors, demangle_field, demangle_method, demangle_type};

use crate::FormatError;
use crate::file::{File, LiteralValue};
use crate::ids::{EntityId, IndexType};
use crate::isa::{IdKind, OperandKind};

/// Render header, regions, classes (with disassembled code) and literal arrays.
pub fn dump(file: &File, colors: Colors) -> Result<String, FormatError> {
    let mut out = String::new();
    let c = colors;

    dump_header(&mut out, file, c);
    dump_regions(&mut out, file, c);
    dump_classes(&mut out, file, c)?;
    dump_literals(&mut out, file, c)?;

    Ok(out)
}

fn dump_header(out: &mut String, file: &File, c: Colors) {
    let h = file.header();
    out.push_str("[header]\n");
    writeln!(out, "version = {}", h.version).unwrap();
    writeln!(out, "size = {}", h.file_size).unwrap();
    writeln!(out, "checksum = {:#010x}", h.checksum).unwrap();
    writeln!(
        out,
        "foreign = {}{:#06x}..{:#06x}{}",
        c.dim,
        h.foreign_off,
        h.foreign_off + h.foreign_size,
        c.reset
    )
    .unwrap();
    writeln!(out, "classes = {}", h.num_classes).unwrap();
    writeln!(out, "literal_arrays = {}", h.num_literal_arrays).unwrap();
    writeln!(out, "line_programs = {}", h.num_lnps).unwrap();
    out.push('\n');
}

fn dump_regions(out: &mut String, file: &File, c: Colors) {
    out.push_str("[regions]\n");
    for (i, region) in file.regions().iter().enumerate() {
        write!(
            out,
            "R{i} {}{:#06x}..{:#06x}{}",
            c.dim, region.start, region.end, c.reset
        )
        .unwrap();
        for kind in IndexType::REGION_KINDS {
            if let Some(slot) = kind.region_slot() {
                write!(out, " {}={}", kind.name(), region.tables[slot].0).unwrap();
            }
        }
        out.push('\n');
    }
    out.push('\n');
}

/// `pkg.Cls::name(params): ret` for a method or foreign method at `id`.
///
/// Local and foreign methods share the leading `class_idx, proto_idx, name`
/// layout, so the foreign accessor reads both.
fn method_signature(file: &File, id: EntityId) -> Result<String, FormatError> {
    let m = file.foreign_method(id)?;
    let class = file.type_descriptor(file.resolve_type(id, m.class_idx)?)?;
    let name = file.string_at(m.name)?;
    let proto_id = file.resolve_index(id, IndexType::Proto, m.proto_idx)?;
    let types = file.proto(proto_id)?.types(file)?;
    let mut descs = Vec::with_capacity(types.len());
    for ty in types {
        descs.push(file.type_descriptor(ty)?);
    }
    let (ret, params) = descs
        .split_first()
        .ok_or_else(|| FormatError::malformed(proto_id.offset(), "proto"))?;
    let params: Vec<&str> = params.iter().map(String::as_str).collect();
    Ok(demangle_method(&class, name, &params, ret))
}

/// `pkg.Cls::name: ty` for a field or foreign field at `id`.
fn field_signature(file: &File, id: EntityId) -> Result<String, FormatError> {
    let f = file.foreign_field(id)?;
    let class = file.type_descriptor(file.resolve_type(id, f.class_idx)?)?;
    let ty = file.type_descriptor(file.resolve_type(id, f.type_idx)?)?;
    Ok(demangle_field(&class, file.string_at(f.name)?, &ty))
}

fn dump_classes(out: &mut String, file: &File, c: Colors) -> Result<(), FormatError> {
    out.push_str("[classes]\n");
    for id in file.class_ids() {
        if file.is_foreign(id) {
            writeln!(
                out,
                "{}{id}{} foreign {}{}{}",
                c.dim,
                c.reset,
                c.blue,
                demangle_type(file.string_at(id)?),
                c.reset
            )
            .unwrap();
            continue;
        }

        let class = file.class(id)?;
        write!(
            out,
            "{}{id}{} {}{}{}",
            c.dim,
            c.reset,
            c.blue,
            demangle_type(class.name),
            c.reset
        )
        .unwrap();
        if let Some(sup) = class.super_class {
            write!(out, " extends {}", demangle_type(file.string_at(sup)?)).unwrap();
        }
        out.push('\n');

        for field in &class.fields {
            writeln!(
                out,
                "  {}{}{} field {}",
                c.dim,
                field.id,
                c.reset,
                field_signature(file, field.id)?
            )
            .unwrap();
        }
        for method in &class.methods {
            writeln!(
                out,
                "  {}{}{} method {}",
                c.dim,
                method.id,
                c.reset,
                method_signature(file, method.id)?
            )
            .unwrap();
            if let Some(code) = method.code {
                dump_code(out, file, method.id, code, c)?;
            }
        }
    }
    out.push('\n');
    Ok(())
}

fn dump_code(
    out: &mut String,
    file: &File,
    method: EntityId,
    code: EntityId,
    c: Colors,
) -> Result<(), FormatError> {
    let code = file.code(code)?;
    writeln!(
        out,
        "    {}; vregs={} args={} size={}{}",
        c.dim,
        code.num_vregs,
        code.num_args,
        code.code.len(),
        c.reset
    )
    .unwrap();

    for insn in code.instructions() {
        let insn = insn?;
        write!(
            out,
            "    {}{:04x}{}  {}{}{}",
            c.dim,
            insn.pc,
            c.reset,
            c.yellow,
            insn.opcode.mnemonic(),
            c.reset
        )
        .unwrap();

        let mut sep = " ";
        for (kind, value) in insn.operands() {
            out.push_str(sep);
            sep = ", ";
            match kind {
                OperandKind::Reg => write!(out, "v{value}").unwrap(),
                OperandKind::Imm16 => write!(out, "{}", value as u16 as i16).unwrap(),
                OperandKind::Imm32 => write!(out, "{}", value as u32 as i32).unwrap(),
                OperandKind::Imm64 => write!(out, "{}", value as i64).unwrap(),
                OperandKind::Id(id) => render_id(out, file, method, id, value as u32, c)?,
            }
        }
        out.push('\n');
    }
    Ok(())
}

fn render_id(
    out: &mut String,
    file: &File,
    method: EntityId,
    kind: IdKind,
    value: u32,
    c: Colors,
) -> Result<(), FormatError> {
    let index = value as u16;
    match kind {
        IdKind::String => {
            let id = file.resolve_index(method, IndexType::MethodStringLiteral, index)?;
            write!(out, "{}{:?}{}", c.green, file.string_at(id)?, c.reset).unwrap();
        }
        IdKind::Class => {
            let ty = file.resolve_type(method, index)?;
            write!(out, "{}", demangle_type(&file.type_descriptor(ty)?)).unwrap();
        }
        IdKind::Field => {
            let id = file.resolve_index(method, IndexType::Field, index)?;
            out.push_str(&field_signature(file, id)?);
        }
        IdKind::Method => {
            let id = file.resolve_index(method, IndexType::MethodStringLiteral, index)?;
            out.push_str(&method_signature(file, id)?);
        }
        IdKind::LiteralArray => write!(out, "L{value}").unwrap(),
    }
    Ok(())
}

fn dump_literals(out: &mut String, file: &File, c: Colors) -> Result<(), FormatError> {
    out.push_str("[literals]\n");
    for (i, id) in file.literal_array_ids().enumerate() {
        let array = file.literal_array(id)?;
        write!(out, "L{i} {}{id}{} [", c.dim, c.reset).unwrap();
        for (n, value) in array.values.iter().enumerate() {
            if n > 0 {
                out.push_str(", ");
            }
            match value {
                LiteralValue::Bool(b) => write!(out, "{b}").unwrap(),
                LiteralValue::I32(v) => write!(out, "{v}").unwrap(),
                LiteralValue::I64(v) => write!(out, "{v}L").unwrap(),
                LiteralValue::F64(v) => write!(out, "{v:?}").unwrap(),
                LiteralValue::String(s) => {
                    write!(out, "{}{:?}{}", c.green, file.string_at(*s)?, c.reset).unwrap()
                }
                LiteralValue::Method(m) => out.push_str(&method_signature(file, *m)?),
                LiteralValue::Null => out.push_str("null"),
            }
        }
        out.push_str("]\n");
    }
    Ok(())
}
