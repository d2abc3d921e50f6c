use bytelink_format::isa::{IdKind, Instructions, Opcode};
use bytelink_format::{EntityId, File, IndexType, TypeId};

use crate::items::{ItemId, Reloc};
use crate::{Assembler, DedupPasses, ItemContainer, Operand, TypeRef};

#[test]
fn emit_encodes_operands() {
    let mut asm = Assembler::new();
    asm.emit(Opcode::Ldai, &[Operand::Imm(-2)])
        .emit(Opcode::Sta, &[Operand::Reg(3)])
        .emit(Opcode::Jmp, &[Operand::Imm(-4)]);
    assert_eq!(asm.pc(), 5 + 2 + 3);

    let code = asm.finish(4, 1);
    assert_eq!(
        code.bytes,
        [0x04, 0xfe, 0xff, 0xff, 0xff, 0x03, 0x03, 0x07, 0xfc, 0xff]
    );
    assert!(code.relocs.is_empty());
    assert_eq!((code.num_vregs, code.num_args), (4, 1));
}

#[test]
fn id_operands_become_relocations() {
    let s = ItemId(7);
    let m = ItemId(9);
    let mut asm = Assembler::new();
    asm.emit(Opcode::Nop, &[])
        .emit(Opcode::LdaStr, &[Operand::Item(s)])
        .emit(
            Opcode::Call,
            &[
                Operand::Item(m),
                Operand::Reg(0),
                Operand::Reg(1),
                Operand::Reg(2),
                Operand::Reg(3),
            ],
        );
    let code = asm.finish(4, 0);

    assert_eq!(
        code.relocs,
        [
            Reloc {
                pos: 2,
                kind: IdKind::String,
                target: s,
            },
            Reloc {
                pos: 5,
                kind: IdKind::Method,
                target: m,
            },
        ]
    );
    assert_eq!(&code.bytes[1..4], [0x10, 0, 0]);
}

#[test]
#[should_panic(expected = "ldobj: operand 1")]
fn register_in_id_slot_panics() {
    Assembler::new().emit(Opcode::Ldobj, &[Operand::Reg(0), Operand::Reg(1)]);
}

#[test]
#[should_panic(expected = "mov: operand")]
fn wrong_arity_panics() {
    Assembler::new().emit(Opcode::Mov, &[Operand::Reg(0)]);
}

#[test]
fn patched_operands_resolve_through_region() {
    let mut c = ItemContainer::default();
    let main = c.get_or_create_class("Lapp/Main;");
    let point = c.get_or_create_class("Lapp/Point;");
    let x = c.get_or_create_field(point, "x", TypeRef::Primitive(TypeId::I32), 0);
    let void = c.get_or_create_proto(TypeRef::Primitive(TypeId::Void), &[]);
    let run = c.get_or_create_method(main, "run", void, 0);
    let hello = c.get_or_create_string("hello");

    let mut asm = Assembler::new();
    asm.emit(Opcode::Newobj, &[Operand::Reg(0), Operand::Item(point)])
        .emit(Opcode::Ldobj, &[Operand::Reg(0), Operand::Item(x)])
        .emit(Opcode::LdaStr, &[Operand::Item(hello)])
        .emit(Opcode::CallShort, &[Operand::Item(run), Operand::Reg(0), Operand::Reg(0)])
        .emit(Opcode::ReturnVoid, &[]);
    let code = c.create_code(asm.finish(1, 0));
    c.set_code(run, code);
    c.finalize(DedupPasses::ALL);

    let file = File::from_bytes("patch", c.write_to_vec().unwrap()).unwrap();
    let class = file.class(file.get_class_id("Lapp/Main;").unwrap()).unwrap();
    let method = &class.methods[0];
    let body = file.code(method.code.unwrap()).unwrap();

    let mut targets = Vec::new();
    for insn in Instructions::new(body.code) {
        let insn = insn.unwrap();
        let Some(id) = insn.id_operand() else {
            continue;
        };
        let kind = id.kind.index_type().unwrap();
        targets.push((kind, file.resolve_index(method.id, kind, id.value as u16).unwrap()));
    }

    let at = |id| EntityId(c.items().offset(id));
    assert_eq!(
        targets,
        [
            (IndexType::Class, at(point)),
            (IndexType::Field, at(x)),
            (IndexType::MethodStringLiteral, at(hello)),
            (IndexType::MethodStringLiteral, at(run)),
        ]
    );
}
