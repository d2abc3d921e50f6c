use bytelink_core::Colors;
use bytelink_format::isa::Opcode;
use bytelink_format::{File, TypeId};

use crate::{Assembler, DedupPasses, ItemContainer, Operand, TypeRef};

fn dump(container: &ItemContainer) -> String {
    let bytes = container.write_to_vec().unwrap();
    let file = File::from_bytes("dump", bytes).unwrap();
    let out = bytelink_format::dump(&file, Colors::OFF).unwrap();
    out.lines()
        .map(|line| {
            if line.starts_with("checksum = ") {
                "checksum = <redacted>"
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn dump_single_class() {
    let mut c = ItemContainer::default();
    let main = c.get_or_create_class("Lapp/Main;");
    let void = c.get_or_create_proto(TypeRef::Primitive(TypeId::Void), &[]);
    let run = c.get_or_create_method(main, "run", void, 0);
    c.get_or_create_field(main, "count", TypeRef::Primitive(TypeId::I32), 0);
    let hi = c.get_or_create_string("hi");

    let mut asm = Assembler::new();
    asm.emit(Opcode::LdaStr, &[Operand::Item(hi)])
        .emit(Opcode::ReturnVoid, &[]);
    let code = c.create_code(asm.finish(1, 0));
    c.set_code(run, code);
    c.finalize(DedupPasses::ALL);

    insta::assert_snapshot!(dump(&c), @r#"
    [header]
    version = 0.1.2.0
    size = 192
    checksum = <redacted>
    foreign = 0x0078..0x0078
    classes = 1
    literal_arrays = 0
    line_programs = 0

    [regions]
    R0 0x0078..0x00a8 class=2 method=1 field=0 proto=1

    [classes]
    0x0078 app.Main
      0x008c field app.Main::count: i32
      0x0096 method app.Main::run(): void
        ; vregs=1 args=0 size=4
        0000  lda.str "hi"
        0003  return.void

    [literals]
    "#);
}

#[test]
fn dump_foreign_calls_and_literals() {
    let mut c = ItemContainer::default();
    let main = c.get_or_create_class("Lapp/Main;");
    let printer = c.get_or_create_foreign_class("Lstd/Printer;");
    let void = c.get_or_create_proto(TypeRef::Primitive(TypeId::Void), &[]);
    let print = c.get_or_create_foreign_method(printer, "print", void, 0);
    let run = c.get_or_create_method(main, "run", void, 0);
    let lit = c.create_literal_array(vec![
        crate::items::Literal::I32(3),
        crate::items::Literal::Bool(true),
    ]);

    let mut asm = Assembler::new();
    asm.emit(Opcode::LdaLit, &[Operand::Item(lit)])
        .emit(Opcode::CallShort, &[Operand::Item(print), Operand::Reg(0), Operand::Reg(1)])
        .emit(Opcode::ReturnVoid, &[]);
    let code = c.create_code(asm.finish(2, 0));
    c.set_code(run, code);
    c.finalize(DedupPasses::ALL);

    let out = dump(&c);
    assert!(out.contains("foreign std.Printer"), "{out}");
    assert!(out.contains("lda.lit L0"), "{out}");
    assert!(out.contains("call.short std.Printer::print(): void, v0, v1"), "{out}");
    assert!(out.contains("L0 "), "{out}");
    assert!(out.ends_with("[3, true]"), "{out}");
}
