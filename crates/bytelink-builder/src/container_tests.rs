use std::panic::{AssertUnwindSafe, catch_unwind};

use bytelink_format::{
    CHECKSUMMED_START, EntityId, File, FormatError, TypeId, Version, check_header,
};

use crate::items::ScalarItem;
use crate::{Assembler, ContainerConfig, DedupPasses, ItemContainer, TypeRef};
use bytelink_format::isa::Opcode;

fn void() -> TypeRef {
    TypeRef::Primitive(TypeId::Void)
}

#[test]
fn strings_are_interned() {
    let mut c = ItemContainer::default();
    let a = c.get_or_create_string("hello");
    let b = c.get_or_create_string("hello");
    let other = c.get_or_create_string("world");
    assert_eq!(a, b);
    assert_ne!(a, other);
    assert_eq!(c.find_string("hello"), Some(a));
}

#[test]
fn scalars_are_keyed_by_bit_pattern() {
    let mut c = ItemContainer::default();
    let one = c.get_or_create_scalar(ScalarItem::I32(1));
    assert_eq!(c.get_or_create_scalar(ScalarItem::I32(1)), one);

    let pos = c.get_or_create_scalar(ScalarItem::F64(0.0));
    let neg = c.get_or_create_scalar(ScalarItem::F64(-0.0));
    assert_ne!(pos, neg);

    // Same bits, different kinds.
    let f = c.get_or_create_scalar(ScalarItem::F32(f32::from_bits(1)));
    assert_ne!(f, one);
}

#[test]
fn protos_are_interned_by_shorty_and_classes() {
    let mut c = ItemContainer::default();
    let a = c.get_or_create_class("LA;");
    let b = c.get_or_create_class("LB;");
    let i32_ = TypeRef::Primitive(TypeId::I32);

    let p1 = c.get_or_create_proto(void(), &[i32_, TypeRef::Class(a)]);
    let p2 = c.get_or_create_proto(void(), &[i32_, TypeRef::Class(a)]);
    let p3 = c.get_or_create_proto(void(), &[i32_, TypeRef::Class(b)]);
    let p4 = c.get_or_create_proto(TypeRef::Class(a), &[i32_, void()]);
    assert_eq!(p1, p2);
    assert_ne!(p1, p3);
    assert_ne!(p1, p4);
    assert_eq!(c.items().proto(p1).key.shorty_string(), "VIL");
}

#[test]
fn primitive_types_are_unique() {
    let mut c = ItemContainer::default();
    let a = c.get_or_create_primitive_type(TypeId::I64);
    assert_eq!(c.get_or_create_primitive_type(TypeId::I64), a);
    assert_eq!(c.type_ref(a), TypeRef::Primitive(TypeId::I64));
    assert!(!c.is_emitted(a));
}

#[test]
fn classes_and_foreign_classes_share_names() {
    let mut c = ItemContainer::default();
    let local = c.get_or_create_class("LA;");
    let foreign = c.get_or_create_foreign_class("LB;");
    assert_eq!(c.get_or_create_class("LA;"), local);
    assert_eq!(c.get_or_create_foreign_class("LB;"), foreign);
    assert_eq!(c.find_class("LB;"), Some(foreign));
    assert!(c.is_foreign(foreign));
    assert!(!c.is_foreign(local));
}

#[test]
#[should_panic(expected = "already exists as local")]
fn foreign_request_for_local_class_panics() {
    let mut c = ItemContainer::default();
    c.get_or_create_class("LA;");
    c.get_or_create_foreign_class("LA;");
}

#[test]
#[should_panic(expected = "already exists as foreign")]
fn local_request_for_foreign_class_panics() {
    let mut c = ItemContainer::default();
    c.get_or_create_foreign_class("LA;");
    c.get_or_create_class("LA;");
}

#[test]
fn members_are_keyed() {
    let mut c = ItemContainer::default();
    let cls = c.get_or_create_class("LA;");
    let p = c.get_or_create_proto(void(), &[]);
    let m = c.get_or_create_method(cls, "run", p, 1);
    assert_eq!(c.get_or_create_method(cls, "run", p, 1), m);
    assert_eq!(c.find_method(cls, "run", p), Some(m));

    let f = c.get_or_create_field(cls, "x", TypeRef::Primitive(TypeId::I32), 0);
    assert_eq!(
        c.get_or_create_field(cls, "x", TypeRef::Primitive(TypeId::I32), 0),
        f
    );
    assert_eq!(c.find_field(cls, "x"), Some(f));
    assert_eq!(c.items().class(cls).methods, [m]);
    assert_eq!(c.items().class(cls).fields, [f]);
}

/// Classes `C`, `B`, `A` created in that order.
fn cba() -> (ItemContainer, [crate::ItemId; 3]) {
    let mut c = ItemContainer::default();
    let ids = ["C", "B", "A"].map(|name| c.get_or_create_class(name));
    c.finalize(DedupPasses::ALL);
    (c, ids)
}

#[test]
fn get_class_id_returns_layout_offset() {
    let (c, [_, b, _]) = cba();
    let bytes = c.write_to_vec().unwrap();
    let file = File::from_bytes("cba", bytes).unwrap();

    let id = file.get_class_id("B").unwrap();
    assert_eq!(id, EntityId(c.items().offset(b)));
    assert_eq!(file.get_class_id("D"), None);

    let names: Vec<_> = file
        .class_ids()
        .map(|id| file.string_at(id).unwrap().to_string())
        .collect();
    assert_eq!(names, ["A", "B", "C"]);
}

#[test]
fn round_trip_preserves_header_and_class_map() {
    let mut c = ItemContainer::new(ContainerConfig::default().with_version(Version::MIN));
    let main = c.get_or_create_class("Lapp/Main;");
    let util = c.get_or_create_class("Lapp/Util;");
    let ext = c.get_or_create_foreign_class("Lstd/Object;");
    c.set_super_class(main, ext);
    c.set_source_file(main, "Main.src");
    let p = c.get_or_create_proto(void(), &[TypeRef::Class(util)]);
    c.get_or_create_method(main, "run", p, 0x1);
    c.finalize(DedupPasses::ALL);

    let bytes = c.write_to_vec().unwrap();
    let header = check_header(&bytes).unwrap();
    let file = File::from_bytes("rt", bytes.clone()).unwrap();

    assert_eq!(&bytes[..8], b"BLINK\0\0\0");
    assert_eq!(file.header().version, Version::MIN);
    assert_eq!(file.header().checksum, header.checksum);
    assert_eq!(file.header().num_classes, 3);

    for (name, id) in c.classes() {
        assert_eq!(
            file.get_class_id(name),
            Some(EntityId(c.items().offset(id))),
            "{name}"
        );
    }
    assert!(file.is_foreign(file.get_class_id("Lstd/Object;").unwrap()));

    let class = file.class(EntityId(c.items().offset(main))).unwrap();
    assert_eq!(class.name, "Lapp/Main;");
    assert_eq!(class.super_class, Some(EntityId(c.items().offset(ext))));
    assert_eq!(
        file.string_at(class.source_file.unwrap()).unwrap(),
        "Main.src"
    );
    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.size, c.items().size(main));
}

#[test]
fn write_to_file_matches_memory() {
    let (c, _) = cba();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.blk");
    c.write_to_file(&path).unwrap();

    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(on_disk, c.write_to_vec().unwrap());
    assert!(File::open(&path).is_ok());
}

#[test]
fn every_byte_flip_is_detected() {
    let (c, _) = cba();
    let bytes = c.write_to_vec().unwrap();
    assert!(check_header(&bytes).is_ok());

    for at in CHECKSUMMED_START..bytes.len() {
        let mut flipped = bytes.clone();
        flipped[at] ^= 0xff;
        assert!(check_header(&flipped).is_err(), "flip at {at}");
    }

    let mut tail = bytes.clone();
    let last = tail.len() - 1;
    tail[last] ^= 0x01;
    assert!(matches!(
        check_header(&tail),
        Err(FormatError::ChecksumMismatch { .. })
    ));
}

fn populated() -> ItemContainer {
    let mut c = ItemContainer::default();
    let cls = c.get_or_create_class("Lapp/Main;");
    let p = c.get_or_create_proto(TypeRef::Primitive(TypeId::I64), &[]);
    let m = c.get_or_create_method(cls, "answer", p, 0);
    let wide = c.get_or_create_scalar(ScalarItem::I64(42));
    let f = c.get_or_create_field(cls, "cached", TypeRef::Primitive(TypeId::I64), 0);
    c.set_field_value(f, wide);
    c.get_or_create_scalar(ScalarItem::I32(7));
    c.get_or_create_scalar(ScalarItem::F64(1.5));

    let mut asm = Assembler::new();
    asm.emit(Opcode::LdaiWide, &[crate::Operand::Imm(42)])
        .emit(Opcode::Return, &[]);
    let code = c.create_code(asm.finish(1, 0));
    c.set_code(m, code);
    c.get_or_create_string("odd");
    c.create_literal_array(vec![crate::items::Literal::I64(1)]);
    c.finalize(DedupPasses::ALL);
    c
}

#[test]
fn emitted_items_respect_alignment() {
    let c = populated();
    let mut count = 0;
    for id in c.emitted_items() {
        let align = c.items().alignment(id) as u32;
        assert_eq!(c.items().offset(id) % align, 0, "{id} at {}", c.items().offset(id));
        assert_ne!(c.items().offset(id), 0);
        count += 1;
    }
    assert!(count >= 7);
}

#[test]
fn offsets_increase_in_layout_order() {
    let c = populated();
    let offsets: Vec<u32> = c.emitted_items().map(|id| c.items().offset(id)).collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]), "{offsets:?}");
}

#[test]
fn field_value_reads_back() {
    let c = populated();
    let file = File::from_bytes("f", c.write_to_vec().unwrap()).unwrap();
    let class = file.get_class_id("Lapp/Main;").unwrap();
    let class = file.class(class).unwrap();
    let value = class.fields[0].value.unwrap();
    assert_eq!(file.scalar(value, true).unwrap().bits, 42);
    assert_eq!(value.0 % 8, 0);
}

#[test]
fn write_without_layout_panics() {
    let mut c = ItemContainer::default();
    c.get_or_create_class("LA;");
    let result = catch_unwind(AssertUnwindSafe(|| c.write_to_vec()));
    assert!(result.is_err());
}

#[test]
#[should_panic(expected = "patch_code")]
fn write_with_unpatched_code_panics() {
    let mut c = ItemContainer::default();
    let cls = c.get_or_create_class("LA;");
    let p = c.get_or_create_proto(void(), &[]);
    let m = c.get_or_create_method(cls, "m", p, 0);
    let s = c.get_or_create_string("s");
    let mut asm = Assembler::new();
    asm.emit(Opcode::LdaStr, &[crate::Operand::Item(s)]);
    let code = c.create_code(asm.finish(0, 0));
    c.set_code(m, code);
    c.compute_layout();
    let _ = c.write_to_vec();
}

#[test]
fn mutation_invalidates_layout() {
    let (mut c, _) = cba();
    assert!(c.layout().is_some());
    c.get_or_create_string("new");
    assert!(c.layout().is_none());
}

#[test]
fn replacing_code_drops_the_old_sharer() {
    let mut c = ItemContainer::default();
    let class = c.get_or_create_class("LA;");
    let proto = c.get_or_create_proto(void(), &[]);
    let method = c.get_or_create_method(class, "m", proto, 0);
    let first = c.create_code(crate::Assembler::new().finish(0, 0));
    let second = c.create_code(crate::Assembler::new().finish(0, 0));

    c.set_code(method, first);
    c.set_code(method, second);
    assert!(c.items().code(first).sharers.is_empty());
    assert_eq!(c.items().code(second).sharers, [method]);
    assert_eq!(c.items().method(method).code, Some(second));
}
