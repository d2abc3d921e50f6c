use bytelink_format::isa::Opcode;
use bytelink_format::{EntityId, File, HEADER_SIZE, IndexType, TypeId};

use crate::items::{ItemId, ItemType};
use crate::{Assembler, ContainerConfig, DedupPasses, ItemContainer, Operand, TypeRef};

fn void() -> TypeRef {
    TypeRef::Primitive(TypeId::Void)
}

/// `count` classes, each with a method loading its own string.
fn classes_with_strings(config: ContainerConfig, count: usize) -> ItemContainer {
    let mut c = ItemContainer::new(config);
    let proto = c.get_or_create_proto(void(), &[]);
    for i in 0..count {
        let class = c.get_or_create_class(&format!("Lapp/C{i};"));
        let method = c.get_or_create_method(class, "get", proto, 0);
        let s = c.get_or_create_string(&format!("s{i}"));
        let mut asm = Assembler::new();
        asm.emit(Opcode::LdaStr, &[Operand::Item(s)])
            .emit(Opcode::Return, &[]);
        let code = c.create_code(asm.finish(0, 0));
        c.set_code(method, code);
    }
    c.finalize(DedupPasses::ALL);
    c
}

#[test]
fn sections_follow_header() {
    let c = classes_with_strings(ContainerConfig::default(), 2);
    let layout = c.layout().unwrap();
    assert_eq!(layout.class_idx_off as usize, HEADER_SIZE);
    assert_eq!(layout.literal_idx_off, layout.class_idx_off + 8);
    assert_eq!(layout.index_section_off, layout.literal_idx_off);
    assert_eq!(layout.foreign_size, 0);
    assert_eq!(layout.lnp_idx_off % 4, 0);
    assert_eq!(layout.file_size(), layout.lnp_idx_off);
    assert_eq!(layout.regions().len(), 1);

    let first = c.emitted_items().next().unwrap();
    assert_eq!(c.items().offset(first), layout.foreign_off);
}

#[test]
fn small_capacity_splits_regions() {
    let config = ContainerConfig::default().with_index_capacity(2);
    let c = classes_with_strings(config, 5);
    let layout = c.layout().unwrap();
    assert!(layout.regions().len() > 1);

    for header in layout.regions().headers() {
        assert!(header.table_sizes().iter().all(|&n| n <= 2));
    }

    let file = File::from_bytes("regions", c.write_to_vec().unwrap()).unwrap();
    assert_eq!(file.regions().len(), layout.regions().len());
    for i in 0..5 {
        let class = file.get_class_id(&format!("Lapp/C{i};")).unwrap();
        let class = file.class(class).unwrap();
        let method = &class.methods[0];
        let code = file.code(method.code.unwrap()).unwrap();
        let insn = code.instructions().next().unwrap().unwrap();
        let operand = insn.id_operand().unwrap();
        let s = file
            .resolve_index(method.id, IndexType::MethodStringLiteral, operand.value as u16)
            .unwrap();
        assert_eq!(file.string_at(s).unwrap(), format!("s{i}"));
    }
}

#[test]
fn regions_cover_their_referrers() {
    let config = ContainerConfig::default().with_index_capacity(2);
    let c = classes_with_strings(config, 4);
    let layout = c.layout().unwrap();
    let headers = layout.regions().headers();
    for (i, header) in headers.iter().enumerate() {
        for &referrer in header.referrers() {
            let off = c.items().offset(referrer);
            assert!(header.start <= off && off < header.end);
            assert_eq!(layout.region_of(referrer), Some(i));
        }
    }
    assert!(headers.windows(2).all(|w| w[0].end <= w[1].start));
}

#[test]
fn class_table_stores_primitive_ids() {
    let mut c = ItemContainer::default();
    let class = c.get_or_create_class("LA;");
    c.get_or_create_field(class, "b", TypeRef::Class(class), 0);
    c.get_or_create_field(class, "a", TypeRef::Primitive(TypeId::F64), 0);
    c.finalize(DedupPasses::ALL);

    let file = File::from_bytes("prims", c.write_to_vec().unwrap()).unwrap();
    let region = &file.regions()[0];
    assert_eq!(region.tables[0].0, 2);

    let fields = file.class(file.get_class_id("LA;").unwrap()).unwrap().fields;
    let ty = file.resolve_type(fields[1].id, fields[1].type_idx).unwrap();
    assert_eq!(ty, bytelink_format::TypeRef::Primitive(TypeId::F64));
    assert_eq!(fields[1].type_idx, 0);
    let ty = file.resolve_type(fields[0].id, fields[0].type_idx).unwrap();
    assert_eq!(
        ty,
        bytelink_format::TypeRef::Class(EntityId(c.items().offset(class)))
    );
}

#[test]
fn relocate_hot_items_moves_classes_then_strings() {
    let mut c = ItemContainer::default();
    let proto = c.get_or_create_proto(void(), &[]);
    let s1 = c.get_or_create_string("one");
    let a = c.get_or_create_class("LA;");
    let lit = c.create_literal_array(Vec::new());
    let s2 = c.get_or_create_string("two");
    let b = c.get_or_create_class("LB;");

    c.relocate_hot_items();
    assert_eq!(c.order(), [a, b, s1, s2, proto, lit]);
    assert!(c.layout().is_none());
}

#[test]
fn relocate_hot_items_keeps_profile_order_within_groups() {
    let mut c = ItemContainer::default();
    let s1 = c.get_or_create_string("one");
    let a = c.get_or_create_class("LA;");
    let s2 = c.get_or_create_string("two");
    let b = c.get_or_create_class("LB;");

    let profile = crate::Profile {
        classes: vec!["LB;".to_string()],
        strings: vec!["two".to_string()],
        ..crate::Profile::default()
    };
    c.apply_profile(&profile);
    c.relocate_hot_items();
    assert_eq!(c.order(), [b, a, s2, s1]);
}

#[test]
fn literal_index_follows_layout_order() {
    let mut c = ItemContainer::default();
    let first = c.create_literal_array(vec![crate::items::Literal::Null]);
    let second = c.create_literal_array(vec![crate::items::Literal::I32(1)]);
    c.compute_layout();

    let layout = c.layout().unwrap();
    assert_eq!(layout.literal_index_of(first), Some(0));
    assert_eq!(layout.literal_index_of(second), Some(1));
    assert_eq!(layout.literal_index_of(ItemId(99)), None);

    let file = File::from_bytes("lits", c.write_to_vec().unwrap()).unwrap();
    assert_eq!(
        file.literal_array_id(1),
        Some(EntityId(c.items().offset(second)))
    );
}

#[test]
fn primitive_types_take_no_space() {
    let mut c = ItemContainer::default();
    let p = c.get_or_create_primitive_type(TypeId::I8);
    c.compute_layout();
    assert_eq!(c.items().item_type(p), ItemType::PrimitiveType);
    assert!(!c.items().needs_emit(p));
    assert!(!c.is_emitted(p));
    assert_eq!(c.emitted_items().count(), 0);
    assert_eq!(c.layout().unwrap().file_size() as usize, HEADER_SIZE);
}

#[test]
fn extra_index_dependency_lands_in_method_region() {
    let mut c = ItemContainer::default();
    let main = c.get_or_create_class("Lapp/Main;");
    let other = c.get_or_create_foreign_class("Lapp/Other;");
    let proto = c.get_or_create_proto(void(), &[]);
    let run = c.get_or_create_method(main, "run", proto, 0);
    c.compute_layout();
    assert_eq!(c.region_index(run, IndexType::Class, other), None);

    c.add_index_dependency(run, crate::IndexDep::class(other));
    assert!(c.layout().is_none());
    c.compute_layout();
    assert!(c.region_index(run, IndexType::Class, other).is_some());
}
