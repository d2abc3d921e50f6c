use bytelink_format::isa::Opcode;
use bytelink_format::{File, TypeId, ValueTag};

use crate::items::{
    AnnotationElement, ArrayElement, ElementValue, ItemId, LineProgramBuilder, LnpOp,
};
use crate::{
    Assembler, ContainerConfig, DedupPasses, DedupStats, ItemContainer, ItemDeduper, Operand,
    TypeRef,
};

fn void() -> TypeRef {
    TypeRef::Primitive(TypeId::Void)
}

/// Class `name` with methods `a` and `b`, both returning void.
fn two_methods(c: &mut ItemContainer, name: &str) -> (ItemId, ItemId) {
    let class = c.get_or_create_class(name);
    let proto = c.get_or_create_proto(void(), &[]);
    let a = c.get_or_create_method(class, "a", proto, 0);
    let b = c.get_or_create_method(class, "b", proto, 0);
    (a, b)
}

fn line_program(c: &mut ItemContainer) -> ItemId {
    let file = c.get_or_create_string("Main.src");
    let ops = LineProgramBuilder::new(10)
        .set_file(file)
        .row(0, 10)
        .row(3, 12)
        .finish();
    c.create_line_program(ops)
}

#[test]
fn identical_debug_info_is_shared() {
    let mut c = ItemContainer::default();
    let (a, b) = two_methods(&mut c, "LMain;");
    let lnp_a = line_program(&mut c);
    let lnp_b = line_program(&mut c);
    let debug_a = c.create_debug_info(10, Vec::new(), lnp_a);
    let debug_b = c.create_debug_info(10, Vec::new(), lnp_b);
    c.set_debug_info(a, debug_a);
    c.set_debug_info(b, debug_b);

    c.compute_layout();
    c.patch_code();
    let stats = c.deduplicate_items(DedupPasses::ALL);
    assert_eq!(
        stats,
        DedupStats {
            debug_info: 1,
            line_programs: 1,
            ..DedupStats::default()
        }
    );

    assert_eq!(c.items().method(b).debug_info, Some(debug_a));
    assert!(!c.is_emitted(debug_b));
    assert!(!c.is_emitted(lnp_b));
    assert_eq!(c.items().line_program(lnp_a).ref_count, 1);

    c.compute_layout();
    assert_eq!(c.layout().unwrap().line_programs(), [lnp_a]);

    let file = File::from_bytes("dbg", c.write_to_vec().unwrap()).unwrap();
    assert_eq!(file.header().num_lnps, 1);
    let class = file.class(file.get_class_id("LMain;").unwrap()).unwrap();
    assert_eq!(class.methods[0].debug_info, class.methods[1].debug_info);
    let debug = file.debug_info(class.methods[0].debug_info.unwrap()).unwrap();
    assert_eq!(debug.lnp_index, 0);
    let program = file.line_program(file.line_program_id(0).unwrap()).unwrap();
    assert_eq!(program.ops.len(), 3);
}

#[test]
fn debug_info_with_different_lines_keeps_shared_program() {
    let mut c = ItemContainer::default();
    let (a, b) = two_methods(&mut c, "LMain;");
    let lnp_a = line_program(&mut c);
    let lnp_b = line_program(&mut c);
    let debug_a = c.create_debug_info(10, Vec::new(), lnp_a);
    let debug_b = c.create_debug_info(20, Vec::new(), lnp_b);
    c.set_debug_info(a, debug_a);
    c.set_debug_info(b, debug_b);

    c.finalize(DedupPasses::ALL);

    assert!(c.is_emitted(debug_a) && c.is_emitted(debug_b));
    assert_eq!(c.items().debug_info(debug_b).program, lnp_a);
    assert_eq!(c.items().line_program(lnp_a).ref_count, 2);
    assert!(!c.is_emitted(lnp_b));
}

#[test]
fn line_program_ops_reflect_rows() {
    let ops = LineProgramBuilder::new(5).row(0, 5).row(4, 4).row(4, 9).finish();
    assert_eq!(
        ops,
        [
            LnpOp::AdvancePc(4),
            LnpOp::AdvanceLine(-1),
            LnpOp::AdvanceLine(5),
        ]
    );
}

fn return_string(c: &mut ItemContainer, s: ItemId) -> ItemId {
    let mut asm = Assembler::new();
    asm.emit(Opcode::LdaStr, &[Operand::Item(s)])
        .emit(Opcode::Return, &[]);
    c.create_code(asm.finish(0, 0))
}

#[test]
fn identical_code_is_shared_within_region() {
    let mut c = ItemContainer::default();
    let (a, b) = two_methods(&mut c, "LMain;");
    let s = c.get_or_create_string("same");
    let code_a = return_string(&mut c, s);
    let code_b = return_string(&mut c, s);
    c.set_code(a, code_a);
    c.set_code(b, code_b);

    c.finalize(DedupPasses::ALL);

    assert_eq!(c.items().method(b).code, Some(code_a));
    assert_eq!(c.items().code(code_a).sharers, [a, b]);
    assert!(c.items().code(code_b).sharers.is_empty());
    assert!(!c.is_emitted(code_b));

    let file = File::from_bytes("code", c.write_to_vec().unwrap()).unwrap();
    let class = file.class(file.get_class_id("LMain;").unwrap()).unwrap();
    assert_eq!(class.methods[0].code, class.methods[1].code);
}

#[test]
fn code_is_not_shared_across_regions() {
    let config = ContainerConfig::default().with_index_capacity(1);
    let mut c = ItemContainer::new(config);
    let proto = c.get_or_create_proto(void(), &[]);

    let mut methods = Vec::new();
    for (class, s) in [("LA;", "x"), ("LB;", "y")] {
        let class = c.get_or_create_class(class);
        let method = c.get_or_create_method(class, "m", proto, 0);
        let s = c.get_or_create_string(s);
        let code = return_string(&mut c, s);
        c.set_code(method, code);
        methods.push((method, code));
    }

    c.finalize(DedupPasses::ALL);
    let [(ma, code_a), (mb, code_b)] = methods[..] else {
        unreachable!()
    };

    let layout = c.layout().unwrap();
    assert_ne!(layout.region_of(ma), layout.region_of(mb));
    // Both patch to index 0 of their own region.
    assert_eq!(c.items().code(code_a).bytes, c.items().code(code_b).bytes);
    assert!(c.is_emitted(code_a) && c.is_emitted(code_b));
}

#[test]
#[should_panic(expected = "shared by methods in regions")]
fn code_set_on_methods_in_different_regions_panics() {
    let config = ContainerConfig::default().with_index_capacity(2);
    let mut c = ItemContainer::new(config);
    let proto = c.get_or_create_proto(void(), &[]);
    let s = c.get_or_create_string("x");
    let code = return_string(&mut c, s);
    for (class, extra) in [("LA;", "y"), ("LB;", "z")] {
        let class = c.get_or_create_class(class);
        let method = c.get_or_create_method(class, "m", proto, 0);
        // A second string per method fills its string table.
        let extra = c.get_or_create_string(extra);
        c.add_index_dependency(method, crate::IndexDep::method_string(extra));
        c.set_code(method, code);
    }

    c.compute_layout();
    c.patch_code();
}

#[test]
fn disabled_passes_keep_duplicates() {
    let mut c = ItemContainer::default();
    let (a, b) = two_methods(&mut c, "LMain;");
    let s = c.get_or_create_string("same");
    let code_a = return_string(&mut c, s);
    let code_b = return_string(&mut c, s);
    c.set_code(a, code_a);
    c.set_code(b, code_b);

    c.finalize(DedupPasses {
        code: false,
        ..DedupPasses::ALL
    });
    assert!(c.is_emitted(code_b));

    c.finalize(DedupPasses::NONE);
    assert!(c.is_emitted(code_b));
}

#[test]
fn equal_annotations_and_arrays_collapse() {
    let mut c = ItemContainer::default();
    let (a, b) = two_methods(&mut c, "LMain;");
    let ann_class = c.get_or_create_foreign_class("Lstd/Tag;");
    let name = c.get_or_create_string("values");

    let mut annotations = Vec::new();
    let mut arrays = Vec::new();
    for owner in [a, b] {
        let array = c.create_array_value(
            ValueTag::I32Array,
            vec![ArrayElement::Immediate(1), ArrayElement::Immediate(2)],
        );
        let ann = c.create_annotation(
            ann_class,
            vec![AnnotationElement {
                name,
                tag: ValueTag::I32Array,
                value: ElementValue::Item(array),
            }],
        );
        c.add_annotation(owner, ann);
        annotations.push(ann);
        arrays.push(array);
    }

    c.compute_layout();
    c.patch_code();
    let stats = c.deduplicate_items(DedupPasses::ALL);
    assert_eq!((stats.annotations, stats.array_values), (1, 1));

    assert_eq!(c.items().method(b).annotations, [annotations[0]]);
    assert!(!c.is_emitted(annotations[1]));
    assert!(!c.is_emitted(arrays[1]));
    assert_eq!(
        c.items().annotation(annotations[0]).elements[0].value,
        ElementValue::Item(arrays[0])
    );
}

#[test]
fn deduper_memoizes_redirects() {
    let mut c = ItemContainer::default();
    let (a, b) = two_methods(&mut c, "LMain;");
    let s = c.get_or_create_string("same");
    let code_a = return_string(&mut c, s);
    let code_b = return_string(&mut c, s);
    c.set_code(a, code_a);
    c.set_code(b, code_b);
    c.compute_layout();
    c.patch_code();

    let mut deduper = ItemDeduper::new();
    assert_eq!(deduper.deduplicate(&c, code_a, Some(0)), code_a);
    assert_eq!(deduper.deduplicate(&c, code_b, Some(0)), code_a);
    assert_eq!(deduper.lookup(code_b), Some(code_a));
    assert_eq!(deduper.deduplicate(&c, code_b, Some(1)), code_a);
}

#[test]
#[should_panic(expected = "already suppressed")]
fn deduplicating_suppressed_item_panics() {
    let mut c = ItemContainer::default();
    let s = c.get_or_create_string("gone");
    c.compute_layout();
    c.items.base_mut(s).needs_emit = false;

    ItemDeduper::new().deduplicate(&c, s, None);
}

fn laid_out_bytes(c: &mut ItemContainer) -> Vec<u8> {
    c.compute_layout();
    c.patch_code();
    c.write_to_vec().unwrap()
}

#[test]
fn second_dedup_run_changes_nothing() {
    let mut c = ItemContainer::default();
    let (a, b) = two_methods(&mut c, "LMain;");
    for method in [a, b] {
        let program = line_program(&mut c);
        let debug = c.create_debug_info(10, Vec::new(), program);
        c.set_debug_info(method, debug);
    }

    c.compute_layout();
    c.patch_code();
    assert_eq!(c.deduplicate_items(DedupPasses::ALL).debug_info, 1);
    let debug = c.items().method(a).debug_info.unwrap();
    let program = c.items().debug_info(debug).program;
    let before = laid_out_bytes(&mut c);

    assert_eq!(c.deduplicate_items(DedupPasses::ALL), DedupStats::default());
    assert_eq!(c.items().line_program(program).ref_count, 1);
    assert_eq!(laid_out_bytes(&mut c), before);
}
