//! Descriptor demangling.
//!
//! Class names are stored mangled: `Lpkg/sub/Name;` for classes, a leading
//! `[` per array dimension, and one letter per primitive type. Diagnostics
//! never show the mangled form.

/// Readable name of a single-letter primitive descriptor.
fn primitive_name(c: char) -> Option<&'static str> {
    Some(match c {
        'V' => "void",
        'Z' => "u1",
        'B' => "i8",
        'H' => "u8",
        'S' => "i16",
        'C' => "u16",
        'I' => "i32",
        'U' => "u32",
        'F' => "f32",
        'D' => "f64",
        'J' => "i64",
        'Q' => "u64",
        'A' => "any",
        _ => return None,
    })
}

/// Whether `desc` has the `L...;` class shape.
pub fn is_class_descriptor(desc: &str) -> bool {
    desc.len() > 2 && desc.starts_with('L') && desc.ends_with(';')
}

/// Demangle a type descriptor.
///
/// Strings that are not valid descriptors are returned unchanged, so the
/// function is safe to call on arbitrary names.
///
/// ```
/// use bytelink_core::demangle_type;
/// assert_eq!(demangle_type("Lstd/core/Object;"), "std.core.Object");
/// assert_eq!(demangle_type("[[I"), "i32[][]");
/// assert_eq!(demangle_type("Main"), "Main");
/// ```
pub fn demangle_type(desc: &str) -> String {
    let dims = desc.chars().take_while(|&c| c == '[').count();
    let elem = &desc[dims..];

    let base = if is_class_descriptor(elem) {
        elem[1..elem.len() - 1].replace('/', ".")
    } else {
        let mut chars = elem.chars();
        match (chars.next().and_then(primitive_name), chars.next()) {
            (Some(name), None) => name.to_string(),
            _ => return desc.to_string(),
        }
    };

    let mut out = base;
    for _ in 0..dims {
        out.push_str("[]");
    }
    out
}

/// Render a method as `pkg.Cls::name(p0, p1): ret`.
pub fn demangle_method(class: &str, name: &str, params: &[&str], ret: &str) -> String {
    let params: Vec<String> = params.iter().map(|p| demangle_type(p)).collect();
    format!(
        "{}::{}({}): {}",
        demangle_type(class),
        name,
        params.join(", "),
        demangle_type(ret)
    )
}

/// Render a field as `pkg.Cls::name: ty`.
pub fn demangle_field(class: &str, name: &str, ty: &str) -> String {
    format!("{}::{}: {}", demangle_type(class), name, demangle_type(ty))
}
