use std::path::PathBuf;

use bytelink_format::{EntityId, File, FormatError, IndexType};

pub struct CheckArgs {
    pub files: Vec<PathBuf>,
}

pub fn run(args: CheckArgs) {
    let mut failed = false;
    for path in &args.files {
        let result = File::open(path).and_then(|file| verify(&file));
        if let Err(e) = result {
            eprintln!("error: {}: {}", path.display(), e);
            failed = true;
        }
    }

    if failed {
        std::process::exit(1);
    }
}

/// Walk every entity reachable from the class and literal-array indexes.
///
/// `File::open` only checks the header and checksum; this decodes class
/// bodies, code, debug info and annotations, and resolves every id operand.
pub fn verify(file: &File) -> Result<(), FormatError> {
    for class_id in file.class_ids() {
        file.string_at(class_id)?;
        if file.is_foreign(class_id) {
            continue;
        }
        let class = file.class(class_id)?;
        for &annotation in &class.annotations {
            file.annotation(annotation)?;
        }
        for field in &class.fields {
            file.resolve_type(field.id, field.type_idx)?;
            file.string_at(field.name)?;
        }
        for method in &class.methods {
            let proto = file.resolve_index(method.id, IndexType::Proto, method.proto_idx)?;
            file.proto(proto)?.types(file)?;
            file.string_at(method.name)?;
            if let Some(code) = method.code {
                verify_code(file, method.id, code)?;
            }
            if let Some(debug_info) = method.debug_info {
                let info = file.debug_info(debug_info)?;
                let program = file
                    .line_program_id(info.lnp_index)
                    .ok_or_else(|| malformed(debug_info, "line program index"))?;
                file.line_program(program)?;
            }
            for &annotation in &method.annotations {
                file.annotation(annotation)?;
            }
        }
    }

    for id in file.literal_array_ids() {
        file.literal_array(id)?;
    }
    for id in file.line_program_ids() {
        file.line_program(id)?;
    }
    Ok(())
}

/// Id operands index the region of the owning method.
fn verify_code(file: &File, method: EntityId, id: EntityId) -> Result<(), FormatError> {
    let code = file.code(id)?;
    for insn in code.instructions() {
        let Some(operand) = insn?.id_operand() else {
            continue;
        };
        match operand.kind.index_type() {
            Some(kind) => {
                let index = u16::try_from(operand.value)
                    .map_err(|_| malformed(id, "id operand"))?;
                file.resolve_index(method, kind, index)?;
            }
            None => {
                file.literal_array_id(operand.value)
                    .ok_or_else(|| malformed(id, "literal array index"))?;
            }
        }
    }
    Ok(())
}

fn malformed(at: EntityId, what: &'static str) -> FormatError {
    FormatError::Malformed {
        offset: at.offset(),
        what,
    }
}
