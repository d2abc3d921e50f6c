//! Entity accessors.
//!
//! Each accessor decodes one item at a known offset. Offsets inside the
//! decoded data stay raw [`EntityId`]s; 16-bit indexes stay raw and are
//! resolved with [`File::resolve_index`] from the referring item's offset.

use crate::FormatError;
use crate::constants::{lnp, tags};
use crate::ids::EntityId;
use crate::isa::Instructions;
use crate::types::{LiteralTag, TypeId, ValueTag};

use super::cursor::Cursor;
use super::{File, TypeRef};

fn optional(offset: u32) -> Option<EntityId> {
    (offset != 0).then_some(EntityId(offset))
}

#[derive(Clone, Debug)]
pub struct ClassData<'a> {
    pub id: EntityId,
    pub name: &'a str,
    pub super_class: Option<EntityId>,
    pub flags: u32,
    /// Class-kind region indexes.
    pub interfaces: Vec<u16>,
    pub source_lang: Option<u8>,
    pub annotations: Vec<EntityId>,
    pub source_file: Option<EntityId>,
    pub fields: Vec<FieldData>,
    pub methods: Vec<MethodData>,
    /// Bytes spanned by the class item including its members.
    pub size: usize,
}

#[derive(Clone, Debug)]
pub struct FieldData {
    pub id: EntityId,
    pub class_idx: u16,
    pub type_idx: u16,
    pub name: EntityId,
    pub flags: u32,
    /// Scalar item holding the initial value.
    pub value: Option<EntityId>,
    pub annotations: Vec<EntityId>,
}

#[derive(Clone, Debug)]
pub struct MethodData {
    pub id: EntityId,
    pub class_idx: u16,
    pub proto_idx: u16,
    pub name: EntityId,
    pub flags: u32,
    pub code: Option<EntityId>,
    pub source_lang: Option<u8>,
    pub annotations: Vec<EntityId>,
    pub debug_info: Option<EntityId>,
}

#[derive(Clone, Debug)]
pub struct ForeignMethodData {
    pub id: EntityId,
    pub class_idx: u16,
    pub proto_idx: u16,
    pub name: EntityId,
    pub flags: u32,
}

#[derive(Clone, Debug)]
pub struct ForeignFieldData {
    pub id: EntityId,
    pub class_idx: u16,
    pub type_idx: u16,
    pub name: EntityId,
}

/// Method prototype: shorty (return type first) plus one class index per
/// reference element.
#[derive(Clone, Debug)]
pub struct ProtoData {
    pub id: EntityId,
    pub shorty: Vec<TypeId>,
    pub ref_indexes: Vec<u16>,
}

impl ProtoData {
    /// Resolve every shorty element, return type first.
    pub fn types(&self, file: &File) -> Result<Vec<TypeRef>, FormatError> {
        let mut refs = self.ref_indexes.iter();
        self.shorty
            .iter()
            .map(|&ty| {
                if !ty.is_reference() {
                    return Ok(TypeRef::Primitive(ty));
                }
                let index = refs
                    .next()
                    .ok_or_else(|| FormatError::malformed(self.id.offset(), "proto"))?;
                file.resolve_type(self.id, *index)
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct CodeData<'a> {
    pub id: EntityId,
    pub num_vregs: u32,
    pub num_args: u32,
    pub code: &'a [u8],
}

impl<'a> CodeData<'a> {
    pub fn instructions(&self) -> Instructions<'a> {
        Instructions::new(self.code)
    }
}

#[derive(Clone, Debug)]
pub struct DebugInfoData {
    pub id: EntityId,
    pub line_start: u32,
    pub param_names: Vec<EntityId>,
    /// Position in the file-wide line program index.
    pub lnp_index: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LineOp {
    AdvancePc(u32),
    AdvanceLine(i32),
    SetFile(EntityId),
    SetColumn(u32),
}

#[derive(Clone, Debug)]
pub struct LineProgramData {
    pub id: EntityId,
    pub ops: Vec<LineOp>,
}

#[derive(Clone, Copy, Debug)]
pub struct AnnotationElement {
    pub name: EntityId,
    pub tag: ValueTag,
    /// Immediate value, or an offset for references, wide scalars and arrays.
    pub value: u32,
}

#[derive(Clone, Debug)]
pub struct AnnotationData {
    pub id: EntityId,
    pub class: EntityId,
    pub elements: Vec<AnnotationElement>,
}

#[derive(Clone, Debug)]
pub struct ArrayValueData {
    pub id: EntityId,
    pub tag: ValueTag,
    pub values: Vec<u64>,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LiteralValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    F64(f64),
    String(EntityId),
    Method(EntityId),
    Null,
}

#[derive(Clone, Debug)]
pub struct LiteralArrayData {
    pub id: EntityId,
    pub values: Vec<LiteralValue>,
}

#[derive(Clone, Copy, Debug)]
pub struct ScalarData {
    pub id: EntityId,
    pub bits: u64,
    pub wide: bool,
}

fn read_field(cur: &mut Cursor<'_>) -> Result<FieldData, FormatError> {
    let id = EntityId(cur.pos() as u32);
    let class_idx = cur.u16()?;
    let type_idx = cur.u16()?;
    let name = EntityId(cur.u32()?);
    let flags = cur.uleb_u32()?;
    let mut field = FieldData {
        id,
        class_idx,
        type_idx,
        name,
        flags,
        value: None,
        annotations: Vec::new(),
    };
    loop {
        match cur.u8()? {
            tags::END => break,
            tags::FIELD_VALUE => field.value = optional(cur.u32()?),
            tags::FIELD_ANNOTATION => field.annotations.push(EntityId(cur.u32()?)),
            _ => return Err(FormatError::malformed(cur.pos() - 1, "field tag")),
        }
    }
    Ok(field)
}

fn read_method(cur: &mut Cursor<'_>) -> Result<MethodData, FormatError> {
    let id = EntityId(cur.pos() as u32);
    let class_idx = cur.u16()?;
    let proto_idx = cur.u16()?;
    let name = EntityId(cur.u32()?);
    let flags = cur.uleb_u32()?;
    let mut method = MethodData {
        id,
        class_idx,
        proto_idx,
        name,
        flags,
        code: None,
        source_lang: None,
        annotations: Vec::new(),
        debug_info: None,
    };
    loop {
        match cur.u8()? {
            tags::END => break,
            tags::METHOD_CODE => method.code = optional(cur.u32()?),
            tags::METHOD_SOURCE_LANG => method.source_lang = Some(cur.u8()?),
            tags::METHOD_ANNOTATION => method.annotations.push(EntityId(cur.u32()?)),
            tags::METHOD_DEBUG_INFO => method.debug_info = optional(cur.u32()?),
            _ => return Err(FormatError::malformed(cur.pos() - 1, "method tag")),
        }
    }
    Ok(method)
}

impl File {
    /// Decode a class together with its inline fields and methods.
    pub fn class(&self, id: EntityId) -> Result<ClassData<'_>, FormatError> {
        if self.is_foreign(id) {
            return Err(FormatError::malformed(id.offset(), "class (foreign)"));
        }
        let mut cur = self.cursor(id, "class");
        let name = cur.string()?;
        let super_class = optional(cur.u32()?);
        let flags = cur.uleb_u32()?;
        let num_fields = cur.uleb()? as usize;
        let num_methods = cur.uleb()? as usize;

        let mut class = ClassData {
            id,
            name,
            super_class,
            flags,
            interfaces: Vec::new(),
            source_lang: None,
            annotations: Vec::new(),
            source_file: None,
            fields: Vec::with_capacity(num_fields),
            methods: Vec::with_capacity(num_methods),
            size: 0,
        };
        loop {
            match cur.u8()? {
                tags::END => break,
                tags::CLASS_INTERFACES => {
                    let count = cur.uleb()? as usize;
                    for _ in 0..count {
                        class.interfaces.push(cur.u16()?);
                    }
                }
                tags::CLASS_SOURCE_LANG => class.source_lang = Some(cur.u8()?),
                tags::CLASS_ANNOTATION => class.annotations.push(EntityId(cur.u32()?)),
                tags::CLASS_SOURCE_FILE => class.source_file = optional(cur.u32()?),
                _ => return Err(FormatError::malformed(cur.pos() - 1, "class tag")),
            }
        }
        for _ in 0..num_fields {
            class.fields.push(read_field(&mut cur)?);
        }
        for _ in 0..num_methods {
            class.methods.push(read_method(&mut cur)?);
        }
        class.size = cur.pos() - id.offset();
        Ok(class)
    }

    pub fn foreign_method(&self, id: EntityId) -> Result<ForeignMethodData, FormatError> {
        let mut cur = self.cursor(id, "foreign method");
        Ok(ForeignMethodData {
            id,
            class_idx: cur.u16()?,
            proto_idx: cur.u16()?,
            name: EntityId(cur.u32()?),
            flags: cur.uleb_u32()?,
        })
    }

    pub fn foreign_field(&self, id: EntityId) -> Result<ForeignFieldData, FormatError> {
        let mut cur = self.cursor(id, "foreign field");
        Ok(ForeignFieldData {
            id,
            class_idx: cur.u16()?,
            type_idx: cur.u16()?,
            name: EntityId(cur.u32()?),
        })
    }

    pub fn proto(&self, id: EntityId) -> Result<ProtoData, FormatError> {
        let mut cur = self.cursor(id, "proto");
        let mut shorty = Vec::new();
        'words: loop {
            let word = cur.u16()?;
            for shift in (0..16).step_by(4) {
                let nibble = ((word >> shift) & 0xf) as u8;
                if nibble == 0 {
                    break 'words;
                }
                let ty = TypeId::from_u8(nibble)
                    .ok_or_else(|| FormatError::malformed(id.offset(), "shorty"))?;
                shorty.push(ty);
            }
        }
        let num_refs = shorty.iter().filter(|t| t.is_reference()).count();
        let mut ref_indexes = Vec::with_capacity(num_refs);
        for _ in 0..num_refs {
            ref_indexes.push(cur.u16()?);
        }
        Ok(ProtoData {
            id,
            shorty,
            ref_indexes,
        })
    }

    pub fn code(&self, id: EntityId) -> Result<CodeData<'_>, FormatError> {
        let mut cur = self.cursor(id, "code");
        let num_vregs = cur.uleb_u32()?;
        let num_args = cur.uleb_u32()?;
        let len = cur.uleb()? as usize;
        Ok(CodeData {
            id,
            num_vregs,
            num_args,
            code: cur.take(len)?,
        })
    }

    pub fn debug_info(&self, id: EntityId) -> Result<DebugInfoData, FormatError> {
        let mut cur = self.cursor(id, "debug info");
        let line_start = cur.uleb_u32()?;
        let count = cur.uleb()? as usize;
        let mut param_names = Vec::with_capacity(count.min(256));
        for _ in 0..count {
            param_names.push(EntityId(cur.u32()?));
        }
        Ok(DebugInfoData {
            id,
            line_start,
            param_names,
            lnp_index: cur.u32()?,
        })
    }

    pub fn line_program(&self, id: EntityId) -> Result<LineProgramData, FormatError> {
        let mut cur = self.cursor(id, "line program");
        let mut ops = Vec::new();
        loop {
            let op = match cur.u8()? {
                lnp::END => break,
                lnp::ADVANCE_PC => LineOp::AdvancePc(cur.uleb_u32()?),
                lnp::ADVANCE_LINE => {
                    let at = cur.pos();
                    let delta = i32::try_from(cur.sleb()?)
                        .map_err(|_| FormatError::malformed(at, "line delta"))?;
                    LineOp::AdvanceLine(delta)
                }
                lnp::SET_FILE => LineOp::SetFile(EntityId(cur.u32()?)),
                lnp::SET_COLUMN => LineOp::SetColumn(cur.uleb_u32()?),
                _ => return Err(FormatError::malformed(cur.pos() - 1, "line opcode")),
            };
            ops.push(op);
        }
        Ok(LineProgramData { id, ops })
    }

    pub fn annotation(&self, id: EntityId) -> Result<AnnotationData, FormatError> {
        let mut cur = self.cursor(id, "annotation");
        let class = EntityId(cur.u32()?);
        let count = cur.u16()? as usize;
        let mut pairs = Vec::with_capacity(count);
        for _ in 0..count {
            pairs.push((EntityId(cur.u32()?), cur.u32()?));
        }
        let mut elements = Vec::with_capacity(count);
        for (name, value) in pairs {
            let at = cur.pos();
            let tag = ValueTag::from_byte(cur.u8()?)
                .ok_or_else(|| FormatError::malformed(at, "annotation tag"))?;
            elements.push(AnnotationElement { name, tag, value });
        }
        Ok(AnnotationData {
            id,
            class,
            elements,
        })
    }

    /// Decode an array value whose element type comes from the referring tag.
    pub fn array_value(&self, id: EntityId, tag: ValueTag) -> Result<ArrayValueData, FormatError> {
        let mut cur = self.cursor(id, "array value");
        let count = cur.uleb()? as usize;
        let wide = tag.width() == 8;
        let mut values = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            values.push(if wide {
                cur.u64()?
            } else {
                u64::from(cur.u32()?)
            });
        }
        Ok(ArrayValueData {
            id,
            tag: tag.element(),
            values,
        })
    }

    pub fn literal_array(&self, id: EntityId) -> Result<LiteralArrayData, FormatError> {
        let mut cur = self.cursor(id, "literal array");
        let count = cur.u32()? as usize;
        let mut values = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let at = cur.pos();
            let tag = LiteralTag::from_u8(cur.u8()?)
                .ok_or_else(|| FormatError::malformed(at, "literal tag"))?;
            values.push(match tag {
                LiteralTag::Bool => LiteralValue::Bool(cur.u8()? != 0),
                LiteralTag::I32 => LiteralValue::I32(cur.u32()? as i32),
                LiteralTag::I64 => LiteralValue::I64(cur.u64()? as i64),
                LiteralTag::F64 => LiteralValue::F64(f64::from_bits(cur.u64()?)),
                LiteralTag::String => LiteralValue::String(EntityId(cur.u32()?)),
                LiteralTag::Method => LiteralValue::Method(EntityId(cur.u32()?)),
                LiteralTag::Null => LiteralValue::Null,
            });
        }
        Ok(LiteralArrayData { id, values })
    }

    pub fn scalar(&self, id: EntityId, wide: bool) -> Result<ScalarData, FormatError> {
        let mut cur = self.cursor(id, "scalar");
        let bits = if wide {
            cur.u64()?
        } else {
            u64::from(cur.u32()?)
        };
        Ok(ScalarData { id, bits, wide })
    }
}
