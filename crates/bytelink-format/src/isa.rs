//! Instruction decoder.
//!
//! Every instruction is one opcode byte followed by fixed-width little-endian
//! operands. At most one operand per instruction is an entity id; the
//! linker relies on [`Instruction::id_operand`] to find it.

use crate::FormatError;
use crate::ids::IndexType;

/// Kind of entity an id operand refers to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum IdKind {
    String,
    Class,
    Field,
    Method,
    /// File-wide literal-array index, not a region index.
    LiteralArray,
}

impl IdKind {
    /// Encoded width in bytes.
    pub fn width(self) -> usize {
        match self {
            IdKind::LiteralArray => 4,
            _ => 2,
        }
    }

    /// Region table the operand indexes into, if any.
    pub fn index_type(self) -> Option<IndexType> {
        match self {
            IdKind::String | IdKind::Method => Some(IndexType::MethodStringLiteral),
            IdKind::Class => Some(IndexType::Class),
            IdKind::Field => Some(IndexType::Field),
            IdKind::LiteralArray => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OperandKind {
    Reg,
    Imm16,
    Imm32,
    Imm64,
    Id(IdKind),
}

impl OperandKind {
    pub fn width(self) -> usize {
        match self {
            OperandKind::Reg => 1,
            OperandKind::Imm16 => 2,
            OperandKind::Imm32 => 4,
            OperandKind::Imm64 => 8,
            OperandKind::Id(kind) => kind.width(),
        }
    }
}

use OperandKind::{Id, Imm16, Imm32, Imm64, Reg};

macro_rules! opcodes {
    ($($name:ident = $byte:literal, $mnemonic:literal, [$($operand:expr),*];)*) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        #[repr(u8)]
        pub enum Opcode {
            $($name = $byte,)*
        }

        impl Opcode {
            pub fn from_u8(byte: u8) -> Option<Self> {
                match byte {
                    $($byte => Some(Opcode::$name),)*
                    _ => None,
                }
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => $mnemonic,)*
                }
            }

            pub fn operands(self) -> &'static [OperandKind] {
                match self {
                    $(Opcode::$name => {
                        const OPERANDS: &[OperandKind] = &[$($operand),*];
                        OPERANDS
                    })*
                }
            }
        }
    };
}

opcodes! {
    Nop = 0x00, "nop", [];
    Mov = 0x01, "mov", [Reg, Reg];
    Lda = 0x02, "lda", [Reg];
    Sta = 0x03, "sta", [Reg];
    Ldai = 0x04, "ldai", [Imm32];
    LdaiWide = 0x05, "ldai.64", [Imm64];
    Add2 = 0x06, "add2", [Reg];
    Jmp = 0x07, "jmp", [Imm16];
    Jeqz = 0x08, "jeqz", [Imm16];
    Return = 0x09, "return", [];
    ReturnVoid = 0x0a, "return.void", [];
    Throw = 0x0b, "throw", [];
    LdaStr = 0x10, "lda.str", [Id(IdKind::String)];
    LdaType = 0x11, "lda.type", [Id(IdKind::Class)];
    LdaLit = 0x12, "lda.lit", [Id(IdKind::LiteralArray)];
    Ldobj = 0x13, "ldobj", [Reg, Id(IdKind::Field)];
    Stobj = 0x14, "stobj", [Reg, Id(IdKind::Field)];
    Newobj = 0x15, "newobj", [Reg, Id(IdKind::Class)];
    CallShort = 0x16, "call.short", [Id(IdKind::Method), Reg, Reg];
    Call = 0x17, "call", [Id(IdKind::Method), Reg, Reg, Reg, Reg];
}

impl Opcode {
    /// Encoded size including the opcode byte.
    pub fn size(self) -> usize {
        1 + self.operands().iter().map(|k| k.width()).sum::<usize>()
    }

    /// The id operand kind, if the opcode embeds one.
    pub fn id_kind(self) -> Option<IdKind> {
        self.operands().iter().find_map(|k| match k {
            OperandKind::Id(kind) => Some(*kind),
            _ => None,
        })
    }
}

/// Position and raw value of an id operand.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct IdOperand {
    /// Byte position relative to the start of the code buffer.
    pub pos: usize,
    pub kind: IdKind,
    pub value: u32,
}

/// One decoded instruction borrowing its bytes from the code buffer.
#[derive(Clone, Copy, Debug)]
pub struct Instruction<'a> {
    pub pc: usize,
    pub opcode: Opcode,
    bytes: &'a [u8],
}

impl<'a> Instruction<'a> {
    pub fn decode(code: &'a [u8], pc: usize) -> Result<Self, FormatError> {
        let byte = *code.get(pc).ok_or(FormatError::Decode { pc, opcode: 0 })?;
        let opcode = Opcode::from_u8(byte).ok_or(FormatError::Decode { pc, opcode: byte })?;
        let end = pc + opcode.size();
        if end > code.len() {
            return Err(FormatError::Decode { pc, opcode: byte });
        }
        Ok(Self {
            pc,
            opcode,
            bytes: &code[pc..end],
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Operands with their kinds, zero-extended to `u64`.
    pub fn operands(&self) -> impl Iterator<Item = (OperandKind, u64)> + '_ {
        let mut at = 1;
        self.opcode.operands().iter().map(move |&kind| {
            let value = read_le(&self.bytes[at..at + kind.width()]);
            at += kind.width();
            (kind, value)
        })
    }

    pub fn id_operand(&self) -> Option<IdOperand> {
        let mut at = 1;
        for &kind in self.opcode.operands() {
            if let OperandKind::Id(id) = kind {
                let value = read_le(&self.bytes[at..at + id.width()]) as u32;
                return Some(IdOperand {
                    pos: self.pc + at,
                    kind: id,
                    value,
                });
            }
            at += kind.width();
        }
        None
    }
}

fn read_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Iterator over the instructions of a code buffer.
///
/// Stops after the first decode error.
pub struct Instructions<'a> {
    code: &'a [u8],
    pc: usize,
    failed: bool,
}

impl<'a> Instructions<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        Self {
            code,
            pc: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, FormatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pc >= self.code.len() {
            return None;
        }
        match Instruction::decode(self.code, self.pc) {
            Ok(insn) => {
                self.pc += insn.size();
                Some(Ok(insn))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Append an encoded instruction to `out`.
///
/// Operand values are truncated to their encoded width.
pub fn encode(opcode: Opcode, operands: &[u64], out: &mut Vec<u8>) {
    let kinds = opcode.operands();
    assert_eq!(
        kinds.len(),
        operands.len(),
        "{} takes {} operands",
        opcode.mnemonic(),
        kinds.len()
    );
    out.push(opcode as u8);
    for (kind, value) in kinds.iter().zip(operands) {
        out.extend_from_slice(&value.to_le_bytes()[..kind.width()]);
    }
}

/// Overwrite the id operand at `pos` with `value`.
pub fn patch_id(code: &mut [u8], pos: usize, kind: IdKind, value: u32) {
    let width = kind.width();
    code[pos..pos + width].copy_from_slice(&value.to_le_bytes()[..width]);
}
