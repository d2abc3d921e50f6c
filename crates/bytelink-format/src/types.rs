//! Type ids, annotation value tags and literal tags.

/// Primitive type ids. Also the nibble values of a shorty.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum TypeId {
    Void = 0x01,
    U1 = 0x02,
    I8 = 0x03,
    U8 = 0x04,
    I16 = 0x05,
    U16 = 0x06,
    I32 = 0x07,
    U32 = 0x08,
    F32 = 0x09,
    F64 = 0x0a,
    I64 = 0x0b,
    U64 = 0x0c,
    Reference = 0x0d,
    Tagged = 0x0e,
}

impl TypeId {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x01 => Self::Void,
            0x02 => Self::U1,
            0x03 => Self::I8,
            0x04 => Self::U8,
            0x05 => Self::I16,
            0x06 => Self::U16,
            0x07 => Self::I32,
            0x08 => Self::U32,
            0x09 => Self::F32,
            0x0a => Self::F64,
            0x0b => Self::I64,
            0x0c => Self::U64,
            0x0d => Self::Reference,
            0x0e => Self::Tagged,
            _ => return None,
        })
    }

    /// Single-letter descriptor; `L` for references.
    pub fn descriptor(self) -> char {
        match self {
            Self::Void => 'V',
            Self::U1 => 'Z',
            Self::I8 => 'B',
            Self::U8 => 'H',
            Self::I16 => 'S',
            Self::U16 => 'C',
            Self::I32 => 'I',
            Self::U32 => 'U',
            Self::F32 => 'F',
            Self::F64 => 'D',
            Self::I64 => 'J',
            Self::U64 => 'Q',
            Self::Reference => 'L',
            Self::Tagged => 'A',
        }
    }

    pub fn is_reference(self) -> bool {
        self == Self::Reference
    }
}

/// Tag of an annotation element value.
///
/// Scalars fit the element's `u32` value slot except `I64`/`F64`, which
/// point at a scalar item. Array tags point at an array value item.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ValueTag {
    I32,
    I64,
    F32,
    F64,
    String,
    Class,
    Method,
    I32Array,
    I64Array,
    F32Array,
    F64Array,
    StringArray,
    ClassArray,
    MethodArray,
}

impl ValueTag {
    pub fn to_byte(self) -> u8 {
        match self {
            Self::I32 => b'i',
            Self::I64 => b'l',
            Self::F32 => b'f',
            Self::F64 => b'd',
            Self::String => b's',
            Self::Class => b'c',
            Self::Method => b'm',
            Self::I32Array => b'I',
            Self::I64Array => b'L',
            Self::F32Array => b'F',
            Self::F64Array => b'D',
            Self::StringArray => b'S',
            Self::ClassArray => b'C',
            Self::MethodArray => b'M',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            b'i' => Self::I32,
            b'l' => Self::I64,
            b'f' => Self::F32,
            b'd' => Self::F64,
            b's' => Self::String,
            b'c' => Self::Class,
            b'm' => Self::Method,
            b'I' => Self::I32Array,
            b'L' => Self::I64Array,
            b'F' => Self::F32Array,
            b'D' => Self::F64Array,
            b'S' => Self::StringArray,
            b'C' => Self::ClassArray,
            b'M' => Self::MethodArray,
            _ => return None,
        })
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            Self::I32Array
                | Self::I64Array
                | Self::F32Array
                | Self::F64Array
                | Self::StringArray
                | Self::ClassArray
                | Self::MethodArray
        )
    }

    /// Element tag of an array tag; scalars map to themselves.
    pub fn element(self) -> Self {
        match self {
            Self::I32Array => Self::I32,
            Self::I64Array => Self::I64,
            Self::F32Array => Self::F32,
            Self::F64Array => Self::F64,
            Self::StringArray => Self::String,
            Self::ClassArray => Self::Class,
            Self::MethodArray => Self::Method,
            scalar => scalar,
        }
    }

    /// Whether the value is an entity offset rather than a number.
    pub fn is_reference(self) -> bool {
        matches!(self.element(), Self::String | Self::Class | Self::Method)
    }

    /// Width of one element in bytes.
    pub fn width(self) -> usize {
        match self.element() {
            Self::I64 | Self::F64 => 8,
            _ => 4,
        }
    }
}

/// Tag of one literal-array entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum LiteralTag {
    Bool = 0x01,
    I32 = 0x02,
    I64 = 0x03,
    F64 = 0x04,
    String = 0x05,
    Method = 0x06,
    Null = 0x07,
}

impl LiteralTag {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x01 => Self::Bool,
            0x02 => Self::I32,
            0x03 => Self::I64,
            0x04 => Self::F64,
            0x05 => Self::String,
            0x06 => Self::Method,
            0x07 => Self::Null,
            _ => return None,
        })
    }

    /// Payload width following the tag byte.
    pub fn payload_size(self) -> usize {
        match self {
            Self::Bool => 1,
            Self::I32 | Self::String | Self::Method => 4,
            Self::I64 | Self::F64 => 8,
            Self::Null => 0,
        }
    }
}
