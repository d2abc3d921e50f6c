//! Entity ids and index kinds.

use std::fmt;

/// Offset of an entity inside a container.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(transparent)]
pub struct EntityId(pub u32);

impl EntityId {
    #[inline]
    pub fn offset(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// Kinds of small-integer index.
///
/// The first four live in the per-region tables and are referenced through
/// 16-bit operands. Line number programs use a single file-wide table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum IndexType {
    Class,
    MethodStringLiteral,
    Field,
    Proto,
    LineNumberProgram,
}

impl IndexType {
    /// Kinds stored in region headers, in on-disk order.
    pub const REGION_KINDS: [IndexType; 4] = [
        IndexType::Class,
        IndexType::MethodStringLiteral,
        IndexType::Field,
        IndexType::Proto,
    ];

    /// Position of this kind inside a region header, if it has one.
    pub fn region_slot(self) -> Option<usize> {
        match self {
            IndexType::Class => Some(0),
            IndexType::MethodStringLiteral => Some(1),
            IndexType::Field => Some(2),
            IndexType::Proto => Some(3),
            IndexType::LineNumberProgram => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IndexType::Class => "class",
            IndexType::MethodStringLiteral => "method",
            IndexType::Field => "field",
            IndexType::Proto => "proto",
            IndexType::LineNumberProgram => "lnp",
        }
    }
}
