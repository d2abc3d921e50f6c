#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Binary container format for bytelink.
//!
//! This crate contains:
//! - Format definitions (constants, [`Header`], [`IndexHeader`], item tags)
//! - The [`Writer`] byte sink with the two-phase checksum protocol
//! - The read side: [`check_header`], [`File`] and the entity accessors in [`file`]
//! - A read-only instruction decoder ([`isa`])
//! - A human-readable [`dump`]

pub mod constants;
pub mod dump;
mod error;
pub mod file;
mod header;
mod ids;
pub mod isa;
pub mod leb128;
pub mod types;
pub mod writer;

#[cfg(test)]
mod header_tests;
#[cfg(test)]
mod leb128_tests;

pub use constants::{
    CHECKSUM_OFFSET, CHECKSUMMED_START, HEADER_SIZE, INDEX_ENTRY_SIZE, INDEX_HEADER_SIZE, MAGIC,
    MAX_INDEX_16,
};
pub use dump::dump;
pub use error::FormatError;
pub use file::{File, TypeRef, check_header};
pub use header::{Header, IndexHeader, Version};
pub use ids::{EntityId, IndexType};
pub use types::{LiteralTag, TypeId, ValueTag};
pub use writer::{FileWriter, MemoryWriter, Writer, align_up};
