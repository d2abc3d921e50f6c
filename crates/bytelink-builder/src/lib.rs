#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Item container for bytelink files.
//!
//! An [`ItemContainer`] owns the items of one compiled unit. It interns
//! strings, scalars, prototypes and classes, orders items, groups index
//! dependencies into fixed-capacity regions ([`index`]), deduplicates
//! byte-identical items ([`dedup`]), assigns offsets and writes the file
//! with its checksum.
//!
//! Typical pipeline:
//!
//! ```
//! use bytelink_builder::{DedupPasses, ItemContainer};
//!
//! let mut container = ItemContainer::default();
//! container.get_or_create_class("LMain;");
//! container.finalize(DedupPasses::ALL);
//! let bytes = container.write_to_vec().unwrap();
//! assert_eq!(&bytes[..5], b"BLINK");
//! ```

pub mod asm;
mod config;
mod container;
pub mod dedup;
pub mod index;
mod invariants;
pub mod items;
pub mod profile;

#[cfg(test)]
mod asm_tests;
#[cfg(test)]
mod container_tests;
#[cfg(test)]
mod dedup_tests;
#[cfg(test)]
mod dump_tests;
#[cfg(test)]
mod index_tests;
#[cfg(test)]
mod layout_tests;

pub use asm::{Assembler, Operand};
pub use config::ContainerConfig;
pub use container::{ItemContainer, Layout, WriteCx};
pub use dedup::{DedupPasses, DedupStats, ItemDeduper};
pub use index::IndexDep;
pub use items::{ItemId, ItemType, TypeRef};
pub use profile::{Profile, ProfileError};
