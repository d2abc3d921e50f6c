#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core helpers shared by every bytelink crate.
//!
//! - [`descriptor`]: turns mangled type descriptors (`Lpkg/Cls;`, `[I`) into
//!   the readable form used in diagnostics and dumps
//! - [`Colors`]: ANSI palette for CLI output

pub mod colors;
pub mod descriptor;


pub use colors::Colors;
pub use descriptor::{demangle_field, demangle_method, demangle_type, is_class_descriptor};
