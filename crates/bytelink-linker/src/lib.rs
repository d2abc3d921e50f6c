#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Static linker for bytelink containers.
//!
//! A [`Context`] runs the link pipeline in strict order:
//!
//! 1. **Read**: open and validate every input (in parallel)
//! 2. **Merge**: unify classes across inputs
//! 3. **Parse**: materialize members, code, debug info and annotations,
//!    resolving foreign references against the link set
//! 4. **ComputeLayout**: order and place every item of the output
//! 5. **Patch**: rewrite id operands in code for the output's indexes
//! 6. **Write**: emit the linked file
//!
//! Errors are collected rather than returned early; a stage that records an
//! error stops the pipeline before the next stage.
//!
//! ```no_run
//! use bytelink_linker::{LinkerConfig, link};
//!
//! let result = link(LinkerConfig::default(), &["a.blk", "b.blk"], "out.blk");
//! for error in &result.errors {
//!     eprintln!("error: {error}");
//! }
//! ```

mod config;
mod context;
mod error;
mod stats;


pub use config::LinkerConfig;
pub use context::{Context, LinkResult, Stage, link};
pub use error::LinkError;
pub use stats::{LinkStats, StageTiming};
