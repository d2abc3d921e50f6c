//! Link errors.
//!
//! Symbols are stored demangled (`app.Main::run(i32): void`), together with
//! the input that declared or referenced them.

use std::io;

use bytelink_format::FormatError;

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: FormatError,
    },
    #[error("class {class} is defined in both {first} and {second}")]
    ClassRedefinition {
        class: String,
        first: String,
        second: String,
    },
    #[error("{member} is defined in both {first} and {second}")]
    MemberRedefinition {
        member: String,
        first: String,
        second: String,
    },
    #[error("unresolved method {method} referenced from {file}")]
    UnresolvedMethod { method: String, file: String },
    #[error("unresolved field {field} referenced from {file}")]
    UnresolvedField { field: String, file: String },
    #[error("prototype mismatch for {method} referenced from {file}; defined as {found}")]
    PrototypeMismatch {
        method: String,
        file: String,
        found: String,
    },
    #[error("type mismatch for {field} referenced from {file}; defined as {found}")]
    FieldTypeMismatch {
        field: String,
        file: String,
        found: String,
    },
    #[error("malformed input {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: FormatError,
    },
    #[error("cannot write output: {0}")]
    Write(#[from] io::Error),
}

impl LinkError {
    pub(crate) fn malformed(path: &str, source: FormatError) -> Self {
        Self::Malformed {
            path: path.to_string(),
            source,
        }
    }
}
