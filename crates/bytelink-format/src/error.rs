//! Errors raised while validating or reading a container.

use std::io;

use crate::constants::HEADER_SIZE;
use crate::header::Version;

/// Container load or read error.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("file too small: {0} bytes (minimum {HEADER_SIZE})")]
    FileTooSmall(usize),
    #[error("invalid magic")]
    InvalidMagic,
    #[error("version {found} is too old (minimum supported is {min})")]
    VersionTooOld { found: Version, min: Version },
    #[error("version {found} is too new (maximum supported is {max})")]
    VersionTooNew { found: Version, max: Version },
    #[error("size mismatch: header says {header} bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },
    #[error("malformed {what} at offset {offset:#x}")]
    Malformed { offset: usize, what: &'static str },
    #[error("cannot decode instruction at pc {pc:#x} (opcode {opcode:#04x})")]
    Decode { pc: usize, opcode: u8 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl FormatError {
    pub(crate) fn malformed(offset: usize, what: &'static str) -> Self {
        Self::Malformed { offset, what }
    }
}
