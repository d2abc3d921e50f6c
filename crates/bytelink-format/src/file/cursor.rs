//! Bounds-checked little-endian reader over file bytes.

use crate::FormatError;
use crate::leb128::{decode_sleb128, decode_uleb128};

pub(crate) struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    what: &'static str,
}

impl<'a> Cursor<'a> {
    /// Start reading `what` at `pos`; errors report that label.
    pub(crate) fn new(bytes: &'a [u8], pos: usize, what: &'static str) -> Self {
        Self { bytes, pos, what }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    fn error(&self) -> FormatError {
        FormatError::malformed(self.pos, self.what)
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| self.error())?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, FormatError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub(crate) fn uleb(&mut self) -> Result<u64, FormatError> {
        let rest = self.bytes.get(self.pos..).unwrap_or_default();
        let (value, used) = decode_uleb128(rest).ok_or_else(|| self.error())?;
        self.pos += used;
        Ok(value)
    }

    pub(crate) fn uleb_u32(&mut self) -> Result<u32, FormatError> {
        let at = self.pos;
        u32::try_from(self.uleb()?).map_err(|_| FormatError::malformed(at, self.what))
    }

    pub(crate) fn sleb(&mut self) -> Result<i64, FormatError> {
        let rest = self.bytes.get(self.pos..).unwrap_or_default();
        let (value, used) = decode_sleb128(rest).ok_or_else(|| self.error())?;
        self.pos += used;
        Ok(value)
    }

    /// String data: `uleb len`, bytes, `0`.
    pub(crate) fn string(&mut self) -> Result<&'a str, FormatError> {
        let at = self.pos;
        let len = self.uleb()? as usize;
        let bytes = self.take(len)?;
        if self.u8()? != 0 {
            return Err(FormatError::malformed(at, "string terminator"));
        }
        std::str::from_utf8(bytes).map_err(|_| FormatError::malformed(at, "string utf-8"))
    }
}
