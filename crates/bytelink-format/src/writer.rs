//! Append-only byte sinks with a running checksum.
//!
//! Checksum protocol: write the magic and a zero checksum slot, enable
//! counting, write the rest of the file, disable counting, then patch the
//! slot with [`Writer::rewrite_checksum`].

use std::fs;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use adler2::Adler32;

use crate::leb128::{encode_sleb128, encode_uleb128};

/// Round up to the next multiple of `align` (a power of two).
#[inline]
pub fn align_up(value: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
    (value + align - 1) & !(align - 1)
}

/// Running adler32 that only sees bytes while counting is enabled.
#[derive(Clone)]
struct Checksum {
    adler: Adler32,
    counting: bool,
}

impl Default for Checksum {
    fn default() -> Self {
        Self {
            adler: Adler32::new(),
            counting: false,
        }
    }
}

impl Checksum {
    fn update(&mut self, bytes: &[u8]) {
        if self.counting {
            self.adler.write_slice(bytes);
        }
    }

    fn value(&self) -> u32 {
        self.adler.checksum()
    }
}

/// Byte sink used to serialize items.
pub trait Writer {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Absolute offset of the next byte.
    fn offset(&self) -> usize;

    fn count_checksum(&mut self, enabled: bool);

    /// Checksum over every byte written while counting was enabled.
    fn checksum(&self) -> u32;

    /// Overwrite the four bytes at `at` with the current checksum.
    fn rewrite_checksum(&mut self, at: usize) -> io::Result<()>;

    fn write_u8(&mut self, value: u8) -> io::Result<()> {
        self.write_bytes(&[value])
    }

    fn write_u16(&mut self, value: u16) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_u32(&mut self, value: u32) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_u64(&mut self, value: u64) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_uleb128(&mut self, value: u64) -> io::Result<()> {
        let mut buf = Vec::with_capacity(10);
        encode_uleb128(value, &mut buf);
        self.write_bytes(&buf)
    }

    fn write_sleb128(&mut self, value: i64) -> io::Result<()> {
        let mut buf = Vec::with_capacity(10);
        encode_sleb128(value, &mut buf);
        self.write_bytes(&buf)
    }

    /// Pad with zero bytes up to `alignment`.
    fn align(&mut self, alignment: usize) -> io::Result<()> {
        let offset = self.offset();
        let padding = align_up(offset, alignment) - offset;
        if padding == 0 {
            return Ok(());
        }
        self.write_bytes(&vec![0u8; padding])
    }
}

/// Memory-backed writer.
///
/// `base` shifts reported offsets, so an item can be serialized on its own
/// while still seeing the offset it was laid out at.
#[derive(Default)]
pub struct MemoryWriter {
    data: Vec<u8>,
    base: usize,
    checksum: Checksum,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(base: usize) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl Writer for MemoryWriter {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.checksum.update(bytes);
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    fn offset(&self) -> usize {
        self.base + self.data.len()
    }

    fn count_checksum(&mut self, enabled: bool) {
        self.checksum.counting = enabled;
    }

    fn checksum(&self) -> u32 {
        self.checksum.value()
    }

    fn rewrite_checksum(&mut self, at: usize) -> io::Result<()> {
        let start = at
            .checked_sub(self.base)
            .filter(|start| start + 4 <= self.data.len())
            .ok_or_else(|| io::Error::other("checksum slot outside written range"))?;
        let value = self.checksum.value();
        self.data[start..start + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }
}

/// File-backed writer. The checksum slot is patched by seeking back.
pub struct FileWriter {
    inner: BufWriter<fs::File>,
    offset: usize,
    checksum: Checksum,
}

impl FileWriter {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = fs::File::create(path)?;
        Ok(Self {
            inner: BufWriter::new(file),
            offset: 0,
            checksum: Checksum::default(),
        })
    }

    /// Flush buffered bytes to disk.
    pub fn finish(mut self) -> io::Result<()> {
        self.inner.flush()?;
        self.inner.get_ref().sync_all()
    }
}

impl Writer for FileWriter {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.checksum.update(bytes);
        self.inner.write_all(bytes)?;
        self.offset += bytes.len();
        Ok(())
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn count_checksum(&mut self, enabled: bool) {
        self.checksum.counting = enabled;
    }

    fn checksum(&self) -> u32 {
        self.checksum.value()
    }

    fn rewrite_checksum(&mut self, at: usize) -> io::Result<()> {
        let value = self.checksum.value();
        self.inner.flush()?;
        let file = self.inner.get_mut();
        file.seek(SeekFrom::Start(at as u64))?;
        file.write_all(&value.to_le_bytes())?;
        file.seek(SeekFrom::End(0))?;
        Ok(())
    }
}
