// src/raw_data/cursor.rs
use crate::error::{PsfError, Result};
use crate::types::{ChunkId, Complex32, Complex64};
use byteorder::{BigEndian, ByteOrder};
use std::io::{self, Read, Seek, SeekFrom};

/// Pad byte count needed to realign a string payload to a 4-byte boundary.
pub(crate) fn string_padding(length: usize) -> usize {
    ((length + 3) & !0x03) - length
}

/// Positioned reader over a seekable big-endian byte source.
///
/// All multi-byte primitives in the format are big-endian; strings are
/// u32-length-prefixed UTF-8 payloads padded to a 4-byte boundary. `unread`
/// provides the one-token lookahead the dictionary and element grammars use
/// to detect the end of a sequence.
pub struct PsfCursor<R> {
    inner: R,
}

impl<R: Read + Seek> PsfCursor<R> {
    pub fn new(inner: R) -> Self {
        PsfCursor { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current byte position
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Total length of the underlying source; restores the position
    pub fn byte_len(&mut self) -> Result<u64> {
        let saved = self.inner.stream_position()?;
        let len = self.inner.seek(SeekFrom::End(0))?;
        self.inner.seek(SeekFrom::Start(saved))?;
        Ok(len)
    }

    pub fn seek_to(&mut self, position: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    /// Advance the position by `count` bytes without reading
    pub fn skip(&mut self, count: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(count as i64))?;
        Ok(())
    }

    /// Move the position back `count` bytes, restoring a lookahead token
    pub fn unread(&mut self, count: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(-(count as i64)))?;
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.inner.stream_position()?;
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => PsfError::Truncated { offset },
            _ => PsfError::Io(e),
        })
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(BigEndian::read_u32(&buf))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(BigEndian::read_i32(&buf))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(BigEndian::read_f32(&buf))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let mut buf = [0u8; 8];
        self.read_bytes(&mut buf)?;
        Ok(BigEndian::read_f64(&buf))
    }

    pub fn read_complex32(&mut self) -> Result<Complex32> {
        let mut buf = [0u8; 8];
        self.read_bytes(&mut buf)?;
        Ok(Complex32 {
            re: BigEndian::read_f32(&buf[0..4]),
            im: BigEndian::read_f32(&buf[4..8]),
        })
    }

    pub fn read_complex64(&mut self) -> Result<Complex64> {
        let mut buf = [0u8; 16];
        self.read_bytes(&mut buf)?;
        Ok(Complex64 {
            re: BigEndian::read_f64(&buf[0..8]),
            im: BigEndian::read_f64(&buf[8..16]),
        })
    }

    /// The fixed 8-byte file tag ("Clarissa" for this format)
    pub fn read_tag(&mut self) -> Result<[u8; 8]> {
        let mut buf = [0u8; 8];
        self.read_bytes(&mut buf)?;
        Ok(buf)
    }

    /// Length-prefixed UTF-8 string, padded to the next 4-byte boundary
    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_u32()? as usize;
        let mut data = vec![0u8; length + string_padding(length)];
        self.read_bytes(&mut data)?;
        data.truncate(length);
        String::from_utf8(data).map_err(|_| PsfError::InvalidUtf8)
    }

    /// Chunk preamble: a 4-byte chunk id checked against `expected`, then the
    /// absolute end offset of the chunk payload.
    pub fn read_chunk_preamble(&mut self, expected: ChunkId) -> Result<u32> {
        let offset = self.position()?;
        let found = self.read_u32()?;
        if found != expected as u32 {
            return Err(PsfError::UnexpectedChunk {
                offset,
                expected: expected as u32,
                found,
            });
        }
        self.read_u32()
    }
}
