// src/raw_data/buffer.rs
use crate::error::{PsfError, Result};
use crate::metadata::{FieldDef, RecordLayout};
use crate::raw_data::PsfCursor;
use crate::types::DataKind;
use byteorder::{ByteOrder, NativeEndian};
use bytes::BytesMut;
use std::io::{Read, Seek};

/// Decoded sample storage: `points` records of a fixed byte layout.
///
/// Records are big-endian on disk and native-order here, so slices of the
/// buffer can be reinterpreted as the matching `Pod` types. A group member
/// never gets a buffer of its own; it is decoded into a sub-range of the
/// owning group's records through `decode_into` and read back as a view.
pub struct RecordBuffer {
    layout: RecordLayout,
    points: usize,
    bytes: BytesMut,
}

impl RecordBuffer {
    /// Allocate zeroed storage for `points` records of `layout`
    pub fn new(layout: RecordLayout, points: usize) -> Self {
        let mut bytes = BytesMut::with_capacity(points * layout.size());
        bytes.resize(points * layout.size(), 0);
        RecordBuffer {
            layout,
            points,
            bytes,
        }
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    pub fn points(&self) -> usize {
        self.points
    }

    pub fn record_size(&self) -> usize {
        self.layout.size()
    }

    /// The whole buffer as contiguous native-order bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The bytes of one record
    pub fn record(&self, point: usize) -> &[u8] {
        let size = self.layout.size();
        &self.bytes[point * size..(point + 1) * size]
    }

    /// Decode one full record at `point` from the cursor
    pub fn decode_record<R: Read + Seek>(
        &mut self,
        cursor: &mut PsfCursor<R>,
        point: usize,
    ) -> Result<()> {
        let size = self.layout.size();
        let start = point * size;
        decode_fields(cursor, self.layout.fields(), &mut self.bytes[start..start + size])
    }

    /// Decode `count` consecutive records starting at `start`
    pub fn decode_records<R: Read + Seek>(
        &mut self,
        cursor: &mut PsfCursor<R>,
        start: usize,
        count: usize,
    ) -> Result<()> {
        for point in start..start + count {
            self.decode_record(cursor, point)?;
        }
        Ok(())
    }

    /// Decode a member layout into a byte range of the record at `point`.
    ///
    /// This is the group-member scatter path: the member's fields land at
    /// `byte_offset` inside the owning record, leaving the rest untouched.
    pub fn decode_into<R: Read + Seek>(
        &mut self,
        cursor: &mut PsfCursor<R>,
        point: usize,
        byte_offset: usize,
        layout: &RecordLayout,
    ) -> Result<()> {
        let start = point * self.layout.size() + byte_offset;
        decode_fields(cursor, layout.fields(), &mut self.bytes[start..start + layout.size()])
    }

    /// Zero-copy view of the whole buffer as one `T` per record. Fails when
    /// the record is not exactly one `T` or the storage is misaligned for it.
    pub fn try_cast<T: bytemuck::AnyBitPattern>(&self) -> Result<&[T]> {
        if std::mem::size_of::<T>() != self.layout.size() {
            return Err(PsfError::CastMismatch {
                expected: format!("{} byte record", self.layout.size()),
                found: format!("{} byte element", std::mem::size_of::<T>()),
            });
        }
        bytemuck::try_cast_slice(self.bytes.as_ref()).map_err(|e| PsfError::CastMismatch {
            expected: format!("{} byte record", self.layout.size()),
            found: e.to_string(),
        })
    }
}

impl std::fmt::Debug for RecordBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordBuffer")
            .field("points", &self.points)
            .field("record_size", &self.layout.size())
            .field("byte_len", &self.bytes.len())
            .finish()
    }
}

/// Decode one big-endian value per field into native-order output bytes
fn decode_fields<R: Read + Seek>(
    cursor: &mut PsfCursor<R>,
    fields: &[FieldDef],
    out: &mut [u8],
) -> Result<()> {
    let mut at = 0;
    for field in fields {
        match field.kind {
            DataKind::Int8 | DataKind::Int32 => {
                let value = cursor.read_i32()?;
                NativeEndian::write_i32(&mut out[at..at + 4], value);
                at += 4;
            }
            DataKind::Float => {
                let value = cursor.read_f32()?;
                NativeEndian::write_f32(&mut out[at..at + 4], value);
                at += 4;
            }
            DataKind::Double => {
                let value = cursor.read_f64()?;
                NativeEndian::write_f64(&mut out[at..at + 8], value);
                at += 8;
            }
            DataKind::ComplexFloat => {
                let value = cursor.read_complex32()?;
                NativeEndian::write_f32(&mut out[at..at + 4], value.re);
                NativeEndian::write_f32(&mut out[at + 4..at + 8], value.im);
                at += 8;
            }
            DataKind::ComplexDouble => {
                let value = cursor.read_complex64()?;
                NativeEndian::write_f64(&mut out[at..at + 8], value.re);
                NativeEndian::write_f64(&mut out[at + 8..at + 16], value.im);
                at += 16;
            }
            kind => {
                return Err(PsfError::Unsupported(format!(
                    "type kind '{}' cannot be a record element",
                    kind.name()
                )))
            }
        }
    }
    Ok(())
}
