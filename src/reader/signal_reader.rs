// src/reader/signal_reader.rs
use crate::error::{PsfError, Result};
use crate::metadata::{Properties, RecordLayout, Variable};
use crate::raw_data::RecordBuffer;
use crate::types::DataKind;
use bytemuck::AnyBitPattern;

/// Read-only view of one decoded signal.
///
/// A signal declared inside a group aliases a sub-range of the group's
/// contiguous record storage rather than owning a copy: `values` gathers the
/// strided samples, while `as_slice` is only available when the signal owns
/// its whole record. Views never outlive the reader that owns the buffers.
pub struct Signal<'a> {
    var: &'a Variable,
    buffer: &'a RecordBuffer,
    byte_offset: usize,
}

impl<'a> Signal<'a> {
    pub(crate) fn new(var: &'a Variable, buffer: &'a RecordBuffer, byte_offset: usize) -> Self {
        Signal {
            var,
            buffer,
            byte_offset,
        }
    }

    pub fn name(&self) -> &'a str {
        &self.var.name
    }

    pub fn id(&self) -> u32 {
        self.var.id
    }

    pub fn properties(&self) -> &'a Properties {
        &self.var.properties
    }

    pub fn layout(&self) -> &'a RecordLayout {
        &self.var.layout
    }

    /// Byte width of one record of this signal
    pub fn record_size(&self) -> usize {
        self.var.layout.size()
    }

    /// Number of decoded points
    pub fn len(&self) -> usize {
        self.buffer.points()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.points() == 0
    }

    /// Whether this signal is a view into a group's shared record storage
    pub fn is_aliased(&self) -> bool {
        self.byte_offset != 0 || self.record_size() != self.buffer.record_size()
    }

    /// Copy out one `T` per point; `T` must match the record width
    pub fn values<T: AnyBitPattern>(&self) -> Result<Vec<T>> {
        let size = self.var.layout.size();
        if std::mem::size_of::<T>() != size {
            return Err(PsfError::CastMismatch {
                expected: format!("{} byte record", size),
                found: format!("{} byte element", std::mem::size_of::<T>()),
            });
        }

        let stride = self.buffer.record_size();
        let bytes = self.buffer.as_bytes();
        let mut out = Vec::with_capacity(self.buffer.points());
        for point in 0..self.buffer.points() {
            let at = point * stride + self.byte_offset;
            out.push(bytemuck::pod_read_unaligned(&bytes[at..at + size]));
        }
        Ok(out)
    }

    /// Zero-copy view of the samples as `&[T]`. Fails for group members,
    /// whose records interleave with their siblings'.
    pub fn as_slice<T: AnyBitPattern>(&self) -> Result<&'a [T]> {
        if self.is_aliased() {
            return Err(PsfError::CastMismatch {
                expected: "signal owning its records".to_string(),
                found: "view into a group's shared record".to_string(),
            });
        }
        self.buffer.try_cast()
    }

    /// Copy out a single named field per point (struct-typed signals)
    pub fn field<T: AnyBitPattern>(&self, name: &str) -> Result<Vec<T>> {
        let (field_offset, field) =
            self.var
                .layout
                .field_offset(name)
                .ok_or_else(|| PsfError::FieldNotFound {
                    signal: self.var.name.clone(),
                    field: name.to_string(),
                })?;
        let width = field.kind.fixed_size().unwrap_or(0);
        if std::mem::size_of::<T>() != width {
            return Err(PsfError::CastMismatch {
                expected: format!("{} byte field", width),
                found: format!("{} byte element", std::mem::size_of::<T>()),
            });
        }

        let stride = self.buffer.record_size();
        let bytes = self.buffer.as_bytes();
        let mut out = Vec::with_capacity(self.buffer.points());
        for point in 0..self.buffer.points() {
            let at = point * stride + self.byte_offset + field_offset;
            out.push(bytemuck::pod_read_unaligned(&bytes[at..at + width]));
        }
        Ok(out)
    }

    /// Widen a single-field real scalar signal to f64
    pub fn to_f64(&self) -> Result<Vec<f64>> {
        let fields = self.var.layout.fields();
        if fields.len() != 1 {
            return Err(PsfError::CastMismatch {
                expected: "single-field scalar record".to_string(),
                found: format!("{} fields", fields.len()),
            });
        }
        match fields[0].kind {
            DataKind::Int8 | DataKind::Int32 => {
                Ok(self.values::<i32>()?.into_iter().map(f64::from).collect())
            }
            DataKind::Float => Ok(self.values::<f32>()?.into_iter().map(f64::from).collect()),
            DataKind::Double => self.values::<f64>(),
            kind => Err(PsfError::CastMismatch {
                expected: "real scalar".to_string(),
                found: kind.name().to_string(),
            }),
        }
    }
}

impl std::fmt::Debug for Signal<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("name", &self.var.name)
            .field("id", &self.var.id)
            .field("points", &self.buffer.points())
            .field("record_size", &self.record_size())
            .field("aliased", &self.is_aliased())
            .finish()
    }
}
