// src/reader/sync_reader.rs
use crate::error::{PsfError, Result};
use crate::metadata::{
    resolve_directory, Properties, RecordLayout, SectionInfo, TraceItem, TypeDef, TypeRegistry,
    Variable, DIRECTORY_ENTRY_SIZE, FILE_TAG, TRAILER_SIZE,
};
use crate::raw_data::{PsfCursor, RecordBuffer};
use crate::reader::signal_reader::Signal;
use crate::types::{ChunkId, ElementId, SectionId};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

#[cfg(feature = "mmap")]
use memmap2::Mmap;
#[cfg(feature = "mmap")]
use std::io::Cursor;

/// Header property naming the number of sweep points
pub const SWEEP_POINTS_PROPERTY: &str = "PSF sweep points";

/// Header property naming the windowed-value chunk byte budget
pub const WINDOW_SIZE_PROPERTY: &str = "PSF window size";

/// Trait alias for Read + Seek
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Where a decoded signal's samples live: a buffer in the session arena plus
/// the byte offset its fields occupy inside each record of that buffer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Binding {
    pub(crate) buffer: usize,
    pub(crate) byte_offset: usize,
}

#[derive(Debug)]
pub(crate) struct SignalEntry {
    pub(crate) var: Variable,
    pub(crate) binding: Binding,
}

/// One step of the value-section decode order: the expected variable id and
/// where its record lands. Built once per decode, never re-evaluated.
struct DecodeStep {
    id: u32,
    buffer: usize,
    byte_offset: usize,
    layout: RecordLayout,
}

/// Synchronous PSF file reader.
///
/// One instance is one decoder session: it owns the cursor and every registry
/// the section decoders fill in (sections, header properties, type table,
/// sweep variable, traces, sample buffers). Decoding happens once at open
/// time; all accessors afterwards are read-only projections.
pub struct PsfReader<R: ReadSeek> {
    cursor: PsfCursor<R>,
    file_size: u64,
    sections: Vec<SectionInfo>,
    properties: Properties,
    types: TypeRegistry,
    sweep_var: Option<Variable>,
    sweep_binding: Option<Binding>,
    trace_items: Vec<TraceItem>,
    signals: Vec<SignalEntry>,
    signal_index: HashMap<String, usize>,
    buffers: Vec<RecordBuffer>,
}

/// Constructors for standard file I/O
impl PsfReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::parse(BufReader::with_capacity(65536, file), false)
    }

    /// Decode the header section only; types, sweep, traces and values are
    /// left untouched. Useful for cheap metadata inspection of large files.
    pub fn open_header_only(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::parse(BufReader::with_capacity(65536, file), true)
    }
}

/// Constructor for memory-mapped file I/O (requires "mmap" feature)
#[cfg(feature = "mmap")]
impl PsfReader<Cursor<Mmap>> {
    pub fn open_mmap(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::parse(Cursor::new(mmap), false)
    }
}

impl<R: ReadSeek> PsfReader<R> {
    pub fn from_reader(inner: R) -> Result<Self> {
        Self::parse(inner, false)
    }

    pub fn from_reader_header_only(inner: R) -> Result<Self> {
        Self::parse(inner, true)
    }

    fn parse(inner: R, header_only: bool) -> Result<Self> {
        let mut reader = PsfReader {
            cursor: PsfCursor::new(inner),
            file_size: 0,
            sections: Vec::new(),
            properties: Properties::new(),
            types: TypeRegistry::new(),
            sweep_var: None,
            sweep_binding: None,
            trace_items: Vec::new(),
            signals: Vec::new(),
            signal_index: HashMap::new(),
            buffers: Vec::new(),
        };
        reader.file_size = reader.cursor.byte_len()?;
        reader.verify_tag()?;
        reader.resolve_sections()?;
        reader.decode_sections(header_only)?;
        Ok(reader)
    }

    /// The fixed trailing tag is checked before any section is touched
    fn verify_tag(&mut self) -> Result<()> {
        if self.file_size < TRAILER_SIZE {
            return Err(PsfError::NotPsf {
                found: format!("{} byte file", self.file_size),
            });
        }
        self.cursor.seek_to(self.file_size - TRAILER_SIZE)?;
        let tag = self.cursor.read_tag()?;
        if &tag != FILE_TAG {
            return Err(PsfError::NotPsf {
                found: String::from_utf8_lossy(&tag).into_owned(),
            });
        }
        Ok(())
    }

    /// Reconstruct the section directory from the trailing (id, offset) pairs
    /// and the data-size field next to the tag.
    fn resolve_sections(&mut self) -> Result<()> {
        self.cursor.seek_to(self.file_size - 4)?;
        let data_size = self.cursor.read_u32()?;

        let directory_len = self
            .file_size
            .checked_sub(data_size as u64 + TRAILER_SIZE)
            .ok_or(PsfError::CorruptDirectory {
                file_size: self.file_size,
                data_size,
            })?;
        let count = directory_len / DIRECTORY_ENTRY_SIZE;

        self.cursor
            .seek_to(self.file_size - TRAILER_SIZE - count * DIRECTORY_ENTRY_SIZE)?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = self.cursor.read_u32()?;
            let offset = self.cursor.read_u32()?;
            entries.push((id, offset));
        }

        let mut sections = resolve_directory(&entries, self.file_size);
        sections.sort_by_key(|s| s.id);
        self.sections = sections;
        Ok(())
    }

    /// Visit sections strictly by ascending id, so the type table is decoded
    /// before anything that references it. Unknown ids are skipped.
    fn decode_sections(&mut self, header_only: bool) -> Result<()> {
        let sections = self.sections.clone();
        for section in &sections {
            self.cursor.seek_to(section.offset)?;
            match SectionId::from_u32(section.id) {
                Some(SectionId::Header) => {
                    self.read_header_section()?;
                    if header_only {
                        return Ok(());
                    }
                }
                Some(SectionId::Type) => self.read_type_section()?,
                Some(SectionId::Sweep) => self.read_sweep_section()?,
                Some(SectionId::Trace) => self.read_trace_section()?,
                Some(SectionId::Value) => self.read_value_section()?,
                None => {}
            }
        }
        Ok(())
    }

    fn read_header_section(&mut self) -> Result<()> {
        let end = self.cursor.read_chunk_preamble(ChunkId::MajorSection)?;
        self.properties = Properties::read_dictionary(&mut self.cursor)?;
        self.cursor.seek_to(end as u64)?;
        Ok(())
    }

    fn read_type_section(&mut self) -> Result<()> {
        self.cursor.read_chunk_preamble(ChunkId::MajorSection)?;
        let end = self.cursor.read_chunk_preamble(ChunkId::MinorSection)? as u64;
        while self.cursor.position()? < end {
            if TypeDef::try_read(&mut self.cursor, &mut self.types)?.is_none() {
                break;
            }
        }
        Ok(())
    }

    fn read_sweep_section(&mut self) -> Result<()> {
        self.cursor.read_chunk_preamble(ChunkId::MajorSection)?;
        let mut sweep_vars = Vec::new();
        while let Some(variable) = Variable::try_read(&mut self.cursor, &self.types)? {
            sweep_vars.push(variable);
        }
        if sweep_vars.len() > 1 {
            return Err(PsfError::MultipleSweepVariables {
                count: sweep_vars.len(),
            });
        }
        self.sweep_var = sweep_vars.pop();
        Ok(())
    }

    fn read_trace_section(&mut self) -> Result<()> {
        self.cursor.read_chunk_preamble(ChunkId::MajorSection)?;
        let end = self.cursor.read_chunk_preamble(ChunkId::MinorSection)? as u64;
        while self.cursor.position()? < end {
            match TraceItem::try_read(&mut self.cursor, &self.types)? {
                Some(item) => self.trace_items.push(item),
                None => break,
            }
        }
        Ok(())
    }

    /// Decode the VALUE section. The algorithm is selected once at entry:
    /// no sweep declared → self-describing variable records; sweep declared →
    /// strict point interleave, windowed when a positive window size property
    /// is present.
    fn read_value_section(&mut self) -> Result<()> {
        let mut end = self.cursor.read_chunk_preamble(ChunkId::MajorSection)? as u64;
        // an optional minor sub-section bounds the payload when present
        let tag = self.cursor.read_u32()?;
        if tag == ChunkId::MinorSection as u32 {
            end = self.cursor.read_u32()? as u64;
        } else {
            self.cursor.unread(4)?;
        }

        let Some(sweep_var) = self.sweep_var.clone() else {
            return self.read_plain_values(end);
        };

        let npoints = self
            .properties
            .get_int(SWEEP_POINTS_PROPERTY)
            .ok_or(PsfError::MissingProperty {
                name: SWEEP_POINTS_PROPERTY,
            })?;
        let npoints = usize::try_from(npoints).unwrap_or(0);
        let window = self.properties.get_int(WINDOW_SIZE_PROPERTY).unwrap_or(0);

        let sweep_buffer = self.push_buffer(RecordBuffer::new(sweep_var.layout.clone(), npoints));
        self.sweep_binding = Some(Binding {
            buffer: sweep_buffer,
            byte_offset: 0,
        });
        self.bind_trace_buffers(npoints);

        let sweep_step = DecodeStep {
            id: sweep_var.id,
            buffer: sweep_buffer,
            byte_offset: 0,
            layout: sweep_var.layout.clone(),
        };
        let trace_steps: Vec<DecodeStep> = self
            .signals
            .iter()
            .map(|entry| DecodeStep {
                id: entry.var.id,
                buffer: entry.binding.buffer,
                byte_offset: entry.binding.byte_offset,
                layout: entry.var.layout.clone(),
            })
            .collect();

        if window > 0 {
            self.read_windowed_values(npoints, window as u32, &sweep_step, &trace_steps)
        } else {
            self.read_interleaved_values(npoints, &sweep_step, &trace_steps)
        }
    }

    /// Allocate sample storage for every trace: one buffer per group (members
    /// alias sub-ranges of it) and one per bare variable.
    fn bind_trace_buffers(&mut self, npoints: usize) {
        let items = self.trace_items.clone();
        for item in &items {
            match item {
                TraceItem::Group(group) => {
                    let buffer =
                        self.push_buffer(RecordBuffer::new(group.layout.clone(), npoints));
                    let mut byte_offset = 0;
                    for member in &group.members {
                        let size = member.record_size();
                        self.insert_signal(SignalEntry {
                            var: member.clone(),
                            binding: Binding {
                                buffer,
                                byte_offset,
                            },
                        });
                        byte_offset += size;
                    }
                }
                TraceItem::Single(variable) => {
                    let buffer =
                        self.push_buffer(RecordBuffer::new(variable.layout.clone(), npoints));
                    self.insert_signal(SignalEntry {
                        var: variable.clone(),
                        binding: Binding {
                            buffer,
                            byte_offset: 0,
                        },
                    });
                }
            }
        }
    }

    /// No sweep: each record is a self-describing variable carrying one
    /// inline value, terminated by a non-DATA tag or the sub-section end.
    fn read_plain_values(&mut self, end: u64) -> Result<()> {
        while self.cursor.position()? < end {
            let tag = self.cursor.read_u32()?;
            if tag != ElementId::Data as u32 {
                self.cursor.unread(4)?;
                break;
            }

            let id = self.cursor.read_u32()?;
            let name = self.cursor.read_string()?;
            let type_id = self.cursor.read_u32()?;
            let layout = self
                .types
                .layout(type_id)
                .ok_or(PsfError::UnknownTypeId { id: type_id })?
                .clone();

            let mut buffer = RecordBuffer::new(layout.clone(), 1);
            buffer.decode_record(&mut self.cursor, 0)?;
            let properties = Properties::read_dictionary(&mut self.cursor)?;

            let buffer = self.push_buffer(buffer);
            self.insert_signal(SignalEntry {
                var: Variable {
                    id,
                    name,
                    type_id,
                    layout,
                    properties,
                },
                binding: Binding {
                    buffer,
                    byte_offset: 0,
                },
            });
        }
        Ok(())
    }

    /// Sweep without windows: every point is one DATA/id/record triple for
    /// the sweep variable followed by one triple per trace in declared order.
    /// The format guarantees this interleave; any deviation is corruption.
    fn read_interleaved_values(
        &mut self,
        npoints: usize,
        sweep: &DecodeStep,
        traces: &[DecodeStep],
    ) -> Result<()> {
        for point in 0..npoints {
            self.decode_tagged_record(sweep, point)?;
            for step in traces {
                self.decode_tagged_record(step, point)?;
            }
        }
        Ok(())
    }

    /// Sweep with windows: records are packed into fixed-size byte windows,
    /// each DATA block carrying a point count in its low 16 bits, with
    /// inter-record padding skipped between the per-trace runs. ZEROPAD
    /// blocks contribute no points.
    fn read_windowed_values(
        &mut self,
        npoints: usize,
        window: u32,
        sweep: &DecodeStep,
        traces: &[DecodeStep],
    ) -> Result<()> {
        let mut points_read = 0usize;
        while points_read < npoints {
            let offset = self.cursor.position()?;
            let block_id = self.cursor.read_u32()?;

            if block_id == ElementId::Data as u32 {
                let chunk_points = (self.cursor.read_u32()? & 0x0000_ffff) as usize;
                let chunk_end = points_read + chunk_points;
                if chunk_end > npoints {
                    return Err(PsfError::SweepOverrun {
                        declared: npoints,
                        end: chunk_end,
                    });
                }

                let mut skip = window_skip(window, sweep.layout.size(), chunk_points)?;
                self.decode_record_run(sweep, points_read, chunk_points)?;
                for step in traces {
                    let next_skip = window_skip(window, step.layout.size(), chunk_points)?;
                    self.cursor.skip(skip as u64)?;
                    self.decode_record_run(step, points_read, chunk_points)?;
                    skip = next_skip;
                }

                points_read = chunk_end;
            } else if block_id == ElementId::ZeroPad as u32 {
                let pad = self.cursor.read_u32()?;
                self.cursor.skip(pad as u64)?;
            } else {
                return Err(PsfError::UnexpectedBlockId {
                    offset,
                    found: block_id,
                });
            }
        }
        Ok(())
    }

    /// One DATA/id-prefixed record of the strict interleave
    fn decode_tagged_record(&mut self, step: &DecodeStep, point: usize) -> Result<()> {
        let offset = self.cursor.position()?;
        let tag = self.cursor.read_u32()?;
        if tag != ElementId::Data as u32 {
            return Err(PsfError::UnexpectedElement {
                offset,
                expected: ElementId::Data as u32,
                found: tag,
            });
        }

        let id_offset = self.cursor.position()?;
        let found = self.cursor.read_u32()?;
        if found != step.id {
            return Err(PsfError::SignalIdMismatch {
                offset: id_offset,
                expected: step.id,
                found,
            });
        }

        self.buffers[step.buffer]
            .decode_into(&mut self.cursor, point, step.byte_offset, &step.layout)
    }

    /// `count` consecutive on-disk records scattered to their points
    fn decode_record_run(&mut self, step: &DecodeStep, start: usize, count: usize) -> Result<()> {
        for point in start..start + count {
            self.buffers[step.buffer].decode_into(
                &mut self.cursor,
                point,
                step.byte_offset,
                &step.layout,
            )?;
        }
        Ok(())
    }

    fn push_buffer(&mut self, buffer: RecordBuffer) -> usize {
        self.buffers.push(buffer);
        self.buffers.len() - 1
    }

    /// Signals keep first-seen order; a duplicate name replaces the earlier
    /// entry in place.
    fn insert_signal(&mut self, entry: SignalEntry) {
        match self.signal_index.get(entry.var.name.as_str()) {
            Some(&index) => self.signals[index] = entry,
            None => {
                self.signal_index
                    .insert(entry.var.name.clone(), self.signals.len());
                self.signals.push(entry);
            }
        }
    }

    // Read-only projections over the decoded state

    /// Header properties of the file
    pub fn header_properties(&self) -> &Properties {
        &self.properties
    }

    /// The reconstructed section directory, in ascending id order
    pub fn sections(&self) -> &[SectionInfo] {
        &self.sections
    }

    /// The decoded type table
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Decoded signal names in first-seen order: traces when a sweep is
    /// declared, the value-section variables otherwise.
    pub fn signal_names(&self) -> Vec<&str> {
        self.signals
            .iter()
            .map(|entry| entry.var.name.as_str())
            .collect()
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Look up a decoded signal by name
    pub fn signal(&self, name: &str) -> Option<Signal<'_>> {
        self.signal_index
            .get(name)
            .map(|&index| self.signal_at(index))
    }

    /// Iterate decoded signals in first-seen order
    pub fn signals(&self) -> impl Iterator<Item = Signal<'_>> {
        (0..self.signals.len()).map(|index| self.signal_at(index))
    }

    fn signal_at(&self, index: usize) -> Signal<'_> {
        let entry = &self.signals[index];
        Signal::new(
            &entry.var,
            &self.buffers[entry.binding.buffer],
            entry.binding.byte_offset,
        )
    }

    /// The declared sweep variable, if any
    pub fn sweep_variable(&self) -> Option<&Variable> {
        self.sweep_var.as_ref()
    }

    /// The decoded sweep signal, if a sweep was declared and values decoded
    pub fn sweep(&self) -> Option<Signal<'_>> {
        let var = self.sweep_var.as_ref()?;
        let binding = self.sweep_binding?;
        Some(Signal::new(var, &self.buffers[binding.buffer], binding.byte_offset))
    }

    /// The sweep-point values widened to f64
    pub fn sweep_values(&self) -> Result<Vec<f64>> {
        self.sweep()
            .ok_or_else(|| PsfError::SignalNotFound("sweep variable".to_string()))?
            .to_f64()
    }

    /// Copy out a named signal's samples as `T`, one per point
    pub fn read_signal_data<T: bytemuck::AnyBitPattern>(&self, name: &str) -> Result<Vec<T>> {
        self.signal(name)
            .ok_or_else(|| PsfError::SignalNotFound(name.to_string()))?
            .values()
    }
}

/// Window padding left after `count` records of `record_size` bytes. The
/// declared records must fit the window budget; the remainder is skipped.
fn window_skip(window: u32, record_size: usize, count: usize) -> Result<u32> {
    let required = (record_size * count) as u64;
    if required > window as u64 {
        return Err(PsfError::WindowOverrun {
            window,
            required: required as u32,
        });
    }
    Ok(window - required as u32)
}
