// tests/common/mod.rs
#![allow(dead_code)]

use psf_rs::{ChunkId, DataKind, ElementId, PropertyKind};

/// Builder for synthetic PSF byte images: big-endian section payloads
/// followed by the trailing (id, offset) directory, the "Clarissa" tag and
/// the data-size field.
pub struct PsfFileBuilder {
    data: Vec<u8>,
    sections: Vec<(u32, u32)>,
}

impl PsfFileBuilder {
    pub fn new() -> Self {
        PsfFileBuilder {
            data: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Record the current position as the start of section `id`
    pub fn begin_section(&mut self, id: u32) {
        self.sections.push((id, self.data.len() as u32));
    }

    pub fn position(&self) -> usize {
        self.data.len()
    }

    pub fn put_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_f32(&mut self, value: f32) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_f64(&mut self, value: f64) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Length-prefixed string padded to a 4-byte boundary
    pub fn put_str(&mut self, s: &str) {
        self.put_u32(s.len() as u32);
        self.data.extend_from_slice(s.as_bytes());
        let padding = (4 - s.len() % 4) % 4;
        self.data.extend_from_slice(&vec![0u8; padding]);
    }

    /// Open a chunk: id plus a placeholder end offset, patched by `end_chunk`
    pub fn begin_chunk(&mut self, id: ChunkId) -> usize {
        self.put_u32(id as u32);
        let patch = self.data.len();
        self.put_u32(0);
        patch
    }

    /// Patch a chunk's end offset to the current position
    pub fn end_chunk(&mut self, patch: usize) {
        let end = (self.data.len() as u32).to_be_bytes();
        self.data[patch..patch + 4].copy_from_slice(&end);
    }

    pub fn property_str(&mut self, name: &str, value: &str) {
        self.put_u32(PropertyKind::String as u32);
        self.put_str(name);
        self.put_str(value);
    }

    pub fn property_int(&mut self, name: &str, value: i32) {
        self.put_u32(PropertyKind::Int as u32);
        self.put_str(name);
        self.put_i32(value);
    }

    pub fn property_double(&mut self, name: &str, value: f64) {
        self.put_u32(PropertyKind::Double as u32);
        self.put_str(name);
        self.put_f64(value);
    }

    /// TYPE section entry for a scalar kind (no properties)
    pub fn scalar_type(&mut self, id: u32, name: &str, kind: DataKind) {
        self.put_u32(ElementId::Data as u32);
        self.put_u32(id);
        self.put_str(name);
        self.put_u32(0); // array flag
        self.put_u32(kind as u32);
    }

    /// TYPE section entry opening a struct; children follow, terminated by
    /// the parent's first property (or any non-DATA tag)
    pub fn struct_type_header(&mut self, id: u32, name: &str) {
        self.put_u32(ElementId::Data as u32);
        self.put_u32(id);
        self.put_str(name);
        self.put_u32(0);
        self.put_u32(DataKind::Struct as u32);
    }

    /// Variable declaration (no properties)
    pub fn variable(&mut self, id: u32, name: &str, type_id: u32) {
        self.put_u32(ElementId::Data as u32);
        self.put_u32(id);
        self.put_str(name);
        self.put_u32(type_id);
    }

    /// Group declaration header; exactly `count` variables must follow
    pub fn group_header(&mut self, id: u32, name: &str, count: u32) {
        self.put_u32(ElementId::Group as u32);
        self.put_u32(id);
        self.put_str(name);
        self.put_u32(count);
    }

    /// Append the directory, tag and data-size trailer and return the image
    pub fn finish(mut self) -> Vec<u8> {
        let data_size = self.data.len() as u32;
        let sections = std::mem::take(&mut self.sections);
        for (id, offset) in sections {
            self.put_u32(id);
            self.put_u32(offset);
        }
        self.data.extend_from_slice(b"Clarissa");
        self.put_u32(data_size);
        self.data
    }
}

/// Header section with sweep-point and optional window-size properties
pub fn put_sweep_header(b: &mut PsfFileBuilder, points: i32, window: Option<i32>) {
    b.begin_section(0);
    let major = b.begin_chunk(ChunkId::MajorSection);
    b.property_int(psf_rs::SWEEP_POINTS_PROPERTY, points);
    if let Some(window) = window {
        b.property_int(psf_rs::WINDOW_SIZE_PROPERTY, window);
    }
    b.end_chunk(major);
}

/// TYPE section holding a single scalar double type with the given id
pub fn put_double_type(b: &mut PsfFileBuilder, type_id: u32) {
    b.begin_section(1);
    let major = b.begin_chunk(ChunkId::MajorSection);
    let minor = b.begin_chunk(ChunkId::MinorSection);
    b.scalar_type(type_id, "double", DataKind::Double);
    b.end_chunk(minor);
    b.end_chunk(major);
}

/// SWEEP section declaring one variable
pub fn put_sweep_var(b: &mut PsfFileBuilder, id: u32, name: &str, type_id: u32) {
    b.begin_section(2);
    let major = b.begin_chunk(ChunkId::MajorSection);
    b.variable(id, name, type_id);
    b.end_chunk(major);
}
