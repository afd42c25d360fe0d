// src/types.rs
use bytemuck::{Pod, Zeroable};

/// PSF data kind codes as stored in TYPE section entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DataKind {
    Int8 = 0x01,
    String = 0x02,
    Array = 0x03,
    Int32 = 0x05,
    Float = 0x09,
    ComplexFloat = 0x0a,
    Double = 0x0b,
    ComplexDouble = 0x0c,
    Struct = 0x10,
    Tuple = 0x12,
}

impl DataKind {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x01 => Some(DataKind::Int8),
            0x02 => Some(DataKind::String),
            0x03 => Some(DataKind::Array),
            0x05 => Some(DataKind::Int32),
            0x09 => Some(DataKind::Float),
            0x0a => Some(DataKind::ComplexFloat),
            0x0b => Some(DataKind::Double),
            0x0c => Some(DataKind::ComplexDouble),
            0x10 => Some(DataKind::Struct),
            0x12 => Some(DataKind::Tuple),
            _ => None,
        }
    }

    /// Get the fixed on-disk width of one value in bytes, or None for kinds
    /// without a fixed-width record representation.
    ///
    /// Int8 values are stored zero-extended to 4 bytes.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            DataKind::Int8 | DataKind::Int32 | DataKind::Float => Some(4),
            DataKind::ComplexFloat | DataKind::Double => Some(8),
            DataKind::ComplexDouble => Some(16),
            DataKind::String | DataKind::Array | DataKind::Struct | DataKind::Tuple => None,
        }
    }

    /// Check if this is an integer kind
    pub fn is_integer(&self) -> bool {
        matches!(self, DataKind::Int8 | DataKind::Int32)
    }

    /// Check if this is a floating point kind
    pub fn is_float(&self) -> bool {
        matches!(self, DataKind::Float | DataKind::Double)
    }

    /// Check if this is a complex kind
    pub fn is_complex(&self) -> bool {
        matches!(self, DataKind::ComplexFloat | DataKind::ComplexDouble)
    }

    /// Get the name of the data kind as a string
    pub fn name(&self) -> &'static str {
        match self {
            DataKind::Int8 => "int8",
            DataKind::String => "string",
            DataKind::Array => "array",
            DataKind::Int32 => "int32",
            DataKind::Float => "float",
            DataKind::ComplexFloat => "complex_float",
            DataKind::Double => "double",
            DataKind::ComplexDouble => "complex_double",
            DataKind::Struct => "struct",
            DataKind::Tuple => "tuple",
        }
    }
}

/// Top-level section ids; sections are visited in ascending id order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SectionId {
    Header = 0,
    Type = 1,
    Sweep = 2,
    Trace = 3,
    Value = 4,
}

impl SectionId {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(SectionId::Header),
            1 => Some(SectionId::Type),
            2 => Some(SectionId::Sweep),
            3 => Some(SectionId::Trace),
            4 => Some(SectionId::Value),
            _ => None,
        }
    }
}

/// Chunk framing ids; a major section may contain one minor sub-section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ChunkId {
    MajorSection = 0x15,
    MinorSection = 0x16,
}

/// Element tags introducing entries inside a section payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ElementId {
    Data = 0x10,
    Group = 0x11,
    ZeroPad = 0x14,
}

impl ElementId {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x10 => Some(ElementId::Data),
            0x11 => Some(ElementId::Group),
            0x14 => Some(ElementId::ZeroPad),
            _ => None,
        }
    }
}

/// Kind tags of typed dictionary entries (header and metadata properties)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PropertyKind {
    String = 0x21,
    Int = 0x22,
    Double = 0x23,
}

impl PropertyKind {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x21 => Some(PropertyKind::String),
            0x22 => Some(PropertyKind::Int),
            0x23 => Some(PropertyKind::Double),
            _ => None,
        }
    }
}

/// Single-precision complex sample (re, im)
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Complex32 {
    pub re: f32,
    pub im: f32,
}

impl Complex32 {
    pub fn new(re: f32, im: f32) -> Self {
        Complex32 { re, im }
    }
}

/// Double-precision complex sample (re, im)
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
#[repr(C)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    pub fn new(re: f64, im: f64) -> Self {
        Complex64 { re, im }
    }

    pub fn norm(&self) -> f64 {
        (self.re * self.re + self.im * self.im).sqrt()
    }
}
