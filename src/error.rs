// src/error.rs
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PsfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("not a PSF file: trailing tag is {found:?}, expected \"Clarissa\"")]
    NotPsf { found: String },

    #[error("truncated file: read past end of file at offset {offset}")]
    Truncated { offset: u64 },

    #[error("unexpected chunk id at offset {offset}: expected {expected:#x}, found {found:#x}")]
    UnexpectedChunk {
        offset: u64,
        expected: u32,
        found: u32,
    },

    #[error("inconsistent section directory: data size {data_size} in a {file_size} byte file")]
    CorruptDirectory { file_size: u64, data_size: u32 },

    #[error("unknown data kind {code:#x} at offset {offset}")]
    UnknownDataKind { offset: u64, code: u32 },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("reference to unknown type id {id}")]
    UnknownTypeId { id: u32 },

    #[error("unsupported file: {count} sweep variables declared, at most one allowed")]
    MultipleSweepVariables { count: usize },

    #[error("group '{group}' declares {expected} members but only {found} were present")]
    GroupLengthMismatch {
        group: String,
        expected: u32,
        found: u32,
    },

    #[error("unexpected element tag at offset {offset}: expected {expected:#x}, found {found:#x}")]
    UnexpectedElement {
        offset: u64,
        expected: u32,
        found: u32,
    },

    #[error("signal id mismatch at offset {offset}: expected {expected}, found {found}")]
    SignalIdMismatch {
        offset: u64,
        expected: u32,
        found: u32,
    },

    #[error("unexpected block id {found:#x} at offset {offset} in windowed value data")]
    UnexpectedBlockId { offset: u64, found: u32 },

    #[error("window of {window} bytes cannot hold {required} bytes of records")]
    WindowOverrun { window: u32, required: u32 },

    #[error("value chunk runs past the declared sweep: {declared} points declared, chunk ends at {end}")]
    SweepOverrun { declared: usize, end: usize },

    #[error("missing required property: {name}")]
    MissingProperty { name: &'static str },

    #[error("invalid UTF-8 in string data")]
    InvalidUtf8,

    #[error("signal not found: {0}")]
    SignalNotFound(String),

    #[error("signal '{signal}' has no field named '{field}'")]
    FieldNotFound { signal: String, field: String },

    #[error("cast mismatch: expected {expected}, found {found}")]
    CastMismatch { expected: String, found: String },
}

pub type Result<T> = std::result::Result<T, PsfError>;
