// src/lib.rs
//! # psf-rs
//!
//! A Rust library for reading PSF (Parameter Storage Format) files, the
//! binary container circuit simulators use to store parameter-sweep results.
//!
//! A PSF file carries a header of typed properties, a self-describing table
//! of (possibly nested) type definitions, an optional sweep-variable
//! declaration, a trace declaration table, and a value section holding the
//! numeric samples — either one self-describing record per variable, a strict
//! per-point interleave, or fixed-size byte windows with padding. The file is
//! located through a trailing table of contents next to the 8-byte
//! `Clarissa` tag, so decoding starts from the end.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use psf_rs::*;
//!
//! fn main() -> Result<()> {
//!     let reader = PsfReader::open("tran.tran")?;
//!
//!     // Header properties
//!     for property in reader.header_properties().iter() {
//!         println!("{}: {:?}", property.name, property.value);
//!     }
//!
//!     // The sweep and its traces
//!     let time = reader.sweep_values()?;
//!     for name in reader.signal_names() {
//!         println!("signal: {}", name);
//!     }
//!     let vout: Vec<f64> = reader.read_signal_data("vout")?;
//!     println!("{} points, first sample {}", time.len(), vout[0]);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Group members are views
//!
//! Traces declared inside a group share one interleaved record on disk and
//! one contiguous buffer in memory. [`Signal::values`] gathers a member's
//! strided samples; [`Signal::as_slice`] gives zero-copy access and is only
//! available for signals that own their whole record.

// Modules
pub mod error;
pub mod metadata;
pub mod raw_data;
pub mod reader;
pub mod types;

// Re-export commonly used types at the crate root for convenience
pub use error::{PsfError, Result};

// Type exports
pub use types::{ChunkId, Complex32, Complex64, DataKind, ElementId, PropertyKind, SectionId};

// Metadata exports
pub use metadata::{
    Properties, Property, PropertyValue, RecordLayout, SectionInfo, TypeDef, TypeRegistry,
    TypeShape, Variable, FILE_TAG,
};

// Raw data exports
pub use raw_data::{PsfCursor, RecordBuffer};

// Reader exports
pub use reader::{PsfReader, ReadSeek, Signal, SWEEP_POINTS_PROPERTY, WINDOW_SIZE_PROPERTY};

// Prelude module for glob imports
pub mod prelude {
    //! Convenient imports for common use cases.
    //!
    //! ```rust
    //! use psf_rs::prelude::*;
    //! ```

    pub use crate::error::{PsfError, Result};
    pub use crate::reader::{PsfReader, Signal};
    pub use crate::types::{Complex32, Complex64, DataKind};
}

/// The library version
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
