// src/reader/mod.rs
mod signal_reader;
mod sync_reader;

pub use signal_reader::Signal;
pub use sync_reader::{PsfReader, ReadSeek, SWEEP_POINTS_PROPERTY, WINDOW_SIZE_PROPERTY};
