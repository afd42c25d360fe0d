// tests/format_error_tests.rs
mod common;

use common::*;
use psf_rs::{ChunkId, DataKind, ElementId, PsfError, PsfReader};
use std::io::Cursor;

fn minimal_sweep_image() -> Vec<u8> {
    let mut b = PsfFileBuilder::new();
    put_sweep_header(&mut b, 1, None);
    put_double_type(&mut b, 8);
    put_sweep_var(&mut b, 1, "time", 8);

    b.begin_section(4);
    let major = b.begin_chunk(ChunkId::MajorSection);
    b.put_u32(ElementId::Data as u32);
    b.put_u32(1);
    b.put_f64(1.0);
    b.end_chunk(major);

    b.finish()
}

#[test]
fn test_corrupt_trailing_tag_fails_before_any_section() {
    let mut image = minimal_sweep_image();
    let tag_at = image.len() - 12;
    image[tag_at] = b'X';

    match PsfReader::from_reader(Cursor::new(image)) {
        Err(PsfError::NotPsf { found }) => assert!(found.starts_with('X')),
        other => panic!("expected NotPsf, got {:?}", other.err()),
    }
}

#[test]
fn test_trailer_only_file_has_no_sections() {
    // the smallest well-formed file: an empty data region, no directory
    let mut image = Vec::new();
    image.extend_from_slice(b"Clarissa");
    image.extend_from_slice(&0u32.to_be_bytes());

    let reader = PsfReader::from_reader(Cursor::new(image)).unwrap();
    assert!(reader.sections().is_empty());
    assert_eq!(reader.signal_count(), 0);
    assert!(reader.sweep().is_none());
}

#[test]
fn test_corrupt_data_size_is_fatal() {
    let mut image = minimal_sweep_image();
    let size_at = image.len() - 4;
    image[size_at..].copy_from_slice(&0xffff_fff0u32.to_be_bytes());

    match PsfReader::from_reader(Cursor::new(image)) {
        Err(PsfError::CorruptDirectory { .. }) => {}
        other => panic!("expected CorruptDirectory, got {:?}", other.err()),
    }
}

#[test]
fn test_tiny_file_is_not_psf() {
    match PsfReader::from_reader(Cursor::new(vec![1u8, 2, 3])) {
        Err(PsfError::NotPsf { .. }) => {}
        other => panic!("expected NotPsf, got {:?}", other.err()),
    }
}

#[test]
fn test_wrong_chunk_id_at_section_start() {
    let mut b = PsfFileBuilder::new();
    b.begin_section(0);
    let minor = b.begin_chunk(ChunkId::MinorSection); // major expected here
    b.end_chunk(minor);

    match PsfReader::from_reader(Cursor::new(b.finish())) {
        Err(PsfError::UnexpectedChunk {
            expected: 0x15,
            found: 0x16,
            ..
        }) => {}
        other => panic!("expected UnexpectedChunk, got {:?}", other.err()),
    }
}

#[test]
fn test_group_shorter_than_declared_is_fatal() {
    let mut b = PsfFileBuilder::new();
    put_sweep_header(&mut b, 1, None);
    put_double_type(&mut b, 8);
    put_sweep_var(&mut b, 1, "time", 8);

    b.begin_section(3);
    let major = b.begin_chunk(ChunkId::MajorSection);
    let minor = b.begin_chunk(ChunkId::MinorSection);
    b.group_header(5, "group", 3);
    b.variable(2, "vout", 8);
    b.variable(3, "vin", 8);
    b.put_u32(ChunkId::MinorSection as u32); // terminator where member 3 should be
    b.end_chunk(minor);
    b.end_chunk(major);

    match PsfReader::from_reader(Cursor::new(b.finish())) {
        Err(PsfError::GroupLengthMismatch {
            expected: 3,
            found: 2,
            ..
        }) => {}
        other => panic!("expected GroupLengthMismatch, got {:?}", other.err()),
    }
}

#[test]
fn test_multiple_sweep_variables_are_fatal() {
    let mut b = PsfFileBuilder::new();
    put_sweep_header(&mut b, 1, None);
    put_double_type(&mut b, 8);

    b.begin_section(2);
    let major = b.begin_chunk(ChunkId::MajorSection);
    b.variable(1, "freq", 8);
    b.variable(2, "temp", 8);
    b.end_chunk(major);

    match PsfReader::from_reader(Cursor::new(b.finish())) {
        Err(PsfError::MultipleSweepVariables { count: 2 }) => {}
        other => panic!("expected MultipleSweepVariables, got {:?}", other.err()),
    }
}

#[test]
fn test_interleave_tag_mismatch_is_fatal() {
    let mut b = PsfFileBuilder::new();
    put_sweep_header(&mut b, 1, None);
    put_double_type(&mut b, 8);
    put_sweep_var(&mut b, 1, "time", 8);

    b.begin_section(4);
    let major = b.begin_chunk(ChunkId::MajorSection);
    b.put_u32(ElementId::Group as u32); // DATA expected in the interleave
    b.put_u32(1);
    b.put_f64(1.0);
    b.end_chunk(major);

    match PsfReader::from_reader(Cursor::new(b.finish())) {
        Err(PsfError::UnexpectedElement {
            expected: 0x10,
            found: 0x11,
            ..
        }) => {}
        other => panic!("expected UnexpectedElement, got {:?}", other.err()),
    }
}

#[test]
fn test_interleave_id_mismatch_is_fatal() {
    let mut b = PsfFileBuilder::new();
    put_sweep_header(&mut b, 1, None);
    put_double_type(&mut b, 8);
    put_sweep_var(&mut b, 1, "time", 8);

    b.begin_section(4);
    let major = b.begin_chunk(ChunkId::MajorSection);
    b.put_u32(ElementId::Data as u32);
    b.put_u32(9); // the sweep variable's id is 1
    b.put_f64(1.0);
    b.end_chunk(major);

    match PsfReader::from_reader(Cursor::new(b.finish())) {
        Err(PsfError::SignalIdMismatch {
            expected: 1,
            found: 9,
            ..
        }) => {}
        other => panic!("expected SignalIdMismatch, got {:?}", other.err()),
    }
}

#[test]
fn test_variable_with_unknown_type_is_fatal() {
    let mut b = PsfFileBuilder::new();
    put_sweep_header(&mut b, 1, None);
    put_double_type(&mut b, 8);
    put_sweep_var(&mut b, 1, "time", 99);

    match PsfReader::from_reader(Cursor::new(b.finish())) {
        Err(PsfError::UnknownTypeId { id: 99 }) => {}
        other => panic!("expected UnknownTypeId, got {:?}", other.err()),
    }
}

#[test]
fn test_unknown_data_kind_in_type_table_is_fatal() {
    let mut b = PsfFileBuilder::new();
    put_sweep_header(&mut b, 1, None);

    b.begin_section(1);
    let major = b.begin_chunk(ChunkId::MajorSection);
    let minor = b.begin_chunk(ChunkId::MinorSection);
    b.put_u32(ElementId::Data as u32);
    b.put_u32(8);
    b.put_str("weird");
    b.put_u32(0);
    b.put_u32(0x07); // not a known kind code
    b.end_chunk(minor);
    b.end_chunk(major);

    match PsfReader::from_reader(Cursor::new(b.finish())) {
        Err(PsfError::UnknownDataKind { code: 0x07, .. }) => {}
        other => panic!("expected UnknownDataKind, got {:?}", other.err()),
    }
}

#[test]
fn test_string_typed_record_element_is_fatal() {
    let mut b = PsfFileBuilder::new();
    put_sweep_header(&mut b, 1, None);

    b.begin_section(1);
    let major = b.begin_chunk(ChunkId::MajorSection);
    let minor = b.begin_chunk(ChunkId::MinorSection);
    b.scalar_type(8, "label", DataKind::String);
    b.end_chunk(minor);
    b.end_chunk(major);

    match PsfReader::from_reader(Cursor::new(b.finish())) {
        Err(PsfError::Unsupported(message)) => assert!(message.contains("string")),
        other => panic!("expected Unsupported, got {:?}", other.err()),
    }
}

#[test]
fn test_missing_sweep_points_property_is_fatal() {
    let mut b = PsfFileBuilder::new();

    // header with no "PSF sweep points"
    b.begin_section(0);
    let major = b.begin_chunk(ChunkId::MajorSection);
    b.property_str("PSF style", "tran");
    b.end_chunk(major);

    put_double_type(&mut b, 8);
    put_sweep_var(&mut b, 1, "time", 8);

    b.begin_section(4);
    let major = b.begin_chunk(ChunkId::MajorSection);
    b.end_chunk(major);

    match PsfReader::from_reader(Cursor::new(b.finish())) {
        Err(PsfError::MissingProperty { name }) => assert_eq!(name, "PSF sweep points"),
        other => panic!("expected MissingProperty, got {:?}", other.err()),
    }
}

#[test]
fn test_strict_interleave_truncation_is_not_silent() {
    // two points declared, one triple present: the decode must fail rather
    // than return a half-filled sweep
    let mut b = PsfFileBuilder::new();
    put_sweep_header(&mut b, 2, None);
    put_double_type(&mut b, 8);
    put_sweep_var(&mut b, 1, "time", 8);

    b.begin_section(4);
    let major = b.begin_chunk(ChunkId::MajorSection);
    b.put_u32(ElementId::Data as u32);
    b.put_u32(1);
    b.put_f64(1.0);
    b.end_chunk(major);

    assert!(PsfReader::from_reader(Cursor::new(b.finish())).is_err());
}
