// src/metadata/property.rs
use crate::error::Result;
use crate::raw_data::PsfCursor;
use crate::types::PropertyKind;
use std::io::{Read, Seek};

/// A typed header or metadata value
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int(i32),
    Double(f64),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::String(_) => PropertyKind::String,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Double(_) => PropertyKind::Double,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            _ => None,
        }
    }
}

/// Represents a property with name and value
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Property {
            name: name.into(),
            value,
        }
    }

    /// Read one typed (name, value) entry.
    ///
    /// An unrecognized kind tag is the end-of-dictionary marker: it is rewound
    /// so the caller can consume it, and `None` is returned. This is normal
    /// control flow, never an error.
    pub fn try_read<R: Read + Seek>(cursor: &mut PsfCursor<R>) -> Result<Option<Property>> {
        let tag = cursor.read_u32()?;
        let kind = match PropertyKind::from_u32(tag) {
            Some(kind) => kind,
            None => {
                cursor.unread(4)?;
                return Ok(None);
            }
        };

        let name = cursor.read_string()?;
        let value = match kind {
            PropertyKind::String => PropertyValue::String(cursor.read_string()?),
            PropertyKind::Int => PropertyValue::Int(cursor.read_i32()?),
            PropertyKind::Double => PropertyValue::Double(cursor.read_f64()?),
        };

        Ok(Some(Property { name, value }))
    }
}

/// An ordered name → value mapping decoded from the typed-dictionary grammar.
///
/// The same grammar carries the file header, per-type and per-variable
/// property sets. Later duplicate names overwrite earlier values but keep the
/// original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<Property>,
}

impl Properties {
    pub fn new() -> Self {
        Properties::default()
    }

    /// Decode entries until the first unrecognized kind tag, which is left
    /// in place for the caller.
    pub fn read_dictionary<R: Read + Seek>(cursor: &mut PsfCursor<R>) -> Result<Properties> {
        let mut properties = Properties::new();
        while let Some(property) = Property::try_read(cursor)? {
            properties.insert(property);
        }
        Ok(properties)
    }

    pub fn insert(&mut self, property: Property) {
        match self.entries.iter_mut().find(|e| e.name == property.name) {
            Some(existing) => existing.value = property.value,
            None => self.entries.push(property),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropertyValue::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(PropertyValue::as_int)
    }

    pub fn get_double(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(PropertyValue::as_double)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ElementId;
    use std::io::Cursor;

    fn put_str(data: &mut Vec<u8>, s: &str) {
        data.extend_from_slice(&(s.len() as u32).to_be_bytes());
        data.extend_from_slice(s.as_bytes());
        let padding = crate::raw_data::string_padding(s.len());
        data.extend_from_slice(&vec![0u8; padding]);
    }

    fn sample_dictionary() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(PropertyKind::String as u32).to_be_bytes());
        put_str(&mut data, "PSF version");
        put_str(&mut data, "1.0");
        data.extend_from_slice(&(PropertyKind::Int as u32).to_be_bytes());
        put_str(&mut data, "PSF sweep points");
        data.extend_from_slice(&101i32.to_be_bytes());
        data.extend_from_slice(&(PropertyKind::Double as u32).to_be_bytes());
        put_str(&mut data, "tolerance");
        data.extend_from_slice(&1e-6f64.to_be_bytes());
        // terminator: the DATA element tag of whatever follows
        data.extend_from_slice(&(ElementId::Data as u32).to_be_bytes());
        data
    }

    #[test]
    fn test_read_dictionary() {
        let mut cursor = PsfCursor::new(Cursor::new(sample_dictionary()));
        let properties = Properties::read_dictionary(&mut cursor).unwrap();

        assert_eq!(properties.len(), 3);
        assert_eq!(properties.get_str("PSF version"), Some("1.0"));
        assert_eq!(properties.get_int("PSF sweep points"), Some(101));
        assert_eq!(properties.get_double("tolerance"), Some(1e-6));
        assert_eq!(properties.get("missing"), None);
    }

    #[test]
    fn test_terminator_is_rewound() {
        let data = sample_dictionary();
        let end = data.len() as u64;
        let mut cursor = PsfCursor::new(Cursor::new(data));
        Properties::read_dictionary(&mut cursor).unwrap();

        // the terminating tag is left for the caller
        assert_eq!(cursor.position().unwrap(), end - 4);
        assert_eq!(cursor.read_u32().unwrap(), ElementId::Data as u32);
    }

    #[test]
    fn test_decode_is_idempotent_from_saved_position() {
        let mut cursor = PsfCursor::new(Cursor::new(sample_dictionary()));
        let first = Properties::read_dictionary(&mut cursor).unwrap();
        cursor.seek_to(0).unwrap();
        let second = Properties::read_dictionary(&mut cursor).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duplicate_names_overwrite_in_place() {
        let mut properties = Properties::new();
        properties.insert(Property::new("a", PropertyValue::Int(1)));
        properties.insert(Property::new("b", PropertyValue::Int(2)));
        properties.insert(Property::new("a", PropertyValue::Int(3)));

        assert_eq!(properties.len(), 2);
        assert_eq!(properties.get_int("a"), Some(3));
        let order: Vec<&str> = properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_dictionary() {
        let mut cursor = PsfCursor::new(Cursor::new(vec![0, 0, 0, 0x15, 0, 0, 0, 0]));
        let properties = Properties::read_dictionary(&mut cursor).unwrap();
        assert!(properties.is_empty());
        assert_eq!(cursor.position().unwrap(), 0);
    }
}
