// src/metadata/type_def.rs
use crate::error::{PsfError, Result};
use crate::metadata::Properties;
use crate::raw_data::PsfCursor;
use crate::types::{DataKind, ElementId};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::io::{Read, Seek};

/// One field of a record layout: name plus primitive kind
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub kind: DataKind,
}

/// Canonical flattened byte layout of one record of a type, variable or group.
///
/// Fields are fixed-width primitives in declared order; nested struct fields
/// are flattened. The total size is the sum of the field widths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordLayout {
    fields: SmallVec<[FieldDef; 4]>,
    size: usize,
}

impl RecordLayout {
    /// Single-field layout for a scalar type. Kinds without a fixed width
    /// (string, array, tuple) cannot be record elements.
    pub fn scalar(name: &str, kind: DataKind) -> Result<RecordLayout> {
        let width = kind.fixed_size().ok_or_else(|| {
            PsfError::Unsupported(format!(
                "type kind '{}' cannot be a record element",
                kind.name()
            ))
        })?;
        let mut fields = SmallVec::new();
        fields.push(FieldDef {
            name: name.to_string(),
            kind,
        });
        Ok(RecordLayout {
            fields,
            size: width,
        })
    }

    /// Append another layout's fields after this one's
    pub fn extend(&mut self, other: &RecordLayout) {
        self.fields.extend(other.fields.iter().cloned());
        self.size += other.size;
    }

    /// Concatenation of layouts in order
    pub fn concat<'a>(layouts: impl IntoIterator<Item = &'a RecordLayout>) -> RecordLayout {
        let mut layout = RecordLayout::default();
        for other in layouts {
            layout.extend(other);
        }
        layout
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Total record width in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Byte offset of the field at `index` within one record
    pub fn offset_of(&self, index: usize) -> usize {
        self.fields[..index]
            .iter()
            .map(|f| f.kind.fixed_size().unwrap_or(0))
            .sum()
    }

    /// First field with the given name, with its byte offset
    pub fn field_offset(&self, name: &str) -> Option<(usize, &FieldDef)> {
        let mut offset = 0;
        for field in &self.fields {
            if field.name == name {
                return Some((offset, field));
            }
            offset += field.kind.fixed_size().unwrap_or(0);
        }
        None
    }
}

/// A type is either a scalar primitive or a struct of child types
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    Scalar(DataKind),
    /// Child type ids, resolvable through the registry
    Struct(Vec<u32>),
}

/// One entry of the TYPE section's self-describing type table
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub id: u32,
    pub name: String,
    /// Array flag as stored; carried but not used by decoding
    pub array_flag: u32,
    pub shape: TypeShape,
    pub properties: Properties,
    layout: RecordLayout,
}

impl TypeDef {
    /// The memoized record layout, computed once when the type was decoded
    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Decode one type definition and register it (children included) in the
    /// registry. A non-DATA tag is rewound and reported as `None`.
    ///
    /// Struct bodies reuse the same grammar recursively: child definitions
    /// follow until a non-DATA tag terminates the list, and each child lands
    /// both in the parent's field list and in the global id table.
    pub fn try_read<R: Read + Seek>(
        cursor: &mut PsfCursor<R>,
        registry: &mut TypeRegistry,
    ) -> Result<Option<u32>> {
        let tag = cursor.read_u32()?;
        if tag != ElementId::Data as u32 {
            cursor.unread(4)?;
            return Ok(None);
        }

        let id = cursor.read_u32()?;
        let name = cursor.read_string()?;
        let array_flag = cursor.read_u32()?;

        let kind_offset = cursor.position()?;
        let code = cursor.read_u32()?;
        let kind = DataKind::from_u32(code).ok_or(PsfError::UnknownDataKind {
            offset: kind_offset,
            code,
        })?;

        let (shape, layout) = if kind == DataKind::Struct {
            let mut children = Vec::new();
            let mut layout = RecordLayout::default();
            while let Some(child_id) = TypeDef::try_read(cursor, registry)? {
                let child_layout = registry
                    .layout(child_id)
                    .ok_or(PsfError::UnknownTypeId { id: child_id })?;
                layout.extend(child_layout);
                children.push(child_id);
            }
            (TypeShape::Struct(children), layout)
        } else {
            (TypeShape::Scalar(kind), RecordLayout::scalar(&name, kind)?)
        };

        let properties = Properties::read_dictionary(cursor)?;

        registry.register(TypeDef {
            id,
            name,
            array_flag,
            shape,
            properties,
            layout,
        });
        Ok(Some(id))
    }
}

/// Central arena of decoded type definitions, indexed by type id.
///
/// Struct children reference their types by id through this registry; layouts
/// are shared from here rather than deep-copied.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    defs: Vec<TypeDef>,
    by_id: HashMap<u32, usize>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// Register a decoded type; a later definition under the same id replaces
    /// the earlier one
    pub fn register(&mut self, def: TypeDef) {
        match self.by_id.get(&def.id) {
            Some(&index) => self.defs[index] = def,
            None => {
                self.by_id.insert(def.id, self.defs.len());
                self.defs.push(def);
            }
        }
    }

    pub fn get(&self, id: u32) -> Option<&TypeDef> {
        self.by_id.get(&id).map(|&index| &self.defs[index])
    }

    pub fn layout(&self, id: u32) -> Option<&RecordLayout> {
        self.get(id).map(TypeDef::layout)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
