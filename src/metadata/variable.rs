// src/metadata/variable.rs
use crate::error::{PsfError, Result};
use crate::metadata::{Properties, RecordLayout, TypeRegistry};
use crate::raw_data::PsfCursor;
use crate::types::ElementId;
use std::io::{Read, Seek};

/// A declared variable: a name bound to an entry of the type table.
///
/// The layout is resolved from the registry when the variable is decoded, so
/// a variable can only follow the TYPE section. The same shape serves sweep
/// variables, traces and the no-sweep value variables.
#[derive(Debug, Clone)]
pub struct Variable {
    pub id: u32,
    pub name: String,
    pub type_id: u32,
    pub layout: RecordLayout,
    pub properties: Properties,
}

impl Variable {
    /// Decode one variable declaration. A non-DATA tag is rewound and
    /// reported as `None` ("no more variables").
    pub fn try_read<R: Read + Seek>(
        cursor: &mut PsfCursor<R>,
        types: &TypeRegistry,
    ) -> Result<Option<Variable>> {
        let tag = cursor.read_u32()?;
        if tag != ElementId::Data as u32 {
            cursor.unread(4)?;
            return Ok(None);
        }

        let id = cursor.read_u32()?;
        let name = cursor.read_string()?;
        let type_id = cursor.read_u32()?;
        let layout = types
            .layout(type_id)
            .ok_or(PsfError::UnknownTypeId { id: type_id })?
            .clone();
        let properties = Properties::read_dictionary(cursor)?;

        Ok(Some(Variable {
            id,
            name,
            type_id,
            layout,
            properties,
        }))
    }

    /// Byte width of one record of this variable
    pub fn record_size(&self) -> usize {
        self.layout.size()
    }
}

/// Trace variables that physically share one interleaved record on disk.
///
/// The group's record layout is the concatenation of member layouts in
/// declared order; members alias sub-ranges of the group's storage when the
/// value section is decoded.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: u32,
    pub name: String,
    pub members: Vec<Variable>,
    pub layout: RecordLayout,
}

impl Group {
    /// Decode one group declaration. A non-GROUP tag is rewound and reported
    /// as `None`; a declared member count that is not met is a fatal error,
    /// never a silent truncation.
    pub fn try_read<R: Read + Seek>(
        cursor: &mut PsfCursor<R>,
        types: &TypeRegistry,
    ) -> Result<Option<Group>> {
        let tag = cursor.read_u32()?;
        if tag != ElementId::Group as u32 {
            cursor.unread(4)?;
            return Ok(None);
        }

        let id = cursor.read_u32()?;
        let name = cursor.read_string()?;
        let count = cursor.read_u32()?;

        let mut members = Vec::with_capacity(count as usize);
        for found in 0..count {
            match Variable::try_read(cursor, types)? {
                Some(member) => members.push(member),
                None => {
                    return Err(PsfError::GroupLengthMismatch {
                        group: name,
                        expected: count,
                        found,
                    })
                }
            }
        }

        let layout = RecordLayout::concat(members.iter().map(|m| &m.layout));
        Ok(Some(Group {
            id,
            name,
            members,
            layout,
        }))
    }

    /// Byte width of one interleaved group record
    pub fn record_size(&self) -> usize {
        self.layout.size()
    }
}

/// One entry of the TRACE section: a group or a bare variable
#[derive(Debug, Clone)]
pub enum TraceItem {
    Group(Group),
    Single(Variable),
}

impl TraceItem {
    /// Decode the next trace entry, trying the group grammar first. `None`
    /// means neither tag matched and the sequence is over.
    pub fn try_read<R: Read + Seek>(
        cursor: &mut PsfCursor<R>,
        types: &TypeRegistry,
    ) -> Result<Option<TraceItem>> {
        if let Some(group) = Group::try_read(cursor, types)? {
            return Ok(Some(TraceItem::Group(group)));
        }
        if let Some(variable) = Variable::try_read(cursor, types)? {
            return Ok(Some(TraceItem::Single(variable)));
        }
        Ok(None)
    }

    pub fn layout(&self) -> &RecordLayout {
        match self {
            TraceItem::Group(group) => &group.layout,
            TraceItem::Single(variable) => &variable.layout,
        }
    }
}
