//! Port layouts: ordered, named, fixed-width fields.

use crate::error::FlowError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One named field of a layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Field name, unique within its layout.
    pub name: String,
    /// Width in bits, at least 1.
    pub width: u32,
}

/// The payload structure of a port.
///
/// The first field occupies the least significant bits of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout {
    fields: Vec<Field>,
}

impl Layout {
    /// Builds a layout, rejecting duplicate names and zero widths.
    pub fn new<I, S>(fields: I) -> Result<Self, FlowError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for (name, width) in fields {
            let name = name.into();
            if width == 0 {
                return Err(FlowError::ZeroWidthField { field: name });
            }
            if !seen.insert(name.clone()) {
                return Err(FlowError::DuplicateField { field: name });
            }
            out.push(Field { name, width });
        }
        Ok(Self { fields: out })
    }

    /// A layout with a single field.
    pub fn single(name: impl Into<String>, width: u32) -> Result<Self, FlowError> {
        let name: String = name.into();
        Self::new([(name, width)])
    }

    /// Fields in declared order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Position of a field in declared order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Sum of all field widths.
    pub fn width(&self) -> u32 {
        self.fields.iter().map(|f| f.width).sum()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` for a layout without fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in declared order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// The sub-layout made of `names`, in the caller's order.
    ///
    /// Returns `None` if a name is not a field of this layout; a repeated name
    /// fails with [`FlowError::DuplicateField`].
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Option<Layout>, FlowError> {
        let mut picked = Vec::with_capacity(names.len());
        for name in names {
            match self.field(name.as_ref()) {
                Some(f) => picked.push((f.name.clone(), f.width)),
                None => return Ok(None),
            }
        }
        Layout::new(picked).map(Some)
    }
}
