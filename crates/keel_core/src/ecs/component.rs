// component.rs - Runtime component descriptors
//
// Components are described at runtime (name + ordered field list), not as
// Rust types. The World assigns each descriptor an index at construction
// and builds column storage from the declared field layout. This keeps the
// engine usable from hosts that define their schemas externally.

use serde::{Deserialize, Serialize};

/// Primitive type tag for a single component field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    U8,
    U16,
    U32,
    I32,
    F32,
}

impl FieldKind {
    /// Byte width of one value of this kind.
    #[inline]
    pub fn width(self) -> usize {
        match self {
            FieldKind::U8 => 1,
            FieldKind::U16 => 2,
            FieldKind::U32 | FieldKind::I32 | FieldKind::F32 => 4,
        }
    }

    /// The zero/default value for this kind.
    #[inline]
    pub fn zero(self) -> Value {
        match self {
            FieldKind::U8 => Value::U8(0),
            FieldKind::U16 => Value::U16(0),
            FieldKind::U32 => Value::U32(0),
            FieldKind::I32 => Value::I32(0),
            FieldKind::F32 => Value::F32(0.0),
        }
    }
}

/// A dynamically typed field value.
///
/// Records move through the generic API as slices of these; hot systems
/// bypass them entirely via [`FieldRef`](crate::ecs::FieldRef).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    I32(i32),
    F32(f32),
}

impl Value {
    #[inline]
    pub fn kind(self) -> FieldKind {
        match self {
            Value::U8(_) => FieldKind::U8,
            Value::U16(_) => FieldKind::U16,
            Value::U32(_) => FieldKind::U32,
            Value::I32(_) => FieldKind::I32,
            Value::F32(_) => FieldKind::F32,
        }
    }

    #[inline]
    pub fn as_u8(self) -> Option<u8> {
        match self {
            Value::U8(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u16(self) -> Option<u16> {
        match self {
            Value::U16(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_u32(self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i32(self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f32(self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(v),
            _ => None,
        }
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::U32(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

/// One declared field of a component: stable name plus primitive kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

/// Runtime description of a component layout.
///
/// Field order is significant: it defines the order of column arrays and of
/// values in a [`Record`](crate::ecs::Record). Validation (unique component
/// names, unique field names) happens when the World is constructed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    name: String,
    fields: Vec<FieldDescriptor>,
}

impl ComponentDescriptor {
    /// Start a descriptor with no fields (a pure tag component).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field. Order of calls is the column order.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Total byte width of one record (informational; storage is columnar).
    pub fn stride(&self) -> usize {
        self.fields.iter().map(|f| f.kind.width()).sum()
    }
}
