//! Typed attribute model
//!
//! [`Attribute`] is the only vocabulary exchanged across the reflection
//! boundary: a name plus an [`AttributeValue`], which is either a single
//! element or an ordered array of one of the supported element types.
//!
//! The accessors are lenient about arity (a one-element array reads as a
//! scalar and a scalar reads as a one-element array) but strict about element
//! type, so a mismatched attribute is simply not applied.

use std::fmt;

use super::registry::Serialized;
use super::wire::DataKind;
use crate::foundation::math::{quat_from_xyzw, quat_to_xyzw, Quat, Vec3, Vec4};

/// Object identifier, local to a file before remapping and global afterwards
pub type Identifier = u32;

/// Reserved "unset or unresolved" identifier
pub const NULL_ID: Identifier = 0;

/// Value carried by an [`Attribute`]
pub enum AttributeValue {
    /// Signed 32-bit integer
    Int(i32),
    /// Signed 32-bit integer array
    IntArray(Vec<i32>),
    /// Unsigned 32-bit integer
    UInt(u32),
    /// Unsigned 32-bit integer array
    UIntArray(Vec<u32>),
    /// Signed 16-bit integer
    Short(i16),
    /// Signed 16-bit integer array
    ShortArray(Vec<i16>),
    /// Unsigned 16-bit integer
    UShort(u16),
    /// Unsigned 16-bit integer array
    UShortArray(Vec<u16>),
    /// 32-bit float
    Float(f32),
    /// 32-bit float array
    FloatArray(Vec<f32>),
    /// Byte
    Byte(u8),
    /// Byte array
    ByteArray(Vec<u8>),
    /// String
    String(String),
    /// String array
    StringArray(Vec<String>),
    /// Identifier
    Id(Identifier),
    /// Identifier array
    IdArray(Vec<Identifier>),
    /// Live nested objects
    Class(Vec<Box<dyn Serialized>>),
}

impl AttributeValue {
    /// Wire kind this value encodes as
    pub fn kind(&self) -> DataKind {
        match self {
            Self::Int(_) | Self::IntArray(_) => DataKind::Int,
            Self::UInt(_) | Self::UIntArray(_) => DataKind::UInt,
            Self::Short(_) | Self::ShortArray(_) => DataKind::Short,
            Self::UShort(_) | Self::UShortArray(_) => DataKind::UShort,
            Self::Float(_) | Self::FloatArray(_) => DataKind::Float,
            Self::Byte(_) | Self::ByteArray(_) => DataKind::Byte,
            Self::String(_) | Self::StringArray(_) => DataKind::Char,
            Self::Id(_) | Self::IdArray(_) => DataKind::Uid,
            Self::Class(_) => DataKind::SerializedClass,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            Self::Int(_)
            | Self::UInt(_)
            | Self::Short(_)
            | Self::UShort(_)
            | Self::Float(_)
            | Self::Byte(_)
            | Self::String(_)
            | Self::Id(_) => 1,
            Self::IntArray(v) => v.len(),
            Self::UIntArray(v) => v.len(),
            Self::ShortArray(v) => v.len(),
            Self::UShortArray(v) => v.len(),
            Self::FloatArray(v) => v.len(),
            Self::ByteArray(v) => v.len(),
            Self::StringArray(v) => v.len(),
            Self::IdArray(v) => v.len(),
            Self::Class(v) => v.len(),
        }
    }

    /// True for arrays with no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Single float
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::FloatArray(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Float array
    pub fn as_floats(&self) -> Option<Vec<f32>> {
        match self {
            Self::Float(v) => Some(vec![*v]),
            Self::FloatArray(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// First three floats as a vector
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::FloatArray(v) if v.len() >= 3 => Some(Vec3::new(v[0], v[1], v[2])),
            _ => None,
        }
    }

    /// First four floats as a vector
    pub fn as_vec4(&self) -> Option<Vec4> {
        match self {
            Self::FloatArray(v) if v.len() >= 4 => Some(Vec4::new(v[0], v[1], v[2], v[3])),
            _ => None,
        }
    }

    /// First four floats as an `[x, y, z, w]` quaternion
    pub fn as_quat(&self) -> Option<Quat> {
        self.as_vec4().map(|v| quat_from_xyzw(v.x, v.y, v.z, v.w))
    }

    /// Single byte
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Self::Byte(v) => Some(*v),
            Self::ByteArray(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Any single integer kind read as a flag
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Byte(v) => Some(*v != 0),
            Self::UInt(v) => Some(*v != 0),
            Self::Int(v) => Some(*v != 0),
            Self::UShort(v) => Some(*v != 0),
            Self::Short(v) => Some(*v != 0),
            Self::ByteArray(v) if v.len() == 1 => Some(v[0] != 0),
            _ => None,
        }
    }

    /// Single unsigned 16-bit integer
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Self::UShort(v) => Some(*v),
            Self::UShortArray(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Single signed 16-bit integer
    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Self::Short(v) => Some(*v),
            Self::ShortArray(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Single unsigned 32-bit integer
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::UIntArray(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Unsigned 32-bit integer array
    pub fn as_u32s(&self) -> Option<Vec<u32>> {
        match self {
            Self::UInt(v) => Some(vec![*v]),
            Self::UIntArray(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Single signed 32-bit integer
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::IntArray(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Single identifier
    pub fn as_id(&self) -> Option<Identifier> {
        match self {
            Self::Id(v) => Some(*v),
            Self::IdArray(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Identifier array
    pub fn as_ids(&self) -> Option<Vec<Identifier>> {
        match self {
            Self::Id(v) => Some(vec![*v]),
            Self::IdArray(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Single string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            Self::StringArray(v) if v.len() == 1 => Some(&v[0]),
            _ => None,
        }
    }

    /// String array
    pub fn as_strings(&self) -> Option<Vec<String>> {
        match self {
            Self::String(v) => Some(vec![v.clone()]),
            Self::StringArray(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Take the nested objects out of a class value
    pub fn into_instances(self) -> Option<Vec<Box<dyn Serialized>>> {
        match self {
            Self::Class(instances) => Some(instances),
            _ => None,
        }
    }
}

impl Clone for AttributeValue {
    fn clone(&self) -> Self {
        match self {
            Self::Int(v) => Self::Int(*v),
            Self::IntArray(v) => Self::IntArray(v.clone()),
            Self::UInt(v) => Self::UInt(*v),
            Self::UIntArray(v) => Self::UIntArray(v.clone()),
            Self::Short(v) => Self::Short(*v),
            Self::ShortArray(v) => Self::ShortArray(v.clone()),
            Self::UShort(v) => Self::UShort(*v),
            Self::UShortArray(v) => Self::UShortArray(v.clone()),
            Self::Float(v) => Self::Float(*v),
            Self::FloatArray(v) => Self::FloatArray(v.clone()),
            Self::Byte(v) => Self::Byte(*v),
            Self::ByteArray(v) => Self::ByteArray(v.clone()),
            Self::String(v) => Self::String(v.clone()),
            Self::StringArray(v) => Self::StringArray(v.clone()),
            Self::Id(v) => Self::Id(*v),
            Self::IdArray(v) => Self::IdArray(v.clone()),
            Self::Class(v) => Self::Class(v.iter().map(|i| i.clone_boxed()).collect()),
        }
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::IntArray(a), Self::IntArray(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::UIntArray(a), Self::UIntArray(b)) => a == b,
            (Self::Short(a), Self::Short(b)) => a == b,
            (Self::ShortArray(a), Self::ShortArray(b)) => a == b,
            (Self::UShort(a), Self::UShort(b)) => a == b,
            (Self::UShortArray(a), Self::UShortArray(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::FloatArray(a), Self::FloatArray(b)) => a == b,
            (Self::Byte(a), Self::Byte(b)) => a == b,
            (Self::ByteArray(a), Self::ByteArray(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::StringArray(a), Self::StringArray(b)) => a == b,
            (Self::Id(a), Self::Id(b)) => a == b,
            (Self::IdArray(a), Self::IdArray(b)) => a == b,
            (Self::Class(a), Self::Class(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| {
                        x.type_name() == y.type_name()
                            && x.unique_id() == y.unique_id()
                            && x.get_all_attributes() == y.get_all_attributes()
                    })
            }
            _ => false,
        }
    }
}

impl fmt::Debug for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::IntArray(v) => f.debug_tuple("IntArray").field(v).finish(),
            Self::UInt(v) => f.debug_tuple("UInt").field(v).finish(),
            Self::UIntArray(v) => f.debug_tuple("UIntArray").field(v).finish(),
            Self::Short(v) => f.debug_tuple("Short").field(v).finish(),
            Self::ShortArray(v) => f.debug_tuple("ShortArray").field(v).finish(),
            Self::UShort(v) => f.debug_tuple("UShort").field(v).finish(),
            Self::UShortArray(v) => f.debug_tuple("UShortArray").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::FloatArray(v) => f.debug_tuple("FloatArray").field(v).finish(),
            Self::Byte(v) => f.debug_tuple("Byte").field(v).finish(),
            Self::ByteArray(v) => f.debug_tuple("ByteArray").field(v).finish(),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::StringArray(v) => f.debug_tuple("StringArray").field(v).finish(),
            Self::Id(v) => f.debug_tuple("Id").field(v).finish(),
            Self::IdArray(v) => f.debug_tuple("IdArray").field(v).finish(),
            Self::Class(v) => f.debug_tuple("Class").field(v).finish(),
        }
    }
}

/// Named, typed attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    /// Attribute name, matched against a type's setters
    pub name: String,
    /// Attribute value
    pub value: AttributeValue,
}

impl Attribute {
    /// Create an attribute
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Single float
    pub fn float(name: impl Into<String>, value: f32) -> Self {
        Self::new(name, AttributeValue::Float(value))
    }

    /// Float array
    pub fn floats(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self::new(name, AttributeValue::FloatArray(values))
    }

    /// Vector as a three-float array
    pub fn vec3(name: impl Into<String>, value: &Vec3) -> Self {
        Self::floats(name, vec![value.x, value.y, value.z])
    }

    /// Quaternion as an `[x, y, z, w]` float array
    pub fn quat(name: impl Into<String>, value: &Quat) -> Self {
        Self::floats(name, quat_to_xyzw(value).to_vec())
    }

    /// Single byte
    pub fn byte(name: impl Into<String>, value: u8) -> Self {
        Self::new(name, AttributeValue::Byte(value))
    }

    /// Flag stored as a byte
    pub fn flag(name: impl Into<String>, value: bool) -> Self {
        Self::byte(name, u8::from(value))
    }

    /// Single unsigned 16-bit integer
    pub fn ushort(name: impl Into<String>, value: u16) -> Self {
        Self::new(name, AttributeValue::UShort(value))
    }

    /// Single unsigned 32-bit integer
    pub fn uint(name: impl Into<String>, value: u32) -> Self {
        Self::new(name, AttributeValue::UInt(value))
    }

    /// Unsigned 32-bit integer array
    pub fn uints(name: impl Into<String>, values: Vec<u32>) -> Self {
        Self::new(name, AttributeValue::UIntArray(values))
    }

    /// Single identifier
    pub fn id(name: impl Into<String>, value: Identifier) -> Self {
        Self::new(name, AttributeValue::Id(value))
    }

    /// Identifier array
    pub fn ids(name: impl Into<String>, values: Vec<Identifier>) -> Self {
        Self::new(name, AttributeValue::IdArray(values))
    }

    /// Single string
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, AttributeValue::String(value.into()))
    }

    /// String array
    pub fn strings(name: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(name, AttributeValue::StringArray(values))
    }

    /// Nested objects
    pub fn class(name: impl Into<String>, instances: Vec<Box<dyn Serialized>>) -> Self {
        Self::new(name, AttributeValue::Class(instances))
    }
}

/// Store `value` into `slot` when present, reporting whether it was
pub(crate) fn assign<T>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) => {
            *slot = value;
            true
        }
        None => false,
    }
}
