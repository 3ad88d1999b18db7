//! In-memory values of dynamically described messages.

use crate::descriptor::{MemberKind, MessageDescriptor, PrimitiveKind};

/// A single member value. Fixed arrays and sequences both use `Array`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Octet(u8),
    Char(u8),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    String(String),
    Message(DynamicMessage),
    Array(Vec<Value>),
}

impl Value {
    /// The zero value of `kind`: `false`, `0`, empty strings and sequences,
    /// default-filled fixed arrays and nested messages.
    pub fn default_for(kind: &MemberKind) -> Self {
        match kind {
            MemberKind::Primitive(p) => match p {
                PrimitiveKind::Bool => Value::Bool(false),
                PrimitiveKind::Octet => Value::Octet(0),
                PrimitiveKind::Char => Value::Char(0),
                PrimitiveKind::Int8 => Value::Int8(0),
                PrimitiveKind::UInt8 => Value::UInt8(0),
                PrimitiveKind::Int16 => Value::Int16(0),
                PrimitiveKind::UInt16 => Value::UInt16(0),
                PrimitiveKind::Int32 => Value::Int32(0),
                PrimitiveKind::UInt32 => Value::UInt32(0),
                PrimitiveKind::Int64 => Value::Int64(0),
                PrimitiveKind::UInt64 => Value::UInt64(0),
                PrimitiveKind::Float32 => Value::Float32(0.0),
                PrimitiveKind::Float64 => Value::Float64(0.0),
            },
            MemberKind::String { .. } => Value::String(String::new()),
            MemberKind::Message(descriptor) => Value::Message(DynamicMessage::new(descriptor)),
            MemberKind::Array { element, len } => {
                Value::Array((0..*len).map(|_| Value::default_for(element)).collect())
            }
            MemberKind::Sequence { .. } => Value::Array(Vec::new()),
        }
    }

    /// Variant name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Octet(_) => "octet",
            Value::Char(_) => "char",
            Value::Int8(_) => "int8",
            Value::UInt8(_) => "uint8",
            Value::Int16(_) => "int16",
            Value::UInt16(_) => "uint16",
            Value::Int32(_) => "int32",
            Value::UInt32(_) => "uint32",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::Float32(_) => "float32",
            Value::Float64(_) => "float64",
            Value::String(_) => "string",
            Value::Message(_) => "message",
            Value::Array(_) => "array",
        }
    }

    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! impl_from_value {
    ($ty:ty => $variant:ident) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_from_value! { bool => Bool }
impl_from_value! { i8 => Int8 }
impl_from_value! { i16 => Int16 }
impl_from_value! { u16 => UInt16 }
impl_from_value! { i32 => Int32 }
impl_from_value! { u32 => UInt32 }
impl_from_value! { i64 => Int64 }
impl_from_value! { u64 => UInt64 }
impl_from_value! { f32 => Float32 }
impl_from_value! { f64 => Float64 }
impl_from_value! { String => String }
impl_from_value! { DynamicMessage => Message }
impl_from_value! { Vec<Value> => Array }

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

/// A message instance laid out by a `MessageDescriptor`: one value per
/// member, in member order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DynamicMessage {
    values: Vec<Value>,
}

impl DynamicMessage {
    /// Allocates an instance with every member at its default.
    pub fn new(descriptor: &MessageDescriptor) -> Self {
        Self {
            values: descriptor
                .members()
                .iter()
                .map(|m| Value::default_for(&m.kind))
                .collect(),
        }
    }

    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Vec<Value> {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.values.get_mut(index)
    }

    /// Looks a member up by name.
    pub fn field<'a>(&'a self, descriptor: &MessageDescriptor, name: &str) -> Option<&'a Value> {
        descriptor
            .member_index(name)
            .and_then(|index| self.values.get(index))
    }

    /// Replaces a member by name, returning the previous value. Returns
    /// `None` and leaves the message untouched when no member has that name.
    pub fn set(
        &mut self,
        descriptor: &MessageDescriptor,
        name: &str,
        value: impl Into<Value>,
    ) -> Option<Value> {
        let slot = self.values.get_mut(descriptor.member_index(name)?)?;
        Some(std::mem::replace(slot, value.into()))
    }
}
