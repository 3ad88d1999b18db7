//! Runtime descriptions of message layouts.

use std::{fmt, sync::Arc, sync::OnceLock};

/// Fixed-width scalar kinds.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PrimitiveKind {
    Bool,
    Octet,
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl PrimitiveKind {
    /// Encoded width in bytes, which is also the natural alignment.
    pub const fn width(self) -> u64 {
        match self {
            PrimitiveKind::Bool
            | PrimitiveKind::Octet
            | PrimitiveKind::Char
            | PrimitiveKind::Int8
            | PrimitiveKind::UInt8 => 1,
            PrimitiveKind::Int16 | PrimitiveKind::UInt16 => 2,
            PrimitiveKind::Int32 | PrimitiveKind::UInt32 | PrimitiveKind::Float32 => 4,
            PrimitiveKind::Int64 | PrimitiveKind::UInt64 | PrimitiveKind::Float64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "boolean",
            PrimitiveKind::Octet => "octet",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int8 => "int8",
            PrimitiveKind::UInt8 => "uint8",
            PrimitiveKind::Int16 => "int16",
            PrimitiveKind::UInt16 => "uint16",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::UInt32 => "uint32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::UInt64 => "uint64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
        }
    }
}

/// Whether a type has a fixed layout and whether its size has a static
/// upper bound.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Classification {
    pub plain: bool,
    pub bounded: bool,
}

impl Classification {
    pub const PLAIN: Self = Self {
        plain: true,
        bounded: true,
    };

    pub fn combine(self, other: Self) -> Self {
        Self {
            plain: self.plain && other.plain,
            bounded: self.bounded && other.bounded,
        }
    }
}

/// The shape of a single member.
#[derive(Clone, Debug)]
pub enum MemberKind {
    Primitive(PrimitiveKind),
    /// A string, optionally limited to `bound` bytes (terminator excluded).
    String { bound: Option<usize> },
    Message(Arc<MessageDescriptor>),
    Array { element: Box<MemberKind>, len: usize },
    Sequence {
        element: Box<MemberKind>,
        bound: Option<usize>,
    },
}

impl MemberKind {
    pub fn string() -> Self {
        MemberKind::String { bound: None }
    }

    pub fn bounded_string(bound: usize) -> Self {
        MemberKind::String { bound: Some(bound) }
    }

    pub fn array(element: MemberKind, len: usize) -> Self {
        MemberKind::Array {
            element: Box::new(element),
            len,
        }
    }

    pub fn sequence(element: MemberKind) -> Self {
        MemberKind::Sequence {
            element: Box::new(element),
            bound: None,
        }
    }

    pub fn bounded_sequence(element: MemberKind, bound: usize) -> Self {
        MemberKind::Sequence {
            element: Box::new(element),
            bound: Some(bound),
        }
    }

    pub fn classification(&self) -> Classification {
        match self {
            MemberKind::Primitive(_) => Classification::PLAIN,
            MemberKind::String { bound } => Classification {
                plain: false,
                bounded: bound.is_some(),
            },
            MemberKind::Message(descriptor) => descriptor.classification(),
            MemberKind::Array { element, .. } => element.classification(),
            MemberKind::Sequence { element, bound } => Classification {
                plain: false,
                bounded: bound.is_some() && element.classification().bounded,
            },
        }
    }

    /// Smallest number of bytes one value of this kind occupies on the wire,
    /// ignoring alignment.
    pub fn min_wire_size(&self) -> u64 {
        match self {
            MemberKind::Primitive(p) => p.width(),
            MemberKind::String { .. } => 5,
            MemberKind::Message(descriptor) => descriptor
                .members()
                .iter()
                .map(|m| m.kind.min_wire_size())
                .sum::<u64>()
                .max(1),
            MemberKind::Array { element, len } => {
                element.min_wire_size().saturating_mul(*len as u64)
            }
            MemberKind::Sequence { .. } => 4,
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MemberKind::Primitive(p) => f.write_str(p.name()),
            MemberKind::String { bound: None } => f.write_str("string"),
            MemberKind::String { bound: Some(b) } => write!(f, "string<{}>", b),
            MemberKind::Message(descriptor) => write!(f, "{}", descriptor.full_name()),
            MemberKind::Array { element, len } => write!(f, "{}[{}]", element, len),
            MemberKind::Sequence {
                element,
                bound: None,
            } => write!(f, "sequence<{}>", element),
            MemberKind::Sequence {
                element,
                bound: Some(b),
            } => write!(f, "sequence<{}, {}>", element, b),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MemberDescriptor {
    pub name: String,
    pub kind: MemberKind,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// An ordered member table. Member order is the wire order.
#[derive(Clone, Debug)]
pub struct MessageDescriptor {
    namespace: String,
    name: String,
    members: Vec<MemberDescriptor>,
    classification: OnceLock<Classification>,
}

impl MessageDescriptor {
    /// `namespace` uses the `__` separator, e.g. `geometry_msgs__msg`.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            members: Vec::new(),
            classification: OnceLock::new(),
        }
    }

    pub fn with_members(
        namespace: impl Into<String>,
        name: impl Into<String>,
        members: Vec<MemberDescriptor>,
    ) -> Self {
        Self {
            members,
            ..Self::new(namespace, name)
        }
    }

    /// Appends a member.
    pub fn member(mut self, name: impl Into<String>, kind: MemberKind) -> Self {
        self.members.push(MemberDescriptor::new(name, kind));
        self.classification = OnceLock::new();
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `namespace/name` with the namespace left untranslated.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.namespace, self.name)
        }
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member_index(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }

    /// Computed on first use and cached.
    pub fn classification(&self) -> Classification {
        *self.classification.get_or_init(|| {
            self.members
                .iter()
                .fold(Classification::PLAIN, |acc, m| {
                    acc.combine(m.kind.classification())
                })
        })
    }

    pub fn is_plain(&self) -> bool {
        self.classification().plain
    }

    pub fn is_bounded(&self) -> bool {
        self.classification().bounded
    }
}
