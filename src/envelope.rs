//! Data handed across the transport boundary for one (de)serialize call.

use crate::encapsulation::EncapsulationKind;
use crate::value::DynamicMessage;

/// Source of one serialize call.
///
/// `Typed` carries a value with a serde implementation; `T` defaults to `()`
/// for callers that only deal in raw buffers and dynamic messages.
#[derive(Debug)]
pub enum SerializedData<'a, T: ?Sized = ()> {
    /// An already encoded payload, copied verbatim.
    Raw(&'a [u8]),
    Dynamic(&'a DynamicMessage),
    Typed(&'a T),
}

impl<'a, T: ?Sized> Clone for SerializedData<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T: ?Sized> Copy for SerializedData<'a, T> {}

/// Destination of one deserialize call.
#[derive(Debug)]
pub enum SerializedDataMut<'a, T: ?Sized = ()> {
    /// Receives the payload bytes verbatim.
    Raw(&'a mut Vec<u8>),
    Dynamic(&'a mut DynamicMessage),
    Typed(&'a mut T),
}

/// A transport buffer with a fixed capacity.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SerializedPayload {
    data: Vec<u8>,
    length: usize,
    encapsulation: EncapsulationKind,
}

impl SerializedPayload {
    pub fn new(max_size: usize) -> Self {
        Self {
            data: vec![0; max_size],
            length: 0,
            encapsulation: EncapsulationKind::CdrBe,
        }
    }

    /// Wraps a received payload; the capacity is its length.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let encapsulation = EncapsulationKind::from_header(bytes)
            .map(|(kind, _)| kind)
            .unwrap_or(EncapsulationKind::CdrBe);
        Self {
            data: bytes.to_vec(),
            length: bytes.len(),
            encapsulation,
        }
    }

    /// The written part of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.length]
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn max_size(&self) -> usize {
        self.data.len()
    }

    pub fn encapsulation(&self) -> EncapsulationKind {
        self.encapsulation
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub(crate) fn set_written(&mut self, length: usize, encapsulation: EncapsulationKind) {
        self.length = length.min(self.data.len());
        self.encapsulation = encapsulation;
    }
}
