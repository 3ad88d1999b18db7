use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{Error, Result};

pub const ENCAPSULATION_HEADER_SIZE: u64 = 4;

/// Every encoded payload is padded to a multiple of this many bytes.
pub const SUBMESSAGE_ALIGNMENT: u64 = 4;

/// Data encapsulation scheme identifiers.
pub trait Encapsulation {
    type E: ByteOrder;
    const ID: [u8; 2];
    const OPTION: [u8; 2] = [0; 2];
    const KIND: EncapsulationKind;
}

/// OMG CDR big-endian encapsulation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CdrBe {}

impl Encapsulation for CdrBe {
    type E = BigEndian;
    const ID: [u8; 2] = [0, 0];
    const KIND: EncapsulationKind = EncapsulationKind::CdrBe;
}

/// OMG CDR little-endian encapsulation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CdrLe {}

impl Encapsulation for CdrLe {
    type E = LittleEndian;
    const ID: [u8; 2] = [0, 1];
    const KIND: EncapsulationKind = EncapsulationKind::CdrLe;
}

/// ParameterList encapsulated using OMG CDR big-endian encapsulation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PlCdrBe {}

impl Encapsulation for PlCdrBe {
    type E = BigEndian;
    const ID: [u8; 2] = [0, 2];
    const KIND: EncapsulationKind = EncapsulationKind::PlCdrBe;
}

/// ParameterList encapsulated using OMG CDR little-endian encapsulation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PlCdrLe {}

impl Encapsulation for PlCdrLe {
    type E = LittleEndian;
    const ID: [u8; 2] = [0, 3];
    const KIND: EncapsulationKind = EncapsulationKind::PlCdrLe;
}

/// Runtime view of an encapsulation identifier, as found on the wire.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum EncapsulationKind {
    CdrBe,
    CdrLe,
    PlCdrBe,
    PlCdrLe,
}

impl EncapsulationKind {
    pub fn id(self) -> [u8; 2] {
        match self {
            EncapsulationKind::CdrBe => CdrBe::ID,
            EncapsulationKind::CdrLe => CdrLe::ID,
            EncapsulationKind::PlCdrBe => PlCdrBe::ID,
            EncapsulationKind::PlCdrLe => PlCdrLe::ID,
        }
    }

    pub fn is_little_endian(self) -> bool {
        matches!(self, EncapsulationKind::CdrLe | EncapsulationKind::PlCdrLe)
    }

    /// Builds the 4-byte header, recording `padding` trailing bytes in the
    /// low bits of the last option octet.
    pub fn header(self, padding: u8) -> [u8; 4] {
        let id = self.id();
        [id[0], id[1], 0, padding & 0x03]
    }

    /// Parses a header, returning the kind and the trailing padding count.
    pub fn from_header(bytes: &[u8]) -> Result<(Self, u8)> {
        if (bytes.len() as u64) < ENCAPSULATION_HEADER_SIZE {
            return Err(Error::InvalidEncapsulation);
        }
        let kind = match [bytes[0], bytes[1]] {
            id if id == CdrBe::ID => EncapsulationKind::CdrBe,
            id if id == CdrLe::ID => EncapsulationKind::CdrLe,
            id if id == PlCdrBe::ID => EncapsulationKind::PlCdrBe,
            id if id == PlCdrLe::ID => EncapsulationKind::PlCdrLe,
            _ => return Err(Error::InvalidEncapsulation),
        };
        Ok((kind, bytes[3] & 0x03))
    }
}

/// Number of zero bytes needed to bring `len` to the submessage alignment.
pub fn padding_for(len: u64) -> u64 {
    (SUBMESSAGE_ALIGNMENT - len % SUBMESSAGE_ALIGNMENT) % SUBMESSAGE_ALIGNMENT
}

/// Rounds `len` up to the submessage alignment.
pub fn round_up_to_alignment(len: u64) -> u64 {
    len + padding_for(len)
}
