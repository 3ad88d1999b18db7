//! Type support for Common Data Representation.
//!
//! Messages are either statically typed, going through serde
//! ([`serialize`], [`deserialize`]), or described at runtime by a
//! [`MessageDescriptor`] and held in a [`DynamicMessage`]. A
//! [`TypeSupport`] built from a descriptor knows the maximum encoded size of
//! its type, whether the type is plain or bounded, and how to move instances
//! to and from encapsulated CDR. [`TopicDataType`] adapts a type support to
//! the boolean callbacks a transport expects.

pub mod de;
pub use de::{deserialize, deserialize_from, Deserializer};

mod encapsulation;
pub use encapsulation::{
    CdrBe, CdrLe, Encapsulation, EncapsulationKind, PlCdrBe, PlCdrLe, ENCAPSULATION_HEADER_SIZE,
    SUBMESSAGE_ALIGNMENT,
};

mod error;
pub use error::{ConfigError, Error, Result};

pub mod ser;
pub use ser::{serialize, serialize_into, Serializer};

mod size;
pub use size::{
    calc_serialized_size, calc_serialized_size_bounded, Bounded, Infinite, SizeCounter, SizeLimit,
};

pub mod stream;
pub use stream::{CdrRead, CdrReader, CdrWrite, CdrWriter};

pub mod descriptor;
pub use descriptor::{Classification, MemberDescriptor, MemberKind, MessageDescriptor, PrimitiveKind};

mod value;
pub use value::{DynamicMessage, Value};

mod traverse;

pub mod typesupport;
pub use typesupport::{
    deserialize_message, message_type_name, serialize_message, MessageTypeSupport, TypeSupport,
};

pub mod service;
pub use service::{service_type_name, ServiceRole, ServiceTypeSupport};

mod envelope;
pub use envelope::{SerializedData, SerializedDataMut, SerializedPayload};

pub mod topic_data_type;
pub use topic_data_type::TopicDataType;

mod registry;
pub use registry::TypeRegistry;

pub mod security_logging;
pub use security_logging::{
    apply_security_logging_configuration, apply_security_logging_configuration_with,
    PropertyPolicy, SecurityLoggingConfig,
};
