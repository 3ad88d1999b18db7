//! Per-type serialization contracts for dynamically described messages.

use std::{fmt, sync::Arc};

use tracing::debug;

use crate::descriptor::MessageDescriptor;
use crate::encapsulation::EncapsulationKind;
use crate::error::{Error, Result};
use crate::size::encapsulated_size;
use crate::stream::{read_encapsulated, write_encapsulated, CdrRead, CdrWrite};
use crate::traverse;
use crate::value::DynamicMessage;

/// Size, classification and (de)serialization of one registered type.
///
/// Implementations are immutable once built and are shared between threads
/// behind an `Arc`.
pub trait TypeSupport: Send + Sync + fmt::Debug {
    /// Transport-level type name, e.g. `std_msgs::msg::dds_::String_`.
    fn type_name(&self) -> &str;

    fn descriptor(&self) -> &Arc<MessageDescriptor>;

    /// Maximum encoded size computed when the type was built, header and
    /// padding included. For unbounded types this only covers the bounded
    /// part of the layout.
    fn max_serialized_size(&self) -> u32;

    fn is_plain(&self) -> bool;

    fn is_bounded(&self) -> bool;

    /// Upper bound on the encoded size of `message`, header included.
    ///
    /// Plain types always report `max_serialized_size`; everything else is
    /// measured by running the serialize traversal over a counting sink.
    fn estimated_serialized_size(&self, message: &DynamicMessage) -> Result<u32> {
        if self.is_plain() {
            return Ok(self.max_serialized_size());
        }
        let content = traverse::content_size(self.descriptor(), message)?;
        u32::try_from(encapsulated_size(content)).map_err(|_| Error::NumberOutOfRange)
    }

    /// Writes the members of `message` in descriptor order.
    fn serialize(&self, message: &DynamicMessage, stream: &mut dyn CdrWrite) -> Result<()> {
        traverse::write_message(self.descriptor(), message, stream)
    }

    /// Reads members in descriptor order into `message`, reusing its
    /// allocations where the shapes match.
    fn deserialize(&self, stream: &mut dyn CdrRead, message: &mut DynamicMessage) -> Result<()> {
        traverse::read_message(self.descriptor(), stream, message)
    }

    /// A default-initialized instance of this type.
    fn create_data(&self) -> DynamicMessage {
        DynamicMessage::new(self.descriptor())
    }
}

/// Type support for a message described at runtime.
#[derive(Debug)]
pub struct MessageTypeSupport {
    type_name: String,
    descriptor: Arc<MessageDescriptor>,
    type_size: u32,
    plain: bool,
    bounded: bool,
}

impl MessageTypeSupport {
    /// Fails when the layout holds a zero-length fixed array or when its
    /// maximum size does not fit a `u32`.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Result<Self> {
        let type_name = message_type_name(descriptor.namespace(), descriptor.name());
        Self::with_type_name(type_name, descriptor)
    }

    pub(crate) fn with_type_name(
        type_name: String,
        descriptor: Arc<MessageDescriptor>,
    ) -> Result<Self> {
        traverse::validate(&descriptor)?;
        let max = encapsulated_size(traverse::max_content_size(&descriptor));
        let type_size = match u32::try_from(max) {
            Ok(size) => size,
            Err(_) => {
                return Err(Error::TypeTooLarge {
                    type_name,
                    size: max,
                })
            }
        };
        let classification = descriptor.classification();

        debug!(
            type_name = %type_name,
            type_size,
            plain = classification.plain,
            bounded = classification.bounded,
            "created type support"
        );

        Ok(Self {
            type_name,
            descriptor,
            type_size,
            plain: classification.plain,
            bounded: classification.bounded,
        })
    }
}

impl TypeSupport for MessageTypeSupport {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    fn max_serialized_size(&self) -> u32 {
        self.type_size
    }

    fn is_plain(&self) -> bool {
        self.plain
    }

    fn is_bounded(&self) -> bool {
        self.bounded
    }
}

/// Rewrites a `__`-separated namespace with `::`.
pub fn translate_namespace(namespace: &str) -> String {
    namespace.replace("__", "::")
}

/// `<namespace>::dds_::<name>_`, with no leading `::` for an empty
/// namespace.
pub fn message_type_name(namespace: &str, name: &str) -> String {
    qualified_name(namespace, &format!("{}_", name))
}

pub(crate) fn qualified_name(namespace: &str, leaf: &str) -> String {
    if namespace.is_empty() {
        format!("dds_::{}", leaf)
    } else {
        format!("{}::dds_::{}", translate_namespace(namespace), leaf)
    }
}

/// Serializes `message` into a complete encapsulated payload.
pub fn serialize_message<T>(
    type_support: &T,
    message: &DynamicMessage,
    kind: EncapsulationKind,
) -> Result<Vec<u8>>
where
    T: TypeSupport + ?Sized,
{
    let content = traverse::content_size(type_support.descriptor(), message)?;
    let mut buf = Vec::with_capacity(encapsulated_size(content) as usize);
    write_encapsulated(&mut buf, kind, content, |stream| {
        type_support.serialize(message, stream)
    })?;
    Ok(buf)
}

/// Deserializes an encapsulated payload into `message`.
pub fn deserialize_message<T>(
    type_support: &T,
    bytes: &[u8],
    message: &mut DynamicMessage,
) -> Result<()>
where
    T: TypeSupport + ?Sized,
{
    read_encapsulated(bytes, |stream| type_support.deserialize(stream, message))
}
