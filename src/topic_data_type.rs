//! The adapter a transport calls into for one registered type.

use std::{fmt, io::Cursor, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::de;
use crate::encapsulation::EncapsulationKind;
use crate::envelope::{SerializedData, SerializedDataMut, SerializedPayload};
use crate::error::{Error, Result};
use crate::ser::Serializer;
use crate::size::{calc_content_size, encapsulated_size};
use crate::stream::write_encapsulated;
use crate::traverse;
use crate::typesupport::{deserialize_message, TypeSupport};
use crate::value::DynamicMessage;

/// Transport-facing wrapper around a `TypeSupport`.
///
/// The transport deals in booleans: every failure is logged and reported as
/// `false`.
#[derive(Clone)]
pub struct TopicDataType {
    type_support: Arc<dyn TypeSupport>,
    encapsulation: EncapsulationKind,
}

impl TopicDataType {
    /// Encodes in the host byte order.
    pub fn new(type_support: Arc<dyn TypeSupport>) -> Self {
        let encapsulation = if cfg!(target_endian = "little") {
            EncapsulationKind::CdrLe
        } else {
            EncapsulationKind::CdrBe
        };
        Self::with_encapsulation(type_support, encapsulation)
    }

    pub fn with_encapsulation(
        type_support: Arc<dyn TypeSupport>,
        encapsulation: EncapsulationKind,
    ) -> Self {
        Self {
            type_support,
            encapsulation,
        }
    }

    pub fn type_support(&self) -> &Arc<dyn TypeSupport> {
        &self.type_support
    }

    pub fn type_name(&self) -> &str {
        self.type_support.type_name()
    }

    pub fn encapsulation(&self) -> EncapsulationKind {
        self.encapsulation
    }

    /// Maximum encoded size, used to size payload pools.
    pub fn type_size(&self) -> u32 {
        self.type_support.max_serialized_size()
    }

    pub fn is_plain(&self) -> bool {
        self.type_support.is_plain()
    }

    pub fn is_bounded(&self) -> bool {
        self.type_support.is_bounded()
    }

    /// Allocates a default instance. Dropping it releases it.
    pub fn create_data(&self) -> DynamicMessage {
        self.type_support.create_data()
    }

    /// Returns a closure estimating the encoded size of `data`. Falls back to
    /// `type_size` when the estimate cannot be computed.
    pub fn get_serialized_size_provider<'a, T>(
        &'a self,
        data: SerializedData<'a, T>,
    ) -> impl Fn() -> u32 + 'a
    where
        T: Serialize + ?Sized + 'a,
    {
        move || match self.estimate(data) {
            Ok(size) => size,
            Err(e) => {
                warn!(
                    type_name = self.type_name(),
                    error = %e,
                    "size estimation failed, using type size"
                );
                self.type_size()
            }
        }
    }

    fn estimate<T>(&self, data: SerializedData<'_, T>) -> Result<u32>
    where
        T: Serialize + ?Sized,
    {
        match data {
            SerializedData::Raw(bytes) => {
                u32::try_from(bytes.len()).map_err(|_| Error::NumberOutOfRange)
            }
            SerializedData::Dynamic(message) => {
                self.type_support.estimated_serialized_size(message)
            }
            SerializedData::Typed(value) => {
                let size = encapsulated_size(calc_content_size(value)?);
                u32::try_from(size).map_err(|_| Error::NumberOutOfRange)
            }
        }
    }

    /// Encodes `data` into `payload`. Raw buffers are copied verbatim. On
    /// failure `payload` is left empty.
    pub fn serialize<T>(&self, data: SerializedData<'_, T>, payload: &mut SerializedPayload) -> bool
    where
        T: Serialize + ?Sized,
    {
        match self.try_serialize(data, payload) {
            Ok(()) => true,
            Err(e) => {
                warn!(type_name = self.type_name(), error = %e, "serialize failed");
                false
            }
        }
    }

    fn try_serialize<T>(&self, data: SerializedData<'_, T>, payload: &mut SerializedPayload) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let kind = self.encapsulation;
        payload.set_written(0, kind);
        let written = match data {
            SerializedData::Raw(bytes) => {
                let buf = payload.buffer_mut();
                if bytes.len() > buf.len() {
                    return Err(Error::SizeLimit);
                }
                buf[..bytes.len()].copy_from_slice(bytes);
                let kind = EncapsulationKind::from_header(bytes).map_or(kind, |(kind, _)| kind);
                payload.set_written(bytes.len(), kind);
                return Ok(());
            }
            SerializedData::Dynamic(message) => {
                let ts = self.type_support.as_ref();
                let content = traverse::content_size(ts.descriptor(), message)?;
                let mut cursor = Cursor::new(payload.buffer_mut());
                write_encapsulated(&mut cursor, kind, content, |stream| {
                    TypeSupport::serialize(ts, message, stream)
                })?
            }
            SerializedData::Typed(value) => {
                let content = calc_content_size(value)?;
                let mut cursor = Cursor::new(payload.buffer_mut());
                write_encapsulated(&mut cursor, kind, content, |stream| {
                    value.serialize(&mut Serializer::new(stream))
                })?
            }
        };
        payload.set_written(written as usize, kind);
        Ok(())
    }

    /// Decodes `payload` into `data`. On failure the contents of `data` are
    /// unspecified.
    pub fn deserialize<T>(&self, payload: &SerializedPayload, data: SerializedDataMut<'_, T>) -> bool
    where
        T: DeserializeOwned,
    {
        match self.try_deserialize(payload, data) {
            Ok(()) => true,
            Err(e) => {
                warn!(type_name = self.type_name(), error = %e, "deserialize failed");
                false
            }
        }
    }

    fn try_deserialize<T>(&self, payload: &SerializedPayload, data: SerializedDataMut<'_, T>) -> Result<()>
    where
        T: DeserializeOwned,
    {
        match data {
            SerializedDataMut::Raw(buf) => {
                buf.clear();
                buf.extend_from_slice(payload.as_bytes());
            }
            SerializedDataMut::Dynamic(message) => {
                deserialize_message(self.type_support.as_ref(), payload.as_bytes(), message)?
            }
            SerializedDataMut::Typed(value) => *value = de::deserialize(payload.as_bytes())?,
        }
        Ok(())
    }

    /// Types handled here carry no key fields, so no instance handle is
    /// ever produced.
    pub fn get_key<T>(
        &self,
        _data: SerializedData<'_, T>,
        _handle: &mut [u8; 16],
        _force_md5: bool,
    ) -> bool
    where
        T: ?Sized,
    {
        false
    }
}

impl fmt::Debug for TopicDataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TopicDataType")
            .field("type_name", &self.type_name())
            .field("type_size", &self.type_size())
            .field("encapsulation", &self.encapsulation)
            .finish()
    }
}
