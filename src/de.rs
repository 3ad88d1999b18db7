//! Deserializing CDR into Rust data types.

use serde::de::{self, IntoDeserializer};

use crate::error::{Error, Result};
use crate::size::SizeLimit;
use crate::stream::{read_encapsulated, CdrRead};

/// A serde deserializer reading from any CDR stream.
pub struct Deserializer<'a, R: ?Sized> {
    stream: &'a mut R,
}

impl<'a, R> Deserializer<'a, R>
where
    R: CdrRead + ?Sized,
{
    pub fn new(stream: &'a mut R) -> Self {
        Self { stream }
    }

    fn read_vec(&mut self) -> Result<Vec<u8>> {
        let len = self.stream.read_len(1)?;
        Ok(self.stream.read_raw(len)?.to_vec())
    }
}

macro_rules! impl_deserialize_value {
    ($de_method:ident => $read:ident, $visit:ident) => {
        fn $de_method<V>(self, visitor: V) -> Result<V::Value>
        where
            V: de::Visitor<'de>,
        {
            visitor.$visit(self.stream.$read()?)
        }
    };
}

impl<'de, 'a, 'b, R> de::Deserializer<'de> for &'b mut Deserializer<'a, R>
where
    R: CdrRead + ?Sized,
{
    type Error = Error;

    fn deserialize_any<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::DeserializeAnyNotSupported)
    }

    impl_deserialize_value! { deserialize_bool => read_bool, visit_bool }

    impl_deserialize_value! { deserialize_u8 => read_u8, visit_u8 }
    impl_deserialize_value! { deserialize_u16 => read_u16, visit_u16 }
    impl_deserialize_value! { deserialize_u32 => read_u32, visit_u32 }
    impl_deserialize_value! { deserialize_u64 => read_u64, visit_u64 }

    impl_deserialize_value! { deserialize_i8 => read_i8, visit_i8 }
    impl_deserialize_value! { deserialize_i16 => read_i16, visit_i16 }
    impl_deserialize_value! { deserialize_i32 => read_i32, visit_i32 }
    impl_deserialize_value! { deserialize_i64 => read_i64, visit_i64 }

    impl_deserialize_value! { deserialize_f32 => read_f32, visit_f32 }
    impl_deserialize_value! { deserialize_f64 => read_f64, visit_f64 }

    impl_deserialize_value! { deserialize_str => read_string, visit_string }
    impl_deserialize_value! { deserialize_string => read_string, visit_string }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let byte = self.stream.read_u8()?;
        if !byte.is_ascii() {
            return Err(Error::InvalidCharEncoding);
        }
        visitor.visit_char(char::from(byte))
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_byte_buf(self.read_vec()?)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_byte_buf(self.read_vec()?)
    }

    fn deserialize_option<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::TypeNotSupported)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let len = self.stream.read_len(1)?;
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        struct Access<'c, 'a, R: ?Sized> {
            deserializer: &'c mut Deserializer<'a, R>,
            len: usize,
        }

        impl<'de, 'c, 'a, R> de::SeqAccess<'de> for Access<'c, 'a, R>
        where
            R: CdrRead + ?Sized,
        {
            type Error = Error;

            fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
            where
                T: de::DeserializeSeed<'de>,
            {
                if self.len > 0 {
                    self.len -= 1;
                    let value = de::DeserializeSeed::deserialize(seed, &mut *self.deserializer)?;
                    Ok(Some(value))
                } else {
                    Ok(None)
                }
            }

            fn size_hint(&self) -> Option<usize> {
                Some(self.len)
            }
        }

        visitor.visit_seq(Access {
            deserializer: self,
            len,
        })
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_tuple(len, visitor)
    }

    fn deserialize_map<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::TypeNotSupported)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.deserialize_tuple(fields.len(), visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_enum(self)
    }

    fn deserialize_identifier<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::TypeNotSupported)
    }

    fn deserialize_ignored_any<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(Error::TypeNotSupported)
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

impl<'de, 'a, 'b, R> de::EnumAccess<'de> for &'b mut Deserializer<'a, R>
where
    R: CdrRead + ?Sized,
{
    type Error = Error;
    type Variant = Self;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let idx = self.stream.read_u32()?;
        let val: Result<_> = seed.deserialize(idx.into_deserializer());
        Ok((val?, self))
    }
}

impl<'de, 'a, 'b, R> de::VariantAccess<'de> for &'b mut Deserializer<'a, R>
where
    R: CdrRead + ?Sized,
{
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        de::DeserializeSeed::deserialize(seed, self)
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self, len, visitor)
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        de::Deserializer::deserialize_tuple(self, fields.len(), visitor)
    }
}

/// Deserializes an encapsulated buffer into an object.
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: de::DeserializeOwned,
{
    deserialize_from(bytes, crate::size::Infinite)
}

/// Deserializes an encapsulated buffer no longer than `size_limit`.
pub fn deserialize_from<T, S>(bytes: &[u8], size_limit: S) -> Result<T>
where
    T: de::DeserializeOwned,
    S: SizeLimit,
{
    if let Some(limit) = size_limit.limit() {
        if bytes.len() as u64 > limit {
            return Err(Error::SizeLimit);
        }
    }

    read_encapsulated(bytes, |stream| {
        de::Deserialize::deserialize(&mut Deserializer::new(stream))
    })
}
