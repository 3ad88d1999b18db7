//! Serializing Rust data types into CDR.

use std::io::Write;

use serde::ser;

use crate::encapsulation::Encapsulation;
use crate::error::{Error, Result};
use crate::size::{calc_content_size, calc_serialized_size_bounded, encapsulated_size, SizeLimit};
use crate::stream::{write_encapsulated, CdrWrite};

/// A serde serializer writing into any CDR stream.
///
/// The stream may be a real writer or a `SizeCounter`; both see exactly the
/// same sequence of primitive writes.
pub struct Serializer<'a, S: ?Sized> {
    stream: &'a mut S,
}

impl<'a, S> Serializer<'a, S>
where
    S: CdrWrite + ?Sized,
{
    pub fn new(stream: &'a mut S) -> Self {
        Self { stream }
    }
}

macro_rules! impl_serialize_value {
    ($ser_method:ident($ty:ty) => $write:ident) => {
        #[inline]
        fn $ser_method(self, v: $ty) -> Result<Self::Ok> {
            self.stream.$write(v)
        }
    };
}

impl<'a, 'b, S> ser::Serializer for &'b mut Serializer<'a, S>
where
    S: CdrWrite + ?Sized,
{
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Compound<'a, 'b, S>;
    type SerializeTuple = Compound<'a, 'b, S>;
    type SerializeTupleStruct = Compound<'a, 'b, S>;
    type SerializeTupleVariant = Compound<'a, 'b, S>;
    type SerializeMap = Compound<'a, 'b, S>;
    type SerializeStruct = Compound<'a, 'b, S>;
    type SerializeStructVariant = Compound<'a, 'b, S>;

    impl_serialize_value! { serialize_bool(bool) => write_bool }

    impl_serialize_value! { serialize_i8(i8) => write_i8 }
    impl_serialize_value! { serialize_i16(i16) => write_i16 }
    impl_serialize_value! { serialize_i32(i32) => write_i32 }
    impl_serialize_value! { serialize_i64(i64) => write_i64 }

    impl_serialize_value! { serialize_u8(u8) => write_u8 }
    impl_serialize_value! { serialize_u16(u16) => write_u16 }
    impl_serialize_value! { serialize_u32(u32) => write_u32 }
    impl_serialize_value! { serialize_u64(u64) => write_u64 }

    impl_serialize_value! { serialize_f32(f32) => write_f32 }
    impl_serialize_value! { serialize_f64(f64) => write_f64 }

    #[inline]
    fn serialize_char(self, v: char) -> Result<Self::Ok> {
        if !v.is_ascii() {
            return Err(Error::InvalidChar(v));
        }
        self.stream.write_u8(v as u8)
    }

    #[inline]
    fn serialize_str(self, v: &str) -> Result<Self::Ok> {
        self.stream.write_string(v)
    }

    #[inline]
    fn serialize_bytes(self, v: &[u8]) -> Result<Self::Ok> {
        self.stream.write_len(v.len())?;
        self.stream.write_raw(v)
    }

    #[inline]
    fn serialize_none(self) -> Result<Self::Ok> {
        Err(Error::TypeNotSupported)
    }

    #[inline]
    fn serialize_some<T>(self, _v: &T) -> Result<Self::Ok>
    where
        T: ser::Serialize + ?Sized,
    {
        Err(Error::TypeNotSupported)
    }

    #[inline]
    fn serialize_unit(self) -> Result<Self::Ok> {
        Ok(())
    }

    #[inline]
    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        Ok(())
    }

    #[inline]
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
    ) -> Result<Self::Ok> {
        self.stream.write_u32(variant_index)
    }

    #[inline]
    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Self::Ok>
    where
        T: ser::Serialize + ?Sized,
    {
        value.serialize(self)
    }

    #[inline]
    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        value: &T,
    ) -> Result<Self::Ok>
    where
        T: ser::Serialize + ?Sized,
    {
        self.stream.write_u32(variant_index)?;
        value.serialize(self)
    }

    #[inline]
    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        let len = len.ok_or(Error::SequenceMustHaveLength)?;
        self.stream.write_len(len)?;
        Ok(Compound { ser: self })
    }

    #[inline]
    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Ok(Compound { ser: self })
    }

    #[inline]
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Ok(Compound { ser: self })
    }

    #[inline]
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.stream.write_u32(variant_index)?;
        Ok(Compound { ser: self })
    }

    #[inline]
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::TypeNotSupported)
    }

    #[inline]
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(Compound { ser: self })
    }

    #[inline]
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.stream.write_u32(variant_index)?;
        Ok(Compound { ser: self })
    }

    fn is_human_readable(&self) -> bool {
        false
    }
}

#[doc(hidden)]
pub struct Compound<'a, 'b, S: ?Sized> {
    ser: &'b mut Serializer<'a, S>,
}

macro_rules! impl_compound {
    ($trait:ident, $method:ident) => {
        impl<'a, 'b, S> ser::$trait for Compound<'a, 'b, S>
        where
            S: CdrWrite + ?Sized,
        {
            type Ok = ();
            type Error = Error;

            #[inline]
            fn $method<T>(&mut self, value: &T) -> Result<()>
            where
                T: ser::Serialize + ?Sized,
            {
                value.serialize(&mut *self.ser)
            }

            #[inline]
            fn end(self) -> Result<()> {
                Ok(())
            }
        }
    };
}

impl_compound!(SerializeSeq, serialize_element);
impl_compound!(SerializeTuple, serialize_element);
impl_compound!(SerializeTupleStruct, serialize_field);
impl_compound!(SerializeTupleVariant, serialize_field);

impl<'a, 'b, S> ser::SerializeMap for Compound<'a, 'b, S>
where
    S: CdrWrite + ?Sized,
{
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        key.serialize(&mut *self.ser)
    }

    #[inline]
    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        value.serialize(&mut *self.ser)
    }

    #[inline]
    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b, S> ser::SerializeStruct for Compound<'a, 'b, S>
where
    S: CdrWrite + ?Sized,
{
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        value.serialize(&mut *self.ser)
    }

    #[inline]
    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl<'a, 'b, S> ser::SerializeStructVariant for Compound<'a, 'b, S>
where
    S: CdrWrite + ?Sized,
{
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, _key: &'static str, value: &T) -> Result<()>
    where
        T: ser::Serialize + ?Sized,
    {
        value.serialize(&mut *self.ser)
    }

    #[inline]
    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Serializes a value into a freshly allocated, encapsulated buffer.
pub fn serialize<T, S, C>(value: &T, size_limit: S) -> Result<Vec<u8>>
where
    T: ser::Serialize + ?Sized,
    S: SizeLimit,
    C: Encapsulation,
{
    if let Some(limit) = size_limit.limit() {
        calc_serialized_size_bounded(value, limit)?;
    }
    let content = calc_content_size(value)?;
    let mut writer = Vec::with_capacity(encapsulated_size(content) as usize);

    write_encapsulated(&mut writer, C::KIND, content, |stream| {
        value.serialize(&mut Serializer::new(stream))
    })?;
    Ok(writer)
}

/// Serializes a value into `writer`, header and trailing padding included.
pub fn serialize_into<W, T, S, C>(writer: &mut W, value: &T, size_limit: S) -> Result<()>
where
    W: Write + ?Sized,
    T: ser::Serialize + ?Sized,
    S: SizeLimit,
    C: Encapsulation,
{
    if let Some(limit) = size_limit.limit() {
        calc_serialized_size_bounded(value, limit)?;
    }

    write_encapsulated(writer, C::KIND, calc_content_size(value)?, |stream| {
        value.serialize(&mut Serializer::new(stream))
    })?;
    Ok(())
}
