//! Measuring the size of (de)serialized data.

use serde::ser;

use crate::encapsulation::{round_up_to_alignment, ENCAPSULATION_HEADER_SIZE};
use crate::error::{Error, Result};
use crate::ser::Serializer;
use crate::stream::CdrWrite;

/// A byte limit applied to encoded payloads.
pub trait SizeLimit {
    fn limit(&self) -> Option<u64>;
}

/// No limit.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Infinite;

impl SizeLimit for Infinite {
    fn limit(&self) -> Option<u64> {
        None
    }
}

/// At most this many bytes, header and padding included.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Bounded(pub u64);

impl SizeLimit for Bounded {
    fn limit(&self) -> Option<u64> {
        Some(self.0)
    }
}

/// A `CdrWrite` sink that only counts bytes, padding included.
///
/// Running the serialize traversal against a counter yields the exact
/// content size that the same traversal writes to a real stream.
#[derive(Debug, Default)]
pub struct SizeCounter {
    total: u64,
    limit: Option<u64>,
}

impl SizeCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: u64) -> Self {
        Self {
            total: 0,
            limit: Some(limit),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    fn add_size(&mut self, size: u64) -> Result<()> {
        if let Some(limit) = self.limit {
            if self.total + size > limit {
                return Err(Error::SizeLimit);
            }
        }

        self.total += size;

        Ok(())
    }
}

macro_rules! impl_count_aligned {
    ($method:ident($ty:ty)) => {
        fn $method(&mut self, _v: $ty) -> Result<()> {
            const WIDTH: u64 = std::mem::size_of::<$ty>() as u64;
            self.write_padding(WIDTH)?;
            self.add_size(WIDTH)
        }
    };
}

impl CdrWrite for SizeCounter {
    fn position(&self) -> u64 {
        self.total
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.add_size(bytes.len() as u64)
    }

    impl_count_aligned! { write_u16(u16) }
    impl_count_aligned! { write_u32(u32) }
    impl_count_aligned! { write_u64(u64) }
    impl_count_aligned! { write_i16(i16) }
    impl_count_aligned! { write_i32(i32) }
    impl_count_aligned! { write_i64(i64) }
    impl_count_aligned! { write_f32(f32) }
    impl_count_aligned! { write_f64(f64) }
}

/// Size of a payload holding `content_len` bytes of content: the header plus
/// the content, rounded up to the submessage alignment.
pub fn encapsulated_size(content_len: u64) -> u64 {
    round_up_to_alignment(ENCAPSULATION_HEADER_SIZE + content_len)
}

/// Size of the content `value` serializes to, without header or padding.
pub fn calc_content_size<T>(value: &T) -> Result<u64>
where
    T: ser::Serialize + ?Sized,
{
    let mut counter = SizeCounter::new();
    value.serialize(&mut Serializer::new(&mut counter))?;
    Ok(counter.total())
}

/// Returns the size that an object would be if serialized, header and
/// padding included.
pub fn calc_serialized_size<T>(value: &T) -> Result<u64>
where
    T: ser::Serialize + ?Sized,
{
    calc_content_size(value).map(encapsulated_size)
}

/// Given a maximum size limit, check how large an object would be if it were
/// to be serialized.
pub fn calc_serialized_size_bounded<T>(value: &T, max: u64) -> Result<u64>
where
    T: ser::Serialize + ?Sized,
{
    let content_limit = max
        .checked_sub(ENCAPSULATION_HEADER_SIZE)
        .ok_or(Error::SizeLimit)?;
    let mut counter = SizeCounter::with_limit(content_limit);

    value.serialize(&mut Serializer::new(&mut counter))?;
    let size = encapsulated_size(counter.total());
    if size > max {
        return Err(Error::SizeLimit);
    }
    Ok(size)
}
