//! Alignment-aware primitive reads and writes over encapsulated CDR content.
//!
//! Positions are measured from the first byte after the encapsulation
//! header, so a `u64` written at position 4 is preceded by four bytes of
//! padding.

use std::{io, io::Write, marker::PhantomData};

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::encapsulation::{padding_for, EncapsulationKind, ENCAPSULATION_HEADER_SIZE};
use crate::error::{Error, Result};

const ZEROS: [u8; 8] = [0; 8];

/// Padding needed at `pos` to reach the next multiple of `alignment`.
#[inline]
pub(crate) fn alignment_padding(pos: u64, alignment: u64) -> u64 {
    let rem_mask = alignment - 1; // mask like 0x0, 0x1, 0x3, 0x7
    (alignment - (pos & rem_mask)) & rem_mask
}

/// Sink for CDR primitives.
pub trait CdrWrite {
    /// Current offset from the start of the encapsulated content.
    fn position(&self) -> u64;

    /// Writes bytes verbatim, with no alignment.
    fn write_raw(&mut self, bytes: &[u8]) -> Result<()>;

    fn write_u16(&mut self, v: u16) -> Result<()>;
    fn write_u32(&mut self, v: u32) -> Result<()>;
    fn write_u64(&mut self, v: u64) -> Result<()>;
    fn write_i16(&mut self, v: i16) -> Result<()>;
    fn write_i32(&mut self, v: i32) -> Result<()>;
    fn write_i64(&mut self, v: i64) -> Result<()>;
    fn write_f32(&mut self, v: f32) -> Result<()>;
    fn write_f64(&mut self, v: f64) -> Result<()>;

    fn write_padding(&mut self, alignment: u64) -> Result<()> {
        let amt = alignment_padding(self.position(), alignment) as usize;
        self.write_raw(&ZEROS[..amt])
    }

    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_raw(&[v])
    }

    fn write_i8(&mut self, v: i8) -> Result<()> {
        self.write_raw(&[v as u8])
    }

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_u8(u8::from(v))
    }

    /// Writes a sequence or string length prefix.
    fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| Error::NumberOutOfRange)?;
        self.write_u32(len)
    }

    /// Writes a length-prefixed, null-terminated string.
    fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_len(v.len() + 1)?;
        self.write_raw(v.as_bytes())?;
        self.write_u8(0)
    }
}

/// Source of CDR primitives.
pub trait CdrRead {
    /// Current offset from the start of the encapsulated content.
    fn position(&self) -> u64;

    /// Bytes left in the underlying buffer.
    fn remaining(&self) -> usize;

    /// Reads `len` bytes verbatim, with no alignment.
    fn read_raw(&mut self, len: usize) -> Result<&[u8]>;

    fn read_u16(&mut self) -> Result<u16>;
    fn read_u32(&mut self) -> Result<u32>;
    fn read_u64(&mut self) -> Result<u64>;
    fn read_i16(&mut self) -> Result<i16>;
    fn read_i32(&mut self) -> Result<i32>;
    fn read_i64(&mut self) -> Result<i64>;
    fn read_f32(&mut self) -> Result<f32>;
    fn read_f64(&mut self) -> Result<f64>;

    fn read_padding(&mut self, alignment: u64) -> Result<()> {
        let amt = alignment_padding(self.position(), alignment) as usize;
        self.read_raw(amt).map(|_| ())
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_raw(1)?[0])
    }

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_raw(1)?[0] as i8)
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(Error::InvalidBoolEncoding(value)),
        }
    }

    /// Reads a length prefix and rejects it when `len` elements of at least
    /// `min_element_size` bytes cannot fit in the rest of the buffer.
    fn read_len(&mut self, min_element_size: u64) -> Result<usize> {
        let len = self.read_u32()?;
        let needed = u64::from(len).saturating_mul(min_element_size);
        if needed > self.remaining() as u64 {
            return Err(Error::LengthExceedsBuffer {
                len,
                pos: self.position(),
                needed,
                remaining: self.remaining(),
            });
        }
        Ok(len as usize)
    }

    /// Reads a length-prefixed, null-terminated string.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_len(1)?;
        let bytes = self.read_raw(len)?;
        match bytes.split_last() {
            Some((0, text)) => Ok(std::str::from_utf8(text)?.to_owned()),
            _ => Err(Error::MissingStringTerminator),
        }
    }
}

/// Writes CDR primitives to an `io::Write` in the byte order `E`.
pub struct CdrWriter<W, E> {
    writer: W,
    pos: u64,
    phantom: PhantomData<E>,
}

impl<W, E> CdrWriter<W, E>
where
    W: Write,
    E: ByteOrder,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pos: 0,
            phantom: PhantomData,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

macro_rules! impl_write_aligned {
    ($method:ident($ty:ty)) => {
        fn $method(&mut self, v: $ty) -> Result<()> {
            const WIDTH: u64 = std::mem::size_of::<$ty>() as u64;
            self.write_padding(WIDTH)?;
            self.writer.$method::<E>(v)?;
            self.pos += WIDTH;
            Ok(())
        }
    };
}

impl<W, E> CdrWrite for CdrWriter<W, E>
where
    W: Write,
    E: ByteOrder,
{
    fn position(&self) -> u64 {
        self.pos
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        self.pos += bytes.len() as u64;
        Ok(())
    }

    impl_write_aligned! { write_u16(u16) }
    impl_write_aligned! { write_u32(u32) }
    impl_write_aligned! { write_u64(u64) }
    impl_write_aligned! { write_i16(i16) }
    impl_write_aligned! { write_i32(i32) }
    impl_write_aligned! { write_i64(i64) }
    impl_write_aligned! { write_f32(f32) }
    impl_write_aligned! { write_f64(f64) }
}

/// Reads CDR primitives from a byte slice in the byte order `E`.
pub struct CdrReader<'a, E> {
    reader: &'a [u8],
    pos: u64,
    phantom: PhantomData<E>,
}

impl<'a, E> CdrReader<'a, E>
where
    E: ByteOrder,
{
    /// `bytes` holds encapsulated content, without the header.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            reader: bytes,
            pos: 0,
            phantom: PhantomData,
        }
    }

    fn ensure(&self, len: usize) -> Result<()> {
        if len > self.reader.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "needed {} bytes at position {}, {} remain",
                    len,
                    self.pos,
                    self.reader.len()
                ),
            )
            .into());
        }
        Ok(())
    }
}

macro_rules! impl_read_aligned {
    ($method:ident($ty:ty)) => {
        fn $method(&mut self) -> Result<$ty> {
            const WIDTH: u64 = std::mem::size_of::<$ty>() as u64;
            self.read_padding(WIDTH)?;
            self.ensure(WIDTH as usize)?;
            let v = self.reader.$method::<E>()?;
            self.pos += WIDTH;
            Ok(v)
        }
    };
}

impl<'a, E> CdrRead for CdrReader<'a, E>
where
    E: ByteOrder,
{
    fn position(&self) -> u64 {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.reader.len()
    }

    fn read_raw(&mut self, len: usize) -> Result<&[u8]> {
        self.ensure(len)?;
        let (head, tail) = self.reader.split_at(len);
        self.reader = tail;
        self.pos += len as u64;
        Ok(head)
    }

    impl_read_aligned! { read_u16(u16) }
    impl_read_aligned! { read_u32(u32) }
    impl_read_aligned! { read_u64(u64) }
    impl_read_aligned! { read_i16(i16) }
    impl_read_aligned! { read_i32(i32) }
    impl_read_aligned! { read_i64(i64) }
    impl_read_aligned! { read_f32(f32) }
    impl_read_aligned! { read_f64(f64) }
}

/// Writes a complete encapsulated payload: header, the content produced by
/// `body`, then zero padding up to the submessage alignment.
///
/// `content_len` must be the exact number of bytes `body` writes; the
/// padding count stored in the header is derived from it. Returns the total
/// number of bytes written.
pub fn write_encapsulated<W, F>(
    mut writer: W,
    kind: EncapsulationKind,
    content_len: u64,
    body: F,
) -> Result<u64>
where
    W: Write,
    F: FnOnce(&mut dyn CdrWrite) -> Result<()>,
{
    let padding = padding_for(ENCAPSULATION_HEADER_SIZE + content_len);
    writer.write_all(&kind.header(padding as u8))?;
    if kind.is_little_endian() {
        finish::<_, LittleEndian, _>(&mut writer, content_len, padding, body)?;
    } else {
        finish::<_, BigEndian, _>(&mut writer, content_len, padding, body)?;
    }
    Ok(ENCAPSULATION_HEADER_SIZE + content_len + padding)
}

fn finish<W, E, F>(writer: W, content_len: u64, padding: u64, body: F) -> Result<()>
where
    W: Write,
    E: ByteOrder,
    F: FnOnce(&mut dyn CdrWrite) -> Result<()>,
{
    let mut stream = CdrWriter::<_, E>::new(writer);
    body(&mut stream)?;
    debug_assert_eq!(stream.position(), content_len);
    stream.write_raw(&ZEROS[..padding as usize])
}

/// Parses the encapsulation header of `bytes` and hands the content to
/// `body` through a reader of the matching byte order. Trailing padding is
/// left unread.
pub fn read_encapsulated<T, F>(bytes: &[u8], body: F) -> Result<T>
where
    F: FnOnce(&mut dyn CdrRead) -> Result<T>,
{
    let (kind, _padding) = EncapsulationKind::from_header(bytes)?;
    let content = &bytes[ENCAPSULATION_HEADER_SIZE as usize..];
    if kind.is_little_endian() {
        body(&mut CdrReader::<LittleEndian>::new(content))
    } else {
        body(&mut CdrReader::<BigEndian>::new(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_padding() {
        assert_eq!(alignment_padding(0, 8), 0);
        assert_eq!(alignment_padding(1, 8), 7);
        assert_eq!(alignment_padding(5, 4), 3);
        assert_eq!(alignment_padding(3, 1), 0);
    }

    #[test]
    fn test_writer_aligns_relative_to_content() {
        let mut buf = Vec::new();
        {
            let mut w = CdrWriter::<_, LittleEndian>::new(&mut buf);
            w.write_u8(1).unwrap();
            w.write_u32(2).unwrap();
            w.write_u8(3).unwrap();
            w.write_f64(4.0).unwrap();
            assert_eq!(w.position(), 16);
        }
        assert_eq!(&buf[..8], &[1, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(buf[8], 3);
        assert_eq!(&buf[9..16], &[0; 7]);
    }

    #[test]
    fn test_big_endian_writer() {
        let mut buf = Vec::new();
        CdrWriter::<_, BigEndian>::new(&mut buf)
            .write_u16(0x0102)
            .unwrap();
        assert_eq!(buf, vec![1, 2]);
    }

    #[test]
    fn test_string_layout() {
        let mut buf = Vec::new();
        CdrWriter::<_, LittleEndian>::new(&mut buf)
            .write_string("ab")
            .unwrap();
        assert_eq!(buf, vec![3, 0, 0, 0, b'a', b'b', 0]);

        let mut r = CdrReader::<LittleEndian>::new(&buf);
        assert_eq!(r.read_string().unwrap(), "ab");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_string_without_terminator() {
        let buf = [2, 0, 0, 0, b'a', b'b'];
        let mut r = CdrReader::<LittleEndian>::new(&buf);
        assert!(matches!(
            r.read_string(),
            Err(Error::MissingStringTerminator)
        ));

        let empty = [0, 0, 0, 0];
        let mut r = CdrReader::<LittleEndian>::new(&empty);
        assert!(matches!(
            r.read_string(),
            Err(Error::MissingStringTerminator)
        ));
    }

    #[test]
    fn test_read_len_rejects_oversized_sequence() {
        let buf = [0xff, 0xff, 0, 0, 1, 2];
        let mut r = CdrReader::<LittleEndian>::new(&buf);
        assert!(matches!(
            r.read_len(1),
            Err(Error::LengthExceedsBuffer { len: 0xffff, .. })
        ));
    }

    #[test]
    fn test_short_read() {
        let buf = [1, 2];
        let mut r = CdrReader::<LittleEndian>::new(&buf);
        assert!(matches!(r.read_u32(), Err(Error::Io(_))));
    }

    #[test]
    fn test_invalid_bool() {
        let buf = [2];
        let mut r = CdrReader::<LittleEndian>::new(&buf);
        assert!(matches!(r.read_bool(), Err(Error::InvalidBoolEncoding(2))));
    }

    #[test]
    fn test_encapsulated_round_trip() {
        let mut buf = Vec::new();
        let len = write_encapsulated(&mut buf, EncapsulationKind::CdrBe, 5, |w| {
            w.write_u32(7)?;
            w.write_u8(9)
        })
        .unwrap();
        assert_eq!(len, 12);
        assert_eq!(buf, vec![0, 0, 0, 3, 0, 0, 0, 7, 9, 0, 0, 0]);

        let (a, b) = read_encapsulated(&buf, |r| Ok((r.read_u32()?, r.read_u8()?))).unwrap();
        assert_eq!((a, b), (7, 9));
    }
}
