//! The [`Deserializable`] trait and the primitive TL encodings.
//!
//! Encoding follows [MTProto serialization]: little-endian fixed-width
//! numbers, 4-byte aligned length-prefixed byte strings, and boxed vectors.
//!
//! [MTProto serialization]: https://core.telegram.org/mtproto/serialize

use crate::cursor::{Buffer, Cursor};
use crate::error::{Error, Result};
use crate::{RawVec, gzip, ids};

/// Decode a statically known type from TL binary format.
pub trait Deserializable: Sized {
    /// Reads `Self` from `buf`, advancing it.
    fn deserialize(buf: Buffer) -> Result<Self>;

    /// Convenience: decode from the start of a byte slice.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::deserialize(&mut Cursor::from_slice(bytes))
    }
}

// ─── Framing helpers ─────────────────────────────────────────────────────────

/// Builds the error for a tag that was just read and matched nothing.
///
/// The cursor is stepped back over the tag and the tag read again so the
/// report carries the bytes exactly as they sit in the stream; the cursor
/// ends up just past the tag.
pub(crate) fn unknown_tag(buf: Buffer, expected: &str) -> Error {
    buf.rewind(4);
    let offset = buf.pos();
    match buf.read_array::<4>() {
        Ok(tag) => Error::UnknownTag { tag, offset, expected: expected.to_owned() },
        Err(e) => e,
    }
}

/// Reads a bytes/string length prefix: `(payload length, header length)`.
fn read_length(buf: Buffer) -> Result<(usize, usize)> {
    let offset = buf.pos();
    match buf.read_byte()? {
        0xff => Err(Error::MalformedLength { offset, value: 0xff }),
        0xfe => {
            let [a, b, c] = buf.read_array::<3>()?;
            Ok((usize::from(a) | usize::from(b) << 8 | usize::from(c) << 16, 4))
        }
        short => Ok((usize::from(short), 1)),
    }
}

fn padding(total: usize) -> usize {
    (4 - total % 4) % 4
}

/// Reads a TL `bytes`/`string` and borrows its payload from the input.
pub fn read_bytes<'a>(buf: &mut Cursor<'a>) -> Result<&'a [u8]> {
    let (len, header) = read_length(buf)?;
    let data = buf.read_slice(len)?;
    buf.skip(padding(header + len))?;
    Ok(data)
}

/// Skips a `random_bytes` field without materialising it.
///
/// A declared length under `min` is rejected before the payload is skipped.
pub fn skip_random_bytes(buf: Buffer, min: usize) -> Result<()> {
    let offset = buf.pos();
    let (len, header) = read_length(buf)?;
    if len < min {
        return Err(Error::InsufficientRandomPadding { offset, len });
    }
    buf.skip(len + padding(header + len))
}

/// Reads a vector element count.
pub(crate) fn read_count(buf: Buffer) -> Result<usize> {
    let offset = buf.pos();
    let n = i32::deserialize(buf)?;
    usize::try_from(n).map_err(|_| Error::MalformedLength { offset, value: i64::from(n) })
}

// ─── Numbers ─────────────────────────────────────────────────────────────────

impl Deserializable for i32 {
    fn deserialize(buf: Buffer) -> Result<Self> {
        buf.read_array().map(i32::from_le_bytes)
    }
}

impl Deserializable for u32 {
    fn deserialize(buf: Buffer) -> Result<Self> {
        buf.read_array().map(u32::from_le_bytes)
    }
}

impl Deserializable for i64 {
    fn deserialize(buf: Buffer) -> Result<Self> {
        buf.read_array().map(i64::from_le_bytes)
    }
}

impl Deserializable for f64 {
    fn deserialize(buf: Buffer) -> Result<Self> {
        buf.read_array().map(f64::from_le_bytes)
    }
}

/// `boolTrue#997275b5` / `boolFalse#bc799737`; any other tag is rejected.
impl Deserializable for bool {
    fn deserialize(buf: Buffer) -> Result<Self> {
        match u32::deserialize(buf)? {
            ids::BOOL_TRUE => Ok(true),
            ids::BOOL_FALSE => Ok(false),
            _ => Err(unknown_tag(buf, "Bool")),
        }
    }
}

/// `int128`, `int256`, `int512` and `strlong` are opaque fixed-width blobs.
impl<const N: usize> Deserializable for [u8; N] {
    fn deserialize(buf: Buffer) -> Result<Self> {
        buf.read_array()
    }
}

// ─── Bytes / String ──────────────────────────────────────────────────────────

impl Deserializable for Vec<u8> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        read_bytes(buf).map(<[u8]>::to_vec)
    }
}

impl Deserializable for String {
    fn deserialize(buf: Buffer) -> Result<Self> {
        let bytes = read_bytes(buf)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| Error::content("string", e))
    }
}

// ─── Vectors ─────────────────────────────────────────────────────────────────

fn read_elements<T: Deserializable>(buf: Buffer) -> Result<Vec<T>> {
    let len = read_count(buf)?;
    let mut out = Vec::with_capacity(len.min(buf.remaining()));
    for _ in 0..len {
        out.push(T::deserialize(buf)?);
    }
    Ok(out)
}

/// Boxed `Vector<T>`, including one wrapped in `gzip_packed`.
impl<T: Deserializable> Deserializable for Vec<T> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        match u32::deserialize(buf)? {
            ids::VECTOR => read_elements(buf),
            ids::GZIP_PACKED => {
                let inflated = gzip::unpack(buf, gzip::DEFAULT_MAX_INFLATED_LEN)?;
                let mut inner = Cursor::from_slice(&inflated);
                match u32::deserialize(&mut inner)? {
                    ids::VECTOR => read_elements(&mut inner),
                    _ => Err(unknown_tag(&mut inner, "Vector")),
                }
            }
            _ => Err(unknown_tag(buf, "Vector")),
        }
    }
}

/// Bare `vector<T>`: a count and the elements, no tag.
impl<T: Deserializable> Deserializable for RawVec<T> {
    fn deserialize(buf: Buffer) -> Result<Self> {
        read_elements(buf).map(RawVec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_length_padding() {
        // len 2 + header 1 = 3, one byte of padding
        let mut c = Cursor::from_slice(&[2, b'h', b'i', 0, 0xaa]);
        assert_eq!(read_bytes(&mut c), Ok(&b"hi"[..]));
        assert_eq!(c.pos(), 4);
    }

    #[test]
    fn long_length_padding() {
        let mut wire = vec![0xfe, 0x01, 0x01, 0x00];
        wire.extend(std::iter::repeat_n(7u8, 257));
        wire.extend([0, 0, 0]);
        let mut c = Cursor::from_slice(&wire);
        assert_eq!(read_bytes(&mut c).unwrap().len(), 257);
        assert!(c.is_empty());
    }

    #[test]
    fn reserved_length_byte() {
        let mut c = Cursor::from_slice(&[0xff, 0, 0, 0]);
        assert_eq!(read_bytes(&mut c), Err(Error::MalformedLength { offset: 0, value: 255 }));
    }

    #[test]
    fn declared_length_past_end() {
        let mut c = Cursor::from_slice(&[0xfe, 0xff, 0xff, 0x00, 1, 2]);
        assert_eq!(read_bytes(&mut c), Err(Error::StreamTruncated { offset: 4, needed: 0xffff }));
    }

    #[test]
    fn negative_count() {
        let wire = (-3i32).to_le_bytes();
        assert_eq!(
            read_count(&mut Cursor::from_slice(&wire)),
            Err(Error::MalformedLength { offset: 0, value: -3 }),
        );
    }

    #[test]
    fn bool_rejects_other_ids() {
        let wire = 0x1234_5678u32.to_le_bytes();
        let err = bool::from_bytes(&wire).unwrap_err();
        assert_eq!(err, Error::UnknownTag { tag: wire, offset: 0, expected: "Bool".into() });
    }
}
