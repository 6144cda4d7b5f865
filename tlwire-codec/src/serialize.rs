//! The [`Serializable`] trait: the write half of the primitive encodings.
//!
//! The decoder never needs it; it exists to build payloads for tests, the
//! fixtures, and tools that forge responses.

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::{RawVec, ids};

/// Serialize `self` into TL binary format.
pub trait Serializable {
    /// Appends the encoding of `self` to `buf`.
    fn serialize(&self, buf: &mut Vec<u8>);

    /// Serializes into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut v = Vec::new();
        self.serialize(&mut v);
        v
    }
}

macro_rules! le_bytes {
    ($($t:ty),*) => {$(
        impl Serializable for $t {
            fn serialize(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_le_bytes());
            }
        }
    )*};
}

le_bytes!(i32, u32, i64, f64);

impl Serializable for bool {
    fn serialize(&self, buf: &mut Vec<u8>) {
        let id = if *self { ids::BOOL_TRUE } else { ids::BOOL_FALSE };
        id.serialize(buf);
    }
}

impl<const N: usize> Serializable for [u8; N] {
    fn serialize(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self);
    }
}

/// Length prefix, payload, zero padding to a multiple of four.
///
/// The long form carries a 24-bit length, so payloads must stay below
/// `2^24` bytes.
impl Serializable for [u8] {
    fn serialize(&self, buf: &mut Vec<u8>) {
        let len = self.len();
        debug_assert!(len <= 0x00ff_ffff, "bytes payload of {len} does not fit a 24-bit length");
        let header = if len <= 253 {
            buf.push(len as u8);
            1
        } else {
            buf.push(0xfe);
            buf.extend_from_slice(&(len as u32).to_le_bytes()[..3]);
            4
        };
        buf.extend_from_slice(self);
        buf.resize(buf.len() + (4 - (header + len) % 4) % 4, 0);
    }
}

impl Serializable for Vec<u8> {
    fn serialize(&self, buf: &mut Vec<u8>) {
        self.as_slice().serialize(buf);
    }
}

impl Serializable for str {
    fn serialize(&self, buf: &mut Vec<u8>) {
        self.as_bytes().serialize(buf);
    }
}

impl Serializable for String {
    fn serialize(&self, buf: &mut Vec<u8>) {
        self.as_bytes().serialize(buf);
    }
}

/// Boxed `Vector<T>`.
impl<T: Serializable> Serializable for [T] {
    fn serialize(&self, buf: &mut Vec<u8>) {
        ids::VECTOR.serialize(buf);
        RawVec::serialize_elements(self, buf);
    }
}

impl<T: Serializable> Serializable for Vec<T> {
    fn serialize(&self, buf: &mut Vec<u8>) {
        self.as_slice().serialize(buf);
    }
}

impl<T: Serializable> Serializable for RawVec<T> {
    fn serialize(&self, buf: &mut Vec<u8>) {
        Self::serialize_elements(&self.0, buf);
    }
}

impl<T: Serializable> RawVec<T> {
    fn serialize_elements(items: &[T], buf: &mut Vec<u8>) {
        (items.len() as i32).serialize(buf);
        for item in items {
            item.serialize(buf);
        }
    }
}

/// Wraps `payload` in a `gzip_packed` envelope, tag included.
pub fn gzip_packed(payload: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    let packed = match enc.write_all(payload).and_then(|()| enc.finish()) {
        Ok(packed) => packed,
        Err(_) => Vec::new(),
    };
    let mut out = ids::GZIP_PACKED.to_bytes();
    packed.serialize(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_alignment() {
        for (len, total) in [(0, 4), (1, 4), (3, 4), (4, 8), (253, 256), (254, 260), (255, 260)] {
            assert_eq!(vec![0u8; len].to_bytes().len(), total, "len {len}");
        }
    }

    #[test]
    fn largest_framable_payload() {
        let bytes = vec![0u8; 0x00ff_ffff].to_bytes();
        assert_eq!(&bytes[..4], [0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(bytes.len(), 4 + 0x00ff_ffff + 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "24-bit length")]
    fn oversized_payload_is_refused() {
        let _ = vec![0u8; 0x0100_0000].to_bytes();
    }

    #[test]
    fn boxed_vector() {
        assert_eq!(
            [1i32, 2][..].to_bytes(),
            [0x15, 0xc4, 0xb5, 0x1c, 2, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0],
        );
    }

    #[test]
    fn bare_vector() {
        assert_eq!(RawVec(vec![7i64]).to_bytes(), [1, 0, 0, 0, 7, 0, 0, 0, 0, 0, 0, 0]);
    }
}
