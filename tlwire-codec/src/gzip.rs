//! `gzip_packed#3072cfa1 packed_data:bytes = Object`.

use std::io::Read;

use flate2::read::{GzDecoder, ZlibDecoder};

use crate::cursor::Buffer;
use crate::error::{Error, Result};
use crate::primitive::read_bytes;

/// Inflated size a decoder accepts unless configured otherwise (16 MiB).
pub const DEFAULT_MAX_INFLATED_LEN: usize = 16 * 1024 * 1024;

/// Inflates `data`, refusing to produce more than `limit` bytes.
///
/// Servers send gzip streams; a bare zlib stream is accepted as well.
pub fn inflate(data: &[u8], limit: usize) -> std::result::Result<Vec<u8>, String> {
    let cap = u64::try_from(limit).unwrap_or(u64::MAX).saturating_add(1);
    let mut out = Vec::new();
    if GzDecoder::new(data).take(cap).read_to_end(&mut out).is_err() {
        out.clear();
        ZlibDecoder::new(data)
            .take(cap)
            .read_to_end(&mut out)
            .map_err(|e| format!("decompression failed: {e}"))?;
    }
    if out.len() > limit {
        return Err(format!("inflated size exceeds {limit} bytes"));
    }
    Ok(out)
}

/// Reads the `packed_data` of a `gzip_packed` whose tag was just consumed
/// and returns the inflated bytes. `buf` is left just past the envelope.
pub fn unpack(buf: Buffer, limit: usize) -> Result<Vec<u8>> {
    let offset = buf.pos().saturating_sub(4);
    let packed = read_bytes(buf)?;
    log::trace!("[tlwire] gzip_packed at {offset}: {} packed bytes", packed.len());
    inflate(packed, limit).map_err(|reason| Error::Gzip { offset, reason })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::gzip_packed;
    use crate::Cursor;

    #[test]
    fn unpack_leaves_cursor_after_envelope() {
        let mut wire = gzip_packed(b"hello, packed world");
        wire.extend([1, 2, 3, 4]);
        let mut c = Cursor::from_slice(&wire);
        c.skip(4).unwrap();
        assert_eq!(unpack(&mut c, 1024).unwrap(), b"hello, packed world");
        assert_eq!(c.remaining(), 4);
    }

    #[test]
    fn limit_is_enforced() {
        let wire = gzip_packed(&[0u8; 4096]);
        let mut c = Cursor::from_slice(&wire);
        c.skip(4).unwrap();
        assert!(matches!(unpack(&mut c, 100), Err(Error::Gzip { offset: 0, .. })));
    }

    #[test]
    fn empty_payload_inflates_to_nothing() {
        let wire = gzip_packed(&[]);
        let mut c = Cursor::from_slice(&wire);
        c.skip(4).unwrap();
        assert_eq!(unpack(&mut c, 1024).unwrap(), Vec::<u8>::new());
        assert!(c.is_empty());
    }

    #[test]
    fn zlib_stream_is_accepted() {
        use flate2::{write::ZlibEncoder, Compression};
        use std::io::Write;

        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"zlib body").unwrap();
        assert_eq!(inflate(&enc.finish().unwrap(), 1024).unwrap(), b"zlib body");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(inflate(b"definitely not deflate", 1024).is_err());
    }
}
