//! [`Cursor`], the byte source every decode reads from.

use crate::error::{Error, Result};

/// A position-tracking view over an in-memory buffer.
///
/// Reads either return exactly what was asked for or fail with
/// [`Error::StreamTruncated`]; the position never moves on failure.
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

/// Shorthand for the mutable cursor reference decode functions take.
pub type Buffer<'a, 'b> = &'a mut Cursor<'b>;

impl<'a> Cursor<'a> {
    /// A cursor at the start of `buf`.
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn pos(&self) -> usize { self.pos }

    /// Bytes left.
    pub fn remaining(&self) -> usize { self.buf.len() - self.pos }

    /// `true` once everything has been consumed.
    pub fn is_empty(&self) -> bool { self.remaining() == 0 }

    /// Borrows the next `n` bytes and advances past them.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::StreamTruncated { offset: self.pos, needed: n });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    /// Reads a single byte.
    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read_slice(1)?[0])
    }

    /// Fills `out` completely.
    pub fn read_exact(&mut self, out: &mut [u8]) -> Result<()> {
        out.copy_from_slice(self.read_slice(out.len())?);
        Ok(())
    }

    /// Reads exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        self.read_exact(&mut out)?;
        Ok(out)
    }

    /// Advances past `n` bytes without looking at them.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_slice(n).map(|_| ())
    }

    /// Moves back `n` bytes. Only the unknown-tag diagnostic uses this, and it
    /// re-reads the same bytes straight away.
    pub(crate) fn rewind(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }
}
