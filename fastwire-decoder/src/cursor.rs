/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Byte cursor abstraction.
//!
//! The decoder only needs to pull one byte at a time and know how far it has
//! read. Where the bytes come from (socket, file, replay buffer) belongs to
//! the caller; [`BufCursor`] adapts anything implementing [`bytes::Buf`].

use bytes::{Buf, Bytes, BytesMut};
use fastwire_core::FastError;
use thiserror::Error;

/// The underlying source has no more bytes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("end of input")]
pub struct EndOfInput;

impl From<EndOfInput> for FastError {
    fn from(_: EndOfInput) -> Self {
        FastError::TruncatedInput
    }
}

/// Sequential byte source consumed by the decoder.
pub trait ByteCursor {
    /// Reads the next byte.
    ///
    /// # Errors
    /// Returns [`EndOfInput`] when the source is exhausted.
    fn read_next_byte(&mut self) -> Result<u8, EndOfInput>;

    /// Returns the number of bytes consumed so far.
    fn position(&self) -> usize;

    /// Reads exactly `len` raw bytes.
    ///
    /// # Errors
    /// Returns [`EndOfInput`] if fewer than `len` bytes remain.
    fn read_bytes(&mut self, len: usize) -> Result<Bytes, EndOfInput> {
        let mut out = BytesMut::with_capacity(len.min(4096));
        for _ in 0..len {
            out.extend_from_slice(&[self.read_next_byte()?]);
        }
        Ok(out.freeze())
    }
}

/// [`ByteCursor`] over any [`Buf`]: `&[u8]`, `Bytes`, `BytesMut`, chains.
#[derive(Debug, Clone)]
pub struct BufCursor<B> {
    buf: B,
    position: usize,
}

impl<B: Buf> BufCursor<B> {
    /// Wraps a buffer.
    #[must_use]
    pub const fn new(buf: B) -> Self {
        Self { buf, position: 0 }
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Returns true if every byte has been read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }
}

impl<B: Buf> ByteCursor for BufCursor<B> {
    #[inline]
    fn read_next_byte(&mut self) -> Result<u8, EndOfInput> {
        if !self.buf.has_remaining() {
            return Err(EndOfInput);
        }
        self.position += 1;
        Ok(self.buf.get_u8())
    }

    #[inline]
    fn position(&self) -> usize {
        self.position
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, EndOfInput> {
        if self.buf.remaining() < len {
            return Err(EndOfInput);
        }
        self.position += len;
        Ok(self.buf.copy_to_bytes(len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buf_cursor_reads_in_order() {
        let data = [1u8, 2, 3];
        let mut cursor = BufCursor::new(&data[..]);
        assert_eq!(cursor.read_next_byte().unwrap(), 1);
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_bytes(2).unwrap().as_ref(), &[2, 3]);
        assert_eq!(cursor.position(), 3);
        assert!(cursor.is_empty());
        assert_eq!(cursor.read_next_byte(), Err(EndOfInput));
    }

    #[test]
    fn test_buf_cursor_short_read_leaves_position() {
        let mut cursor = BufCursor::new(Bytes::from_static(&[9, 9]));
        assert_eq!(cursor.read_bytes(3), Err(EndOfInput));
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn test_end_of_input_maps_to_truncated() {
        assert_eq!(FastError::from(EndOfInput), FastError::TruncatedInput);
    }
}
