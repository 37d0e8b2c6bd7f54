/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! FAST primitive writer.
//!
//! Produces the stop-bit wire form of individual primitives. It knows nothing
//! about templates or operators: callers decide which primitives to write and
//! in what order, which makes it the tool for building reference byte
//! sequences for decoders.

use crate::pmap::PresenceMap;
use crate::primitive::{DATA_MASK, STOP_BIT};
use fastwire_core::ScaledDecimal;
use smallvec::SmallVec;

/// FAST primitive encoder.
#[derive(Debug, Default)]
pub struct FastEncoder {
    /// Output buffer.
    buffer: Vec<u8>,
}

impl FastEncoder {
    /// Creates a new FAST encoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new encoder with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encodes an unsigned integer using stop-bit encoding.
    pub fn encode_uint(&mut self, value: u64) -> &mut Self {
        self.push_unsigned(u128::from(value));
        self
    }

    /// Encodes a nullable unsigned integer.
    pub fn encode_nullable_uint(&mut self, value: Option<u64>) -> &mut Self {
        match value {
            Some(v) => self.push_unsigned(u128::from(v) + 1),
            None => self.buffer.push(STOP_BIT),
        }
        self
    }

    /// Encodes a signed integer using stop-bit encoding.
    pub fn encode_int(&mut self, value: i64) -> &mut Self {
        self.push_signed(i128::from(value));
        self
    }

    /// Encodes a nullable signed integer.
    pub fn encode_nullable_int(&mut self, value: Option<i64>) -> &mut Self {
        match value {
            Some(v) if v >= 0 => self.push_signed(i128::from(v) + 1),
            Some(v) => self.push_signed(i128::from(v)),
            None => self.buffer.push(STOP_BIT),
        }
        self
    }

    /// Encodes a mandatory decimal as exponent then mantissa.
    pub fn encode_decimal(&mut self, value: ScaledDecimal) -> &mut Self {
        self.encode_int(i64::from(value.exponent));
        self.encode_int(value.mantissa)
    }

    /// Encodes a nullable decimal; null is a null exponent with no mantissa.
    pub fn encode_nullable_decimal(&mut self, value: Option<ScaledDecimal>) -> &mut Self {
        match value {
            Some(d) => {
                self.encode_nullable_int(Some(i64::from(d.exponent)));
                self.encode_int(d.mantissa)
            }
            None => self.encode_nullable_int(None),
        }
    }

    /// Encodes a mandatory ASCII string.
    pub fn encode_ascii(&mut self, value: &str) -> &mut Self {
        match value {
            "" => self.buffer.push(STOP_BIT),
            "\0" => self.buffer.extend_from_slice(&[0x00, STOP_BIT]),
            _ => self.push_chars(value.as_bytes()),
        }
        self
    }

    /// Encodes a nullable ASCII string.
    pub fn encode_nullable_ascii(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            None => self.buffer.push(STOP_BIT),
            Some("") => self.buffer.extend_from_slice(&[0x00, STOP_BIT]),
            Some("\0") => self.buffer.extend_from_slice(&[0x00, 0x00, STOP_BIT]),
            Some(s) => self.push_chars(s.as_bytes()),
        }
        self
    }

    /// Encodes a byte vector with length prefix.
    pub fn encode_bytes(&mut self, value: &[u8]) -> &mut Self {
        self.encode_uint(value.len() as u64);
        self.buffer.extend_from_slice(value);
        self
    }

    /// Encodes a nullable byte vector.
    pub fn encode_nullable_bytes(&mut self, value: Option<&[u8]>) -> &mut Self {
        match value {
            Some(bytes) => {
                self.encode_nullable_uint(Some(bytes.len() as u64));
                self.buffer.extend_from_slice(bytes);
            }
            None => self.buffer.push(STOP_BIT),
        }
        self
    }

    /// Encodes a presence map.
    pub fn encode_pmap(&mut self, pmap: &PresenceMap) -> &mut Self {
        self.buffer.extend(pmap.encode());
        self
    }

    /// Encodes a presence map from a list of bits.
    pub fn encode_bits(&mut self, bits: &[bool]) -> &mut Self {
        self.encode_pmap(&PresenceMap::from_bits(bits.iter().copied()))
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    /// Returns a reference to the current buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the current buffer length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clears the buffer for reuse.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn push_unsigned(&mut self, value: u128) {
        let mut groups: SmallVec<[u8; 10]> = SmallVec::new();
        let mut v = value;
        loop {
            groups.push((v & u128::from(DATA_MASK)) as u8);
            v >>= 7;
            if v == 0 {
                break;
            }
        }
        self.push_groups(groups);
    }

    fn push_signed(&mut self, value: i128) {
        let mut groups: SmallVec<[u8; 10]> = SmallVec::new();
        let mut v = value;
        loop {
            let group = (v & i128::from(DATA_MASK)) as u8;
            v >>= 7;
            groups.push(group);
            // Stop once the remaining bits are pure sign extension of bit 6
            let sign = group & 0x40 != 0;
            if (v == 0 && !sign) || (v == -1 && sign) {
                break;
            }
        }
        self.push_groups(groups);
    }

    fn push_groups(&mut self, mut groups: SmallVec<[u8; 10]>) {
        groups.reverse();
        if let Some(last) = groups.last_mut() {
            *last |= STOP_BIT;
        }
        self.buffer.extend_from_slice(&groups);
    }

    fn push_chars(&mut self, chars: &[u8]) {
        let last = chars.len().saturating_sub(1);
        for (i, &c) in chars.iter().enumerate() {
            let c = c & DATA_MASK;
            self.buffer.push(if i == last { c | STOP_BIT } else { c });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::BufCursor;
    use crate::primitive::{read_ascii, read_int, read_uint};

    #[test]
    fn test_encode_uint_zero() {
        let mut encoder = FastEncoder::new();
        encoder.encode_uint(0);
        assert_eq!(encoder.finish(), vec![0x80]);
    }

    #[test]
    fn test_encode_uint_larger() {
        let mut encoder = FastEncoder::new();
        encoder.encode_uint(942);
        // 942 = 7 * 128 + 46, so first byte is 7, second is 46 | 0x80 = 0xAE
        assert_eq!(encoder.finish(), vec![0x07, 0xAE]);
    }

    #[test]
    fn test_encode_nullable_uint() {
        let mut encoder = FastEncoder::new();
        encoder.encode_nullable_uint(None).encode_nullable_uint(Some(0));
        assert_eq!(encoder.finish(), vec![0x80, 0x81]);
    }

    #[test]
    fn test_encode_int_sign_extension() {
        let mut encoder = FastEncoder::new();
        encoder.encode_int(-1).encode_int(63).encode_int(64).encode_int(-65);
        assert_eq!(
            encoder.finish(),
            vec![0xFF, 0xBF, 0x00, 0xC0, 0x7F, 0xBF]
        );
    }

    #[test]
    fn test_encode_int_extremes_read_back() {
        let mut encoder = FastEncoder::new();
        encoder
            .encode_int(i64::MIN)
            .encode_int(i64::MAX)
            .encode_nullable_int(Some(i64::MAX))
            .encode_nullable_uint(Some(u64::MAX));
        let bytes = encoder.finish();
        let mut cursor = BufCursor::new(&bytes[..]);
        assert_eq!(read_int(&mut cursor, false).unwrap(), Some(i64::MIN));
        assert_eq!(read_int(&mut cursor, false).unwrap(), Some(i64::MAX));
        assert_eq!(read_int(&mut cursor, true).unwrap(), Some(i64::MAX));
        assert_eq!(read_uint(&mut cursor, true).unwrap(), Some(u64::MAX));
    }

    #[test]
    fn test_encode_ascii() {
        let mut encoder = FastEncoder::new();
        encoder.encode_ascii("Hi!");
        assert_eq!(encoder.finish(), vec![b'H', b'i', b'!' | 0x80]);
    }

    #[test]
    fn test_encode_nullable_ascii_sentinels() {
        let mut encoder = FastEncoder::new();
        encoder
            .encode_nullable_ascii(None)
            .encode_nullable_ascii(Some(""))
            .encode_ascii("");
        let bytes = encoder.finish();
        assert_eq!(bytes, vec![0x80, 0x00, 0x80, 0x80]);

        let mut cursor = BufCursor::new(&bytes[..]);
        assert_eq!(read_ascii(&mut cursor, true, 16).unwrap(), None);
        assert_eq!(read_ascii(&mut cursor, true, 16).unwrap(), Some(String::new()));
        assert_eq!(read_ascii(&mut cursor, false, 16).unwrap(), Some(String::new()));
    }

    #[test]
    fn test_encode_bytes() {
        let mut encoder = FastEncoder::new();
        encoder.encode_bytes(&[1, 2, 3]);
        assert_eq!(encoder.finish(), vec![0x83, 1, 2, 3]);
    }

    #[test]
    fn test_encode_decimal() {
        let mut encoder = FastEncoder::new();
        encoder
            .encode_decimal(ScaledDecimal::new(12345, -2))
            .encode_nullable_decimal(None);
        assert_eq!(encoder.finish(), vec![0xFE, 0x00, 0x60, 0xB9, 0x80]);
    }

    #[test]
    fn test_encode_pmap_and_clear() {
        let mut encoder = FastEncoder::with_capacity(8);
        encoder.encode_bits(&[true, false, true]);
        assert_eq!(encoder.as_bytes(), &[0b1101_0000]);
        assert_eq!(encoder.len(), 1);

        encoder.clear();
        assert!(encoder.is_empty());
    }
}
