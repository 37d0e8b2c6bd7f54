/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Stop-bit primitive reader.
//!
//! Every FAST primitive is a run of bytes whose high bit marks the last byte
//! of the run; the remaining 7 bits of each byte carry data, most significant
//! group first. This module reads such runs off a [`ByteCursor`] and turns
//! them into integers, ASCII strings, and byte vectors, applying the nullable
//! encoding used by optional fields.

use crate::cursor::ByteCursor;
use bytes::{Bytes, BytesMut};
use fastwire_core::FastError;

/// Stop bit: set on the final byte of a run.
pub const STOP_BIT: u8 = 0x80;

/// Data bits of each byte.
pub const DATA_MASK: u8 = 0x7F;

/// Longest run that can hold a 64-bit integer (plus the nullable shift).
pub const MAX_INTEGER_BYTES: usize = 10;

/// Reads a stop-bit terminated run, stop byte included.
///
/// The bytes are returned as they appear on the wire, still 7-bit packed and
/// with the stop bit set on the last one.
///
/// # Errors
/// Returns `FastError::TruncatedInput` if the input ends before a stop byte,
/// or `FastError::Overlong` if the run is longer than `limit` bytes.
pub fn read_stopbit_value<C: ByteCursor + ?Sized>(
    cursor: &mut C,
    limit: usize,
) -> Result<Bytes, FastError> {
    let mut run = BytesMut::new();
    loop {
        let byte = cursor.read_next_byte()?;
        if run.len() == limit {
            return Err(FastError::Overlong { limit });
        }
        run.extend_from_slice(&[byte]);
        if byte & STOP_BIT != 0 {
            return Ok(run.freeze());
        }
    }
}

/// Reassembles an unsigned integer from a stop-bit run.
///
/// With `nullable` set, wire value 0 is null and every other value is
/// shifted down by one.
///
/// # Errors
/// Returns `FastError::IntegerOverflow` if the value does not fit in a u64.
pub fn decode_uint(run: &[u8], nullable: bool) -> Result<Option<u64>, FastError> {
    if run.is_empty() {
        return Err(FastError::TruncatedInput);
    }
    if run.len() > MAX_INTEGER_BYTES {
        return Err(FastError::IntegerOverflow);
    }

    let mut value: u128 = 0;
    for byte in run {
        value = (value << 7) | u128::from(byte & DATA_MASK);
    }

    if nullable {
        if value == 0 {
            return Ok(None);
        }
        value -= 1;
    }

    u64::try_from(value)
        .map(Some)
        .map_err(|_| FastError::IntegerOverflow)
}

/// Reassembles a signed integer from a stop-bit run.
///
/// The sign is taken from bit 6 of the first byte. With `nullable` set, wire
/// value 0 is null and non-negative values are shifted down by one.
///
/// # Errors
/// Returns `FastError::IntegerOverflow` if the value does not fit in an i64.
pub fn decode_int(run: &[u8], nullable: bool) -> Result<Option<i64>, FastError> {
    let Some(first) = run.first() else {
        return Err(FastError::TruncatedInput);
    };
    if run.len() > MAX_INTEGER_BYTES {
        return Err(FastError::IntegerOverflow);
    }

    let mut value: i128 = if first & 0x40 != 0 { -1 } else { 0 };
    for byte in run {
        value = (value << 7) | i128::from(byte & DATA_MASK);
    }

    if nullable {
        if value == 0 {
            return Ok(None);
        }
        if value > 0 {
            value -= 1;
        }
    }

    i64::try_from(value)
        .map(Some)
        .map_err(|_| FastError::IntegerOverflow)
}

/// Decodes an ASCII string from a stop-bit run.
///
/// Mandatory: `0x80` is `""` and `0x00 0x80` is `"\0"`.
/// Nullable: `0x80` is null, `0x00 0x80` is `""` and `0x00 0x00 0x80` is `"\0"`.
///
/// # Errors
/// Returns `FastError::InvalidNull` when a leading zero byte is followed by
/// anything other than the sentinels above.
pub fn decode_ascii(run: &[u8], nullable: bool) -> Result<Option<String>, FastError> {
    let chars: Vec<u8> = run.iter().map(|b| b & DATA_MASK).collect();

    if chars.first() == Some(&0) {
        let zeros = if nullable { 3 } else { 2 };
        return match chars.len() {
            1 if nullable => Ok(None),
            1 => Ok(Some(String::new())),
            2 if nullable && chars[1] == 0 => Ok(Some(String::new())),
            n if n == zeros && chars.iter().all(|&c| c == 0) => Ok(Some("\0".to_string())),
            _ => Err(FastError::InvalidNull),
        };
    }

    // 7-bit bytes are always valid UTF-8
    String::from_utf8(chars)
        .map(Some)
        .map_err(|_| FastError::InvalidString)
}

/// Reads an unsigned integer.
///
/// # Errors
/// Propagates truncation and overflow failures.
pub fn read_uint<C: ByteCursor + ?Sized>(
    cursor: &mut C,
    nullable: bool,
) -> Result<Option<u64>, FastError> {
    let run = read_integer_run(cursor)?;
    decode_uint(&run, nullable)
}

/// Reads a signed integer.
///
/// # Errors
/// Propagates truncation and overflow failures.
pub fn read_int<C: ByteCursor + ?Sized>(
    cursor: &mut C,
    nullable: bool,
) -> Result<Option<i64>, FastError> {
    let run = read_integer_run(cursor)?;
    decode_int(&run, nullable)
}

/// Reads an ASCII string whose run is at most `limit` bytes.
///
/// # Errors
/// Propagates truncation, length, and sentinel failures.
pub fn read_ascii<C: ByteCursor + ?Sized>(
    cursor: &mut C,
    nullable: bool,
    limit: usize,
) -> Result<Option<String>, FastError> {
    let run = read_stopbit_value(cursor, limit)?;
    decode_ascii(&run, nullable)
}

/// Reads a length-prefixed byte vector of at most `max_len` bytes.
///
/// # Errors
/// Returns `FastError::MalformedLength` if the prefix exceeds `max_len`.
pub fn read_byte_vector<C: ByteCursor + ?Sized>(
    cursor: &mut C,
    nullable: bool,
    max_len: usize,
) -> Result<Option<Bytes>, FastError> {
    let Some(len) = read_uint(cursor, nullable)? else {
        return Ok(None);
    };
    let len = usize::try_from(len)
        .ok()
        .filter(|&len| len <= max_len)
        .ok_or(FastError::MalformedLength {
            length: i128::from(len),
        })?;
    Ok(Some(cursor.read_bytes(len)?))
}

fn read_integer_run<C: ByteCursor + ?Sized>(cursor: &mut C) -> Result<Bytes, FastError> {
    read_stopbit_value(cursor, MAX_INTEGER_BYTES).map_err(|err| match err {
        FastError::Overlong { .. } => FastError::IntegerOverflow,
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::BufCursor;

    #[test]
    fn test_read_stopbit_value() {
        let data = [0x01, 0x02, 0x83, 0x7F];
        let mut cursor = BufCursor::new(&data[..]);
        let run = read_stopbit_value(&mut cursor, 16).unwrap();
        assert_eq!(run.as_ref(), &[0x01, 0x02, 0x83]);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn test_read_stopbit_value_truncated() {
        let data = [0x01, 0x02];
        let mut cursor = BufCursor::new(&data[..]);
        assert_eq!(
            read_stopbit_value(&mut cursor, 16),
            Err(FastError::TruncatedInput)
        );
    }

    #[test]
    fn test_read_stopbit_value_overlong() {
        let data = [0x01, 0x02, 0x03, 0x84];
        let mut cursor = BufCursor::new(&data[..]);
        assert_eq!(
            read_stopbit_value(&mut cursor, 3),
            Err(FastError::Overlong { limit: 3 })
        );
    }

    #[test]
    fn test_decode_uint_single_byte() {
        assert_eq!(decode_uint(&[0x81], false).unwrap(), Some(1));
    }

    #[test]
    fn test_decode_uint_multi_byte() {
        // 942 = 7 * 128 + 46
        assert_eq!(decode_uint(&[0x07, 0xAE], false).unwrap(), Some(942));
        assert_eq!(decode_uint(&[0x00, 0x81], false).unwrap(), Some(1));
    }

    #[test]
    fn test_decode_uint_nullable() {
        assert_eq!(decode_uint(&[0x80], true).unwrap(), None);
        assert_eq!(decode_uint(&[0x81], true).unwrap(), Some(0));
        assert_eq!(decode_uint(&[0x80], false).unwrap(), Some(0));
    }

    #[test]
    fn test_decode_uint_u64_max_nullable() {
        // u64::MAX + 1 needs 65 bits: ten groups
        let run = [0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80];
        assert_eq!(decode_uint(&run, true).unwrap(), Some(u64::MAX));
        assert_eq!(decode_uint(&run, false), Err(FastError::IntegerOverflow));
    }

    #[test]
    fn test_decode_int_positive_and_negative() {
        assert_eq!(decode_int(&[0x81], false).unwrap(), Some(1));
        assert_eq!(decode_int(&[0xFF], false).unwrap(), Some(-1));
        // 64 needs a leading zero group so bit 6 reads as positive
        assert_eq!(decode_int(&[0x00, 0xC0], false).unwrap(), Some(64));
        assert_eq!(decode_int(&[0x7F, 0xBF], false).unwrap(), Some(-65));
    }

    #[test]
    fn test_decode_int_nullable() {
        assert_eq!(decode_int(&[0x80], true).unwrap(), None);
        assert_eq!(decode_int(&[0x81], true).unwrap(), Some(0));
        assert_eq!(decode_int(&[0xFF], true).unwrap(), Some(-1));
    }

    #[test]
    fn test_decode_int_overflow() {
        let run = [0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0x80];
        assert_eq!(decode_int(&run, false), Err(FastError::IntegerOverflow));
    }

    #[test]
    fn test_read_uint_rejects_eleven_byte_run() {
        let mut data = vec![0x00; 10];
        data.push(0x81);
        let mut cursor = BufCursor::new(&data[..]);
        assert_eq!(read_uint(&mut cursor, false), Err(FastError::IntegerOverflow));
    }

    #[test]
    fn test_decode_ascii() {
        assert_eq!(
            decode_ascii(&[b'H', b'i', b'!' | 0x80], false).unwrap(),
            Some("Hi!".to_string())
        );
    }

    #[test]
    fn test_decode_ascii_mandatory_sentinels() {
        assert_eq!(decode_ascii(&[0x80], false).unwrap(), Some(String::new()));
        assert_eq!(
            decode_ascii(&[0x00, 0x80], false).unwrap(),
            Some("\0".to_string())
        );
        assert_eq!(
            decode_ascii(&[0x00, 0xC1], false),
            Err(FastError::InvalidNull)
        );
    }

    #[test]
    fn test_decode_ascii_nullable_sentinels() {
        assert_eq!(decode_ascii(&[0x80], true).unwrap(), None);
        assert_eq!(
            decode_ascii(&[0x00, 0x80], true).unwrap(),
            Some(String::new())
        );
        assert_eq!(
            decode_ascii(&[0x00, 0x00, 0x80], true).unwrap(),
            Some("\0".to_string())
        );
        assert_eq!(
            decode_ascii(&[0x00, 0x41, 0x80], true),
            Err(FastError::InvalidNull)
        );
    }

    #[test]
    fn test_read_byte_vector() {
        let data = [0x83, 1, 2, 3];
        let mut cursor = BufCursor::new(&data[..]);
        let bytes = read_byte_vector(&mut cursor, false, 16).unwrap().unwrap();
        assert_eq!(bytes.as_ref(), &[1, 2, 3]);
    }

    #[test]
    fn test_read_byte_vector_nullable_and_bounds() {
        let data = [0x80];
        let mut cursor = BufCursor::new(&data[..]);
        assert_eq!(read_byte_vector(&mut cursor, true, 16).unwrap(), None);

        let data = [0x85, 1, 2];
        let mut cursor = BufCursor::new(&data[..]);
        assert_eq!(
            read_byte_vector(&mut cursor, false, 4),
            Err(FastError::MalformedLength { length: 5 })
        );

        let data = [0x83, 1];
        let mut cursor = BufCursor::new(&data[..]);
        assert_eq!(
            read_byte_vector(&mut cursor, false, 16),
            Err(FastError::TruncatedInput)
        );
    }
}
