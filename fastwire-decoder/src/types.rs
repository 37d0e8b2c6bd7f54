/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Field types and type decoders.
//!
//! A type decoder turns the primitives of [`crate::primitive`] into a typed
//! [`FieldValue`], enforcing the integer width of the field and the decimal
//! exponent range.

use crate::config::DecoderConfig;
use crate::cursor::ByteCursor;
use crate::primitive::{read_ascii, read_byte_vector, read_int, read_uint};
use fastwire_core::{FastError, FieldValue, ScaledDecimal};
use serde::{Deserialize, Serialize};

/// Smallest decimal exponent the protocol allows.
pub const MIN_EXPONENT: i64 = -63;

/// Largest decimal exponent the protocol allows.
pub const MAX_EXPONENT: i64 = 63;

/// Logical type of a template field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Scaled decimal (exponent + mantissa).
    Decimal,
    /// 7-bit ASCII string.
    Ascii,
    /// Length-prefixed byte vector.
    ByteVector,
}

impl FieldType {
    /// Returns true for the four integer types.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::UInt32 | Self::UInt64 | Self::Int32 | Self::Int64)
    }

    /// Returns true for ASCII strings and byte vectors.
    #[must_use]
    pub const fn is_byte_run(self) -> bool {
        matches!(self, Self::Ascii | Self::ByteVector)
    }

    /// Returns true if `value` is a valid value of this type.
    #[must_use]
    pub fn accepts(self, value: &FieldValue) -> bool {
        match (self, value) {
            (Self::UInt32, FieldValue::UInt(v)) => u32::try_from(*v).is_ok(),
            (Self::Int32, FieldValue::Int(v)) => i32::try_from(*v).is_ok(),
            (Self::Decimal, FieldValue::Decimal(d)) => {
                (MIN_EXPONENT..=MAX_EXPONENT).contains(&i64::from(d.exponent))
            }
            (Self::UInt64, FieldValue::UInt(_))
            | (Self::Int64, FieldValue::Int(_))
            | (Self::Ascii, FieldValue::Ascii(_))
            | (Self::ByteVector, FieldValue::Bytes(_)) => true,
            _ => false,
        }
    }

    /// Builds an integer value of this type, checking its width.
    ///
    /// # Errors
    /// Returns `FastError::IntegerOverflow` if `value` does not fit, or
    /// `FastError::InvalidOperator` if this is not an integer type.
    pub fn integer_value(self, value: i128) -> Result<FieldValue, FastError> {
        let overflow = |_| FastError::IntegerOverflow;
        match self {
            Self::UInt32 => u32::try_from(value)
                .map(|v| FieldValue::UInt(u64::from(v)))
                .map_err(overflow),
            Self::UInt64 => u64::try_from(value).map(FieldValue::UInt).map_err(overflow),
            Self::Int32 => i32::try_from(value)
                .map(|v| FieldValue::Int(i64::from(v)))
                .map_err(overflow),
            Self::Int64 => i64::try_from(value).map(FieldValue::Int).map_err(overflow),
            other => Err(FastError::InvalidOperator(format!(
                "{other:?} is not an integer type"
            ))),
        }
    }

    /// Builds a string or byte-vector value of this type from raw bytes.
    ///
    /// # Errors
    /// Returns `FastError::InvalidString` if ASCII bytes are not valid text,
    /// or `FastError::InvalidOperator` for non byte-run types.
    pub fn byte_run_value(self, bytes: Vec<u8>) -> Result<FieldValue, FastError> {
        match self {
            Self::Ascii => String::from_utf8(bytes)
                .map(FieldValue::Ascii)
                .map_err(|_| FastError::InvalidString),
            Self::ByteVector => Ok(FieldValue::Bytes(bytes.into())),
            other => Err(FastError::InvalidOperator(format!(
                "{other:?} is not a string or byte vector type"
            ))),
        }
    }

    /// Returns the zero value used as a delta base when nothing else applies.
    #[must_use]
    pub fn zero_value(self) -> FieldValue {
        match self {
            Self::UInt32 | Self::UInt64 => FieldValue::UInt(0),
            Self::Int32 | Self::Int64 => FieldValue::Int(0),
            Self::Decimal => FieldValue::Decimal(ScaledDecimal::default()),
            Self::Ascii => FieldValue::Ascii(String::new()),
            Self::ByteVector => FieldValue::Bytes(bytes::Bytes::new()),
        }
    }
}

/// Whether a field may be null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Presence {
    /// The field always resolves to a value.
    #[default]
    Mandatory,
    /// The field may be null; it uses the nullable wire encodings.
    Optional,
}

impl Presence {
    /// Returns true for [`Presence::Optional`].
    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::Optional)
    }
}

/// Reads one value of `field_type` from the stream.
///
/// `nullable` selects the nullable wire encoding used by optional fields;
/// `Ok(None)` means the null sentinel was read.
///
/// # Errors
/// Propagates primitive failures and width/exponent violations.
pub fn read_value<C: ByteCursor + ?Sized>(
    cursor: &mut C,
    field_type: FieldType,
    nullable: bool,
    config: &DecoderConfig,
) -> Result<Option<FieldValue>, FastError> {
    match field_type {
        FieldType::UInt32 | FieldType::UInt64 => read_uint(cursor, nullable)?
            .map(|v| field_type.integer_value(i128::from(v)))
            .transpose(),
        FieldType::Int32 | FieldType::Int64 => read_int(cursor, nullable)?
            .map(|v| field_type.integer_value(i128::from(v)))
            .transpose(),
        FieldType::Decimal => Ok(read_decimal(cursor, nullable)?.map(FieldValue::Decimal)),
        FieldType::Ascii => {
            Ok(read_ascii(cursor, nullable, config.max_stopbit_length)?.map(FieldValue::Ascii))
        }
        FieldType::ByteVector => Ok(read_byte_vector(
            cursor,
            nullable,
            config.max_byte_vector_length,
        )?
        .map(FieldValue::Bytes)),
    }
}

/// Reads a decimal: exponent (nullable when `nullable`) then mantissa.
///
/// A null exponent means a null decimal and no mantissa follows.
///
/// # Errors
/// Returns `FastError::InvalidDecimal` for exponents outside [-63, 63].
pub fn read_decimal<C: ByteCursor + ?Sized>(
    cursor: &mut C,
    nullable: bool,
) -> Result<Option<ScaledDecimal>, FastError> {
    let Some(exponent) = read_int(cursor, nullable)? else {
        return Ok(None);
    };
    let mantissa = read_int(cursor, false)?.unwrap_or_default();
    checked_decimal(i128::from(exponent), i128::from(mantissa)).map(Some)
}

/// Builds a decimal from widened components, validating both ranges.
///
/// # Errors
/// Returns `FastError::InvalidDecimal` for an out-of-range exponent, or
/// `FastError::IntegerOverflow` for a mantissa outside i64.
pub fn checked_decimal(exponent: i128, mantissa: i128) -> Result<ScaledDecimal, FastError> {
    let mantissa = i64::try_from(mantissa).map_err(|_| FastError::IntegerOverflow)?;
    match i64::try_from(exponent) {
        Ok(exp) if (MIN_EXPONENT..=MAX_EXPONENT).contains(&exp) => {
            // range-checked above
            Ok(ScaledDecimal::new(mantissa, exp as i32))
        }
        _ => Err(FastError::InvalidDecimal {
            exponent: i64::try_from(exponent).unwrap_or(i64::MAX),
            mantissa,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::BufCursor;
    use crate::encoder::FastEncoder;

    fn read(
        bytes: &[u8],
        field_type: FieldType,
        nullable: bool,
    ) -> Result<Option<FieldValue>, FastError> {
        let mut cursor = BufCursor::new(bytes);
        read_value(&mut cursor, field_type, nullable, &DecoderConfig::default())
    }

    #[test]
    fn test_read_unsigned_widths() {
        let mut encoder = FastEncoder::new();
        encoder.encode_uint(u64::from(u32::MAX) + 1);
        let bytes = encoder.finish();

        assert_eq!(
            read(&bytes, FieldType::UInt64, false).unwrap(),
            Some(FieldValue::UInt(u64::from(u32::MAX) + 1))
        );
        assert_eq!(
            read(&bytes, FieldType::UInt32, false),
            Err(FastError::IntegerOverflow)
        );
    }

    #[test]
    fn test_read_signed_widths() {
        let mut encoder = FastEncoder::new();
        encoder.encode_int(i64::from(i32::MIN) - 1);
        let bytes = encoder.finish();

        assert_eq!(
            read(&bytes, FieldType::Int64, false).unwrap(),
            Some(FieldValue::Int(i64::from(i32::MIN) - 1))
        );
        assert_eq!(
            read(&bytes, FieldType::Int32, false),
            Err(FastError::IntegerOverflow)
        );
    }

    #[test]
    fn test_read_nullable_integer() {
        assert_eq!(read(&[0x80], FieldType::Int32, true).unwrap(), None);
        assert_eq!(
            read(&[0x80], FieldType::Int32, false).unwrap(),
            Some(FieldValue::Int(0))
        );
    }

    #[test]
    fn test_read_decimal() {
        let mut encoder = FastEncoder::new();
        encoder.encode_decimal(ScaledDecimal::new(12345, -2));
        let bytes = encoder.finish();

        assert_eq!(
            read(&bytes, FieldType::Decimal, false).unwrap(),
            Some(FieldValue::Decimal(ScaledDecimal::new(12345, -2)))
        );
    }

    #[test]
    fn test_read_nullable_decimal_has_no_mantissa() {
        let data = [0x80, 0x81];
        let mut cursor = BufCursor::new(&data[..]);
        assert_eq!(read_decimal(&mut cursor, true).unwrap(), None);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_read_decimal_exponent_out_of_range() {
        let mut encoder = FastEncoder::new();
        encoder.encode_int(64).encode_int(1);
        let bytes = encoder.finish();

        assert_eq!(
            read(&bytes, FieldType::Decimal, false),
            Err(FastError::InvalidDecimal {
                exponent: 64,
                mantissa: 1
            })
        );
    }

    #[test]
    fn test_read_ascii_and_bytes() {
        assert_eq!(
            read(&[b'A', b'B' | 0x80], FieldType::Ascii, false).unwrap(),
            Some(FieldValue::from("AB"))
        );
        assert_eq!(
            read(&[0x82, 7, 8], FieldType::ByteVector, false).unwrap(),
            Some(FieldValue::Bytes(bytes::Bytes::from_static(&[7, 8])))
        );
    }

    #[test]
    fn test_accepts() {
        assert!(FieldType::UInt32.accepts(&FieldValue::UInt(5)));
        assert!(!FieldType::UInt32.accepts(&FieldValue::UInt(u64::MAX)));
        assert!(!FieldType::UInt64.accepts(&FieldValue::Int(5)));
        assert!(FieldType::Ascii.accepts(&FieldValue::from("x")));
        assert!(!FieldType::Decimal.accepts(&FieldValue::Decimal(ScaledDecimal::new(1, 99))));
    }

    #[test]
    fn test_integer_value() {
        assert_eq!(
            FieldType::UInt32.integer_value(-1),
            Err(FastError::IntegerOverflow)
        );
        assert_eq!(FieldType::Int64.integer_value(-1).unwrap(), FieldValue::Int(-1));
        assert!(matches!(
            FieldType::Ascii.integer_value(1),
            Err(FastError::InvalidOperator(_))
        ));
    }

    #[test]
    fn test_byte_run_value() {
        assert_eq!(
            FieldType::Ascii.byte_run_value(b"XYZ".to_vec()).unwrap(),
            FieldValue::from("XYZ")
        );
        assert_eq!(
            FieldType::Ascii.byte_run_value(vec![0xFF]),
            Err(FastError::InvalidString)
        );
    }
}
