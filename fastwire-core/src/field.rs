/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Field identifiers and decoded field values.
//!
//! This module provides:
//! - [`FieldTag`]: Type-safe wrapper for the numeric tag of a template field
//! - [`ScaledDecimal`]: FAST decimal as an exponent/mantissa pair
//! - [`FieldValue`]: Enumeration of the typed values a field can decode to

use bytes::Bytes;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric tag identifying a field, usually the FIX tag it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct FieldTag(u32);

impl FieldTag {
    /// Creates a new field tag.
    #[inline]
    #[must_use]
    pub const fn new(tag: u32) -> Self {
        Self(tag)
    }

    /// Returns the raw tag number.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<u32> for FieldTag {
    fn from(tag: u32) -> Self {
        Self(tag)
    }
}

impl From<FieldTag> for u32 {
    fn from(tag: FieldTag) -> Self {
        tag.0
    }
}

impl fmt::Display for FieldTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// FAST decimal: `mantissa * 10^exponent`.
///
/// Kept in wire form so that delta arithmetic on the two components stays
/// exact; use [`ScaledDecimal::to_decimal`] for arithmetic on the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScaledDecimal {
    /// Signed mantissa.
    pub mantissa: i64,
    /// Power-of-ten exponent.
    pub exponent: i32,
}

impl ScaledDecimal {
    /// Creates a decimal from its components.
    #[inline]
    #[must_use]
    pub const fn new(mantissa: i64, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }

    /// Converts to a [`Decimal`], if the value fits its 96-bit, scale-28 range.
    #[must_use]
    pub fn to_decimal(self) -> Option<Decimal> {
        let mantissa = i128::from(self.mantissa);
        if self.exponent <= 0 {
            Decimal::try_from_i128_with_scale(mantissa, self.exponent.unsigned_abs()).ok()
        } else {
            let factor = 10i128.checked_pow(self.exponent.unsigned_abs())?;
            let value = mantissa.checked_mul(factor)?;
            Decimal::try_from_i128_with_scale(value, 0).ok()
        }
    }
}

impl fmt::Display for ScaledDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(decimal) => write!(f, "{decimal}"),
            None => write!(f, "{}E{}", self.mantissa, self.exponent),
        }
    }
}

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldValue {
    /// Unsigned integer (uInt32 / uInt64).
    UInt(u64),
    /// Signed integer (int32 / int64).
    Int(i64),
    /// Scaled decimal.
    Decimal(ScaledDecimal),
    /// ASCII string.
    Ascii(String),
    /// Raw byte vector.
    Bytes(Bytes),
}

impl FieldValue {
    /// Returns the value as a u64, if it is an unsigned integer.
    #[must_use]
    pub const fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an i64, if it is a signed integer.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns either integer variant widened to i128.
    #[must_use]
    pub const fn as_i128(&self) -> Option<i128> {
        match self {
            Self::UInt(v) => Some(*v as i128),
            Self::Int(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Returns the value as a decimal, if applicable.
    #[must_use]
    pub const fn as_decimal(&self) -> Option<ScaledDecimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the value as a string, if applicable.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Ascii(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the raw bytes of a string or byte-vector value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Ascii(s) => Some(s.as_bytes()),
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<ScaledDecimal> for FieldValue {
    fn from(v: ScaledDecimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Ascii(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Ascii(v)
    }
}

impl From<Bytes> for FieldValue {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Ascii(s) => f.write_str(s),
            Self::Bytes(b) => {
                for byte in b.iter() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}
