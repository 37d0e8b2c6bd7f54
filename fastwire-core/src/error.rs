/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Error types for FAST message decoding.
//!
//! Errors come in two layers:
//! - [`FastError`]: what went wrong, as produced by primitive readers,
//!   presence maps, and operators.
//! - [`DecodeError`]: a [`FastError`] plus where it happened (field tag and
//!   byte offset), as surfaced to callers of a template decode.

use crate::field::FieldTag;
use thiserror::Error;

/// Result type alias using [`DecodeError`] as the error type.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Kinds of failure that can occur while decoding a FAST stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FastError {
    /// The stream ended in the middle of a primitive or byte run.
    #[error("truncated input")]
    TruncatedInput,

    /// A mandatory field resolved to null.
    #[error("mandatory field resolved to null")]
    MandatoryNullViolation,

    /// A sequence or byte-vector length is negative or implausibly large.
    #[error("malformed length: {length}")]
    MalformedLength {
        /// The decoded length.
        length: i128,
    },

    /// A presence bit was requested beyond the decoded map.
    #[error("presence map exhausted after {capacity} bits")]
    PMapExhausted {
        /// Number of bits the map carried.
        capacity: usize,
    },

    /// Arithmetic or width overflow while decoding an integer.
    #[error("integer overflow")]
    IntegerOverflow,

    /// A null sentinel appeared where the encoding does not allow one.
    #[error("null sentinel not permitted here")]
    InvalidNull,

    /// Set presence bits were left unconsumed at the end of a scope.
    #[error("invalid presence map: set bits left unconsumed")]
    InvalidPresenceMap,

    /// Decimal exponent outside the range the protocol allows.
    #[error("invalid decimal: exponent={exponent}, mantissa={mantissa}")]
    InvalidDecimal {
        /// Decimal exponent.
        exponent: i64,
        /// Decimal mantissa.
        mantissa: i64,
    },

    /// A delta subtraction length removes more than the base value holds.
    #[error("subtraction length {length} exceeds base length {available}")]
    InvalidSubtraction {
        /// The decoded subtraction length.
        length: i64,
        /// Length of the base value.
        available: usize,
    },

    /// A spliced string value is not valid text.
    #[error("invalid string encoding")]
    InvalidString,

    /// A stop-bit run exceeded the configured bound.
    #[error("stop-bit run exceeds {limit} bytes")]
    Overlong {
        /// The bound that was exceeded.
        limit: usize,
    },

    /// Operator and field type cannot be combined.
    #[error("invalid operator: {0}")]
    InvalidOperator(String),

    /// Unknown template ID.
    #[error("unknown template id: {0}")]
    UnknownTemplate(u32),
}

/// A decode failure with the location it occurred at.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} at byte offset {offset}{}", field_suffix(.tag))]
pub struct DecodeError {
    /// What went wrong.
    pub kind: FastError,
    /// Tag of the field being decoded, if the failure belongs to a field.
    pub tag: Option<FieldTag>,
    /// Byte offset where the failing unit started.
    pub offset: usize,
}

impl DecodeError {
    /// Creates an error attributed to a field.
    #[must_use]
    pub const fn field(kind: FastError, tag: FieldTag, offset: usize) -> Self {
        Self {
            kind,
            tag: Some(tag),
            offset,
        }
    }

    /// Creates an error not attributed to any field (presence maps, template ids).
    #[must_use]
    pub const fn at(kind: FastError, offset: usize) -> Self {
        Self {
            kind,
            tag: None,
            offset,
        }
    }

    /// Returns the error kind.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &FastError {
        &self.kind
    }
}

fn field_suffix(tag: &Option<FieldTag>) -> String {
    match tag {
        Some(tag) => format!(" (field {tag})"),
        None => String::new(),
    }
}
