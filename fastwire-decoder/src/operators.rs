/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! FAST field operators.
//!
//! Operators define whether a field value is on the wire and how it is
//! derived from the previous value in the dictionary when it is not.
//!
//! | Operator  | Presence bit           | Reads stream      | Dictionary            |
//! |-----------|------------------------|-------------------|-----------------------|
//! | None      | no                     | always            | untouched             |
//! | Constant  | optional fields only   | never             | untouched             |
//! | Default   | yes                    | bit set           | untouched             |
//! | Copy      | yes                    | bit set           | written on bit set    |
//! | Increment | yes                    | bit set           | always written        |
//! | Delta     | no                     | always            | written unless null   |
//! | Tail      | yes                    | bit set (suffix)  | written on bit set    |

use crate::config::DecoderConfig;
use crate::cursor::ByteCursor;
use crate::dictionary::{Dictionary, DictionaryValue};
use crate::pmap::PresenceMap;
use crate::primitive::{read_ascii, read_byte_vector, read_int};
use crate::template::Field;
use crate::types::{FieldType, Presence, checked_decimal, read_value};
use fastwire_core::{FastError, FieldValue};
use serde::{Deserialize, Serialize};

/// FAST field operator types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Operator {
    /// No operator - value is always present in stream.
    #[default]
    None,
    /// Constant - value is never in stream, always uses initial value.
    Constant,
    /// Default - if absent, use initial value.
    Default,
    /// Copy - if absent, use previous value from dictionary.
    Copy,
    /// Increment - if absent, increment previous value by 1.
    Increment,
    /// Delta - value in stream is delta from previous value.
    Delta,
    /// Tail - value in stream replaces tail of previous value.
    Tail,
}

impl Operator {
    /// Returns true if this operator uses the dictionary.
    #[must_use]
    pub const fn uses_dictionary(&self) -> bool {
        matches!(
            self,
            Self::Copy | Self::Increment | Self::Delta | Self::Tail
        )
    }

    /// Returns true if a field with this operator consumes a presence map bit.
    #[must_use]
    pub const fn requires_pmap(&self, presence: Presence) -> bool {
        match self {
            Self::None | Self::Delta => false,
            Self::Constant => presence.is_optional(),
            Self::Default | Self::Copy | Self::Increment | Self::Tail => true,
        }
    }
}

/// Decodes one field according to its operator.
///
/// The dictionary is only written once the field's value is fully resolved,
/// so a failing field leaves it as it was.
///
/// # Errors
/// Returns `FastError::MandatoryNullViolation` if a mandatory field resolves
/// to null, and propagates every stream and arithmetic failure.
pub(crate) fn decode_field<C: ByteCursor + ?Sized>(
    field: &Field,
    cursor: &mut C,
    pmap: &mut PresenceMap,
    dict: &mut Dictionary,
    config: &DecoderConfig,
) -> Result<Option<FieldValue>, FastError> {
    let value = match field.operator() {
        Operator::None => read_field(field, cursor, config)?,
        Operator::Constant => decode_constant(field, pmap, config)?,
        Operator::Default => decode_default(field, cursor, pmap, config)?,
        Operator::Copy => decode_copy(field, cursor, pmap, dict, config)?,
        Operator::Increment => decode_increment(field, cursor, pmap, dict, config)?,
        Operator::Delta => decode_delta(field, cursor, dict, config)?,
        Operator::Tail => decode_tail(field, cursor, pmap, dict, config)?,
    };

    if value.is_none() && !field.is_optional() {
        return Err(FastError::MandatoryNullViolation);
    }
    Ok(value)
}

fn read_field<C: ByteCursor + ?Sized>(
    field: &Field,
    cursor: &mut C,
    config: &DecoderConfig,
) -> Result<Option<FieldValue>, FastError> {
    read_value(cursor, field.field_type(), field.is_optional(), config)
}

fn decode_constant(
    field: &Field,
    pmap: &mut PresenceMap,
    config: &DecoderConfig,
) -> Result<Option<FieldValue>, FastError> {
    if field.is_optional() && !pmap.take(config.strict_pmap)? {
        return Ok(None);
    }
    Ok(field.initial_value().cloned())
}

fn decode_default<C: ByteCursor + ?Sized>(
    field: &Field,
    cursor: &mut C,
    pmap: &mut PresenceMap,
    config: &DecoderConfig,
) -> Result<Option<FieldValue>, FastError> {
    if pmap.take(config.strict_pmap)? {
        read_field(field, cursor, config)
    } else {
        Ok(field.initial_value().cloned())
    }
}

fn decode_copy<C: ByteCursor + ?Sized>(
    field: &Field,
    cursor: &mut C,
    pmap: &mut PresenceMap,
    dict: &mut Dictionary,
    config: &DecoderConfig,
) -> Result<Option<FieldValue>, FastError> {
    if pmap.take(config.strict_pmap)? {
        let value = read_field(field, cursor, config)?;
        dict.set(field.slot(), value.clone().into());
        Ok(value)
    } else {
        Ok(previous_or_initial(field, dict))
    }
}

fn decode_increment<C: ByteCursor + ?Sized>(
    field: &Field,
    cursor: &mut C,
    pmap: &mut PresenceMap,
    dict: &mut Dictionary,
    config: &DecoderConfig,
) -> Result<Option<FieldValue>, FastError> {
    if pmap.take(config.strict_pmap)? {
        let value = read_field(field, cursor, config)?;
        dict.set(field.slot(), value.clone().into());
        return Ok(value);
    }

    match dict.get(field.slot()) {
        DictionaryValue::Assigned(previous) => {
            let previous = previous.as_i128().ok_or_else(|| not_integer(field))?;
            let next = field.field_type().integer_value(previous + 1)?;
            dict.set(field.slot(), DictionaryValue::Assigned(next.clone()));
            Ok(Some(next))
        }
        _ => Ok(previous_or_initial(field, dict)),
    }
}

fn decode_delta<C: ByteCursor + ?Sized>(
    field: &Field,
    cursor: &mut C,
    dict: &mut Dictionary,
    config: &DecoderConfig,
) -> Result<Option<FieldValue>, FastError> {
    let nullable = field.is_optional();
    let field_type = field.field_type();

    let value = match field_type {
        FieldType::UInt32 | FieldType::UInt64 | FieldType::Int32 | FieldType::Int64 => {
            let Some(delta) = read_int(cursor, nullable)? else {
                return Ok(None);
            };
            let base = delta_base(field, dict)?;
            let base = base.as_i128().ok_or_else(|| not_integer(field))?;
            field_type.integer_value(base + i128::from(delta))?
        }
        FieldType::Decimal => {
            let Some(exponent_delta) = read_int(cursor, nullable)? else {
                return Ok(None);
            };
            let mantissa_delta = read_int(cursor, false)?.unwrap_or_default();
            let base = delta_base(field, dict)?.as_decimal().unwrap_or_default();
            FieldValue::Decimal(checked_decimal(
                i128::from(base.exponent) + i128::from(exponent_delta),
                i128::from(base.mantissa) + i128::from(mantissa_delta),
            )?)
        }
        FieldType::Ascii | FieldType::ByteVector => {
            let Some(subtraction) = read_int(cursor, nullable)? else {
                return Ok(None);
            };
            if i32::try_from(subtraction).is_err() {
                return Err(FastError::IntegerOverflow);
            }
            let diff = if field_type == FieldType::Ascii {
                read_ascii(cursor, false, config.max_stopbit_length)?
                    .unwrap_or_default()
                    .into_bytes()
            } else {
                read_byte_vector(cursor, false, config.max_byte_vector_length)?
                    .unwrap_or_default()
                    .to_vec()
            };
            let base = delta_base(field, dict)?;
            let spliced = splice_delta(base.as_bytes().unwrap_or_default(), subtraction, &diff)?;
            field_type.byte_run_value(spliced)?
        }
    };

    dict.set(field.slot(), DictionaryValue::Assigned(value.clone()));
    Ok(Some(value))
}

fn decode_tail<C: ByteCursor + ?Sized>(
    field: &Field,
    cursor: &mut C,
    pmap: &mut PresenceMap,
    dict: &mut Dictionary,
    config: &DecoderConfig,
) -> Result<Option<FieldValue>, FastError> {
    if !pmap.take(config.strict_pmap)? {
        return Ok(previous_or_initial(field, dict));
    }

    let Some(tail) = read_field(field, cursor, config)? else {
        dict.set(field.slot(), DictionaryValue::Empty);
        return Ok(None);
    };

    let spliced = {
        let base = match dict.get(field.slot()) {
            DictionaryValue::Assigned(previous) => previous.as_bytes(),
            _ => field.initial_value().and_then(FieldValue::as_bytes),
        };
        splice_tail(
            base.unwrap_or_default(),
            tail.as_bytes().unwrap_or_default(),
        )
    };
    let value = field.field_type().byte_run_value(spliced)?;
    dict.set(field.slot(), DictionaryValue::Assigned(value.clone()));
    Ok(Some(value))
}

/// Resolves the value of a field whose presence bit is clear.
///
/// An undefined entry falls back to the initial value and records it; with
/// no initial value an optional field becomes null (recorded as empty) and a
/// mandatory one is left for the caller to reject.
fn previous_or_initial(field: &Field, dict: &mut Dictionary) -> Option<FieldValue> {
    match dict.get(field.slot()) {
        DictionaryValue::Assigned(previous) => Some(previous.clone()),
        DictionaryValue::Empty => None,
        DictionaryValue::Undefined => {
            let initial = field.initial_value().cloned();
            if initial.is_some() || field.is_optional() {
                dict.set(field.slot(), initial.clone().into());
            }
            initial
        }
    }
}

/// Base value for a delta: previous value, else zero or empty.
///
/// Delta carries no default across a reset, so an undefined entry always
/// means the first delta is absolute.
fn delta_base(field: &Field, dict: &Dictionary) -> Result<FieldValue, FastError> {
    match dict.get(field.slot()) {
        DictionaryValue::Assigned(previous) => Ok(previous.clone()),
        DictionaryValue::Undefined => Ok(field.field_type().zero_value()),
        DictionaryValue::Empty => Err(FastError::InvalidNull),
    }
}

/// Applies a string/byte delta to `base`.
///
/// A non-negative `subtraction` removes that many bytes from the end of the
/// base and appends `diff`. A negative one removes `-(subtraction + 1)` bytes
/// from the front and prepends `diff`.
///
/// # Errors
/// Returns `FastError::InvalidSubtraction` if more bytes would be removed
/// than the base holds.
pub fn splice_delta(base: &[u8], subtraction: i64, diff: &[u8]) -> Result<Vec<u8>, FastError> {
    let from_front = subtraction < 0;
    let remove = if from_front {
        -(subtraction + 1)
    } else {
        subtraction
    };
    let remove = usize::try_from(remove)
        .ok()
        .filter(|&n| n <= base.len())
        .ok_or(FastError::InvalidSubtraction {
            length: subtraction,
            available: base.len(),
        })?;

    let mut out = Vec::with_capacity(base.len() - remove + diff.len());
    if from_front {
        out.extend_from_slice(diff);
        out.extend_from_slice(&base[remove..]);
    } else {
        out.extend_from_slice(&base[..base.len() - remove]);
        out.extend_from_slice(diff);
    }
    Ok(out)
}

/// Replaces the last `tail.len()` bytes of `base` with `tail`.
#[must_use]
pub fn splice_tail(base: &[u8], tail: &[u8]) -> Vec<u8> {
    let keep = base.len().saturating_sub(tail.len());
    [&base[..keep], tail].concat()
}

fn not_integer(field: &Field) -> FastError {
    FastError::InvalidOperator(format!("field {} does not hold an integer", field.tag()))
}
