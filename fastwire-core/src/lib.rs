/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fastwire core
//!
//! Value, message, and error types shared by the fastwire FAST decoder.
//!
//! - **Error types**: [`FastError`] kinds and located [`DecodeError`]s
//! - **Field types**: [`FieldTag`], [`FieldValue`], [`ScaledDecimal`]
//! - **Message types**: [`DecodedMessage`], an ordered `(tag, value)` list

pub mod error;
pub mod field;
pub mod message;

pub use error::{DecodeError, FastError, Result};
pub use field::{FieldTag, FieldValue, ScaledDecimal};
pub use message::{DecodedField, DecodedMessage};
