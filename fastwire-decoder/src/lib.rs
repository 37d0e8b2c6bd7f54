/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! # fastwire decoder
//!
//! Template-driven decoding of FAST (FIX Adapted for STreaming) messages.
//!
//! FAST is a binary encoding used for high-volume market data feeds. It
//! compresses FIX-style messages with stop-bit encoded primitives, presence
//! maps, and field operators that derive values from the previous message.
//!
//! ## Features
//!
//! - **Stop-bit primitives**: Integers, scaled decimals, ASCII strings, byte vectors
//! - **Presence maps**: Lenient by default, optionally strict
//! - **Field operators**: Constant, Default, Copy, Increment, Delta, Tail
//! - **Sequences**: Repeating groups with per-repetition presence maps
//! - **Sessions**: Immutable templates shared across per-stream dictionaries
//!
//! ## Quick Start
//!
//! ```rust
//! use fastwire_decoder::{
//!     BufCursor, Field, FieldType, FastEncoder, Operator, Session, Template,
//! };
//! use std::sync::Arc;
//!
//! let template = Template::new(
//!     1,
//!     "Trade",
//!     [
//!         Field::mandatory(34, FieldType::UInt32, Operator::Increment).into(),
//!         Field::mandatory(55, FieldType::Ascii, Operator::Copy).into(),
//!     ],
//! )?;
//! let mut session = Session::new(Arc::new(template));
//!
//! let mut encoder = FastEncoder::new();
//! encoder.encode_bits(&[true, true]).encode_uint(1).encode_ascii("IBM");
//! encoder.encode_bits(&[false, false]);
//! let data = encoder.finish();
//!
//! let mut cursor = BufCursor::new(&data[..]);
//! session.decode(&mut cursor)?;
//! let second = session.decode(&mut cursor)?;
//! assert_eq!(second.get(34u32).and_then(|v| v.as_u64()), Some(2));
//! assert_eq!(second.get(55u32).and_then(|v| v.as_str()), Some("IBM"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod cursor;
pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod operators;
pub mod pmap;
pub mod primitive;
pub mod session;
pub mod template;
pub mod types;

pub use config::DecoderConfig;
pub use cursor::{BufCursor, ByteCursor, EndOfInput};
pub use decoder::FastDecoder;
pub use dictionary::{Dictionary, DictionaryValue};
pub use encoder::FastEncoder;
pub use operators::Operator;
pub use pmap::{PresenceBit, PresenceMap};
pub use session::{Session, SessionStats};
pub use template::{DecodeContext, Field, Sequence, Template, TemplateUnit};
pub use types::{FieldType, Presence};

pub use fastwire_core::{
    DecodeError, DecodedField, DecodedMessage, FastError, FieldTag, FieldValue, Result,
    ScaledDecimal,
};
