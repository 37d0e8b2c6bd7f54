/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Single-template decoding session.
//!
//! A [`Session`] pairs a shared, immutable [`Template`] with the dictionary
//! state of one stream. Several sessions may decode independent streams with
//! the same template; each owns its dictionary.

use crate::config::DecoderConfig;
use crate::cursor::ByteCursor;
use crate::dictionary::Dictionary;
use crate::template::{DecodeContext, Template};
use fastwire_core::{DecodedMessage, Result};
use std::sync::Arc;
use tracing::debug;

/// Counters kept by a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Messages decoded successfully.
    pub messages: u64,
    /// Decodes that failed.
    pub errors: u64,
    /// Presence-bit reads that ran past the end of a map.
    pub pmap_overruns: u64,
}

/// Decodes a stream of messages that all use one template.
#[derive(Debug)]
pub struct Session {
    template: Arc<Template>,
    dictionary: Dictionary,
    config: DecoderConfig,
    stats: SessionStats,
}

impl Session {
    /// Creates a session with the default configuration.
    #[must_use]
    pub fn new(template: Arc<Template>) -> Self {
        Self::with_config(template, DecoderConfig::default())
    }

    /// Creates a session with a custom configuration.
    #[must_use]
    pub fn with_config(template: Arc<Template>, config: DecoderConfig) -> Self {
        let dictionary = template.new_dictionary();
        Self {
            template,
            dictionary,
            config,
            stats: SessionStats::default(),
        }
    }

    /// Decodes the next message from `cursor`.
    ///
    /// After an error the session should be [`reset`](Self::reset) before
    /// further use: the cursor position is unspecified and dictionary entries
    /// written before the failing field keep their new values.
    ///
    /// # Errors
    /// Returns the first [`DecodeError`](fastwire_core::DecodeError) of the message.
    pub fn decode<C: ByteCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<DecodedMessage> {
        let start = cursor.position();
        let mut ctx = DecodeContext::new(&mut self.dictionary, &self.config);
        let result = self.template.decode(cursor, &mut ctx);
        self.stats.pmap_overruns += ctx.pmap_overruns() as u64;

        match &result {
            Ok(message) => {
                self.stats.messages += 1;
                debug!(
                    template = self.template.id(),
                    fields = message.len(),
                    bytes = cursor.position() - start,
                    "decoded message"
                );
            }
            Err(err) => {
                self.stats.errors += 1;
                debug!(template = self.template.id(), error = %err, "decode failed");
            }
        }
        result
    }

    /// Returns the dictionary to its initial state.
    pub fn reset(&mut self) {
        self.template.reset(&mut self.dictionary);
        debug!(template = self.template.id(), "session reset");
    }

    /// Returns the session template.
    #[must_use]
    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    /// Returns the session configuration.
    #[must_use]
    pub const fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Returns the session dictionary.
    #[must_use]
    pub const fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Returns the session counters.
    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::BufCursor;
    use crate::encoder::FastEncoder;
    use crate::operators::Operator;
    use crate::template::{Field, Sequence};
    use crate::types::FieldType;
    use fastwire_core::{FastError, FieldTag, FieldValue, ScaledDecimal};

    fn quote_template() -> Arc<Template> {
        Arc::new(
            Template::new(
                1,
                "Quote",
                [
                    Field::mandatory(34, FieldType::UInt32, Operator::Increment).into(),
                    Field::mandatory(55, FieldType::Ascii, Operator::Copy).into(),
                    Field::mandatory(270, FieldType::Decimal, Operator::Delta).into(),
                    Field::optional(271, FieldType::UInt64, Operator::Default)
                        .with_initial_value(100u64)
                        .into(),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_copy_string_across_messages() {
        let mut session = Session::new(quote_template());

        let mut encoder = FastEncoder::new();
        // message 1: seq, symbol, price, size default
        encoder
            .encode_bits(&[true, true, false])
            .encode_uint(1)
            .encode_ascii("IBM")
            .encode_int(-2)
            .encode_int(12_345);
        // message 2: symbol bit clear reuses "IBM", explicit size
        encoder
            .encode_bits(&[false, false, true])
            .encode_int(0)
            .encode_int(5)
            .encode_nullable_uint(Some(300));
        let data = encoder.finish();
        let mut cursor = BufCursor::new(&data[..]);

        let first = session.decode(&mut cursor).unwrap();
        assert_eq!(first.template_id(), Some(1));
        assert_eq!(first.get(34u32), Some(&FieldValue::UInt(1)));
        assert_eq!(first.get(55u32), Some(&FieldValue::from("IBM")));
        assert_eq!(
            first.get(270u32),
            Some(&FieldValue::Decimal(ScaledDecimal::new(12_345, -2)))
        );
        assert_eq!(first.get(271u32), Some(&FieldValue::UInt(100)));

        let second = session.decode(&mut cursor).unwrap();
        assert_eq!(second.get(34u32), Some(&FieldValue::UInt(2)));
        assert_eq!(second.get(55u32), Some(&FieldValue::from("IBM")));
        assert_eq!(
            second.get(270u32),
            Some(&FieldValue::Decimal(ScaledDecimal::new(12_350, -2)))
        );
        assert_eq!(second.get(271u32), Some(&FieldValue::UInt(300)));

        assert!(cursor.is_empty());
        assert_eq!(session.stats().messages, 2);
        assert_eq!(session.stats().errors, 0);
    }

    #[test]
    fn test_optional_copy_string_carried_to_next_message() {
        let template = Template::new(
            3,
            "Status",
            [
                Field::mandatory(1, FieldType::UInt64, Operator::None).into(),
                Field::optional(2, FieldType::Ascii, Operator::Copy).into(),
            ],
        )
        .unwrap();
        let mut session = Session::new(Arc::new(template));

        let mut encoder = FastEncoder::new();
        encoder
            .encode_bits(&[true])
            .encode_uint(1)
            .encode_nullable_ascii(Some("OPEN"));
        encoder.encode_bits(&[false]).encode_uint(2);
        let data = encoder.finish();
        let mut cursor = BufCursor::new(&data[..]);

        let first = session.decode(&mut cursor).unwrap();
        assert_eq!(first.get(2u32), Some(&FieldValue::from("OPEN")));

        let second = session.decode(&mut cursor).unwrap();
        assert_eq!(second.get(1u32), Some(&FieldValue::UInt(2)));
        assert_eq!(second.get(2u32), Some(&FieldValue::from("OPEN")));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_sessions_have_independent_dictionaries() {
        let template = quote_template();
        let mut a = Session::new(Arc::clone(&template));
        let mut b = Session::new(template);

        let mut encoder = FastEncoder::new();
        encoder
            .encode_bits(&[true, true, false])
            .encode_uint(10)
            .encode_ascii("AAA")
            .encode_int(0)
            .encode_int(1);
        let data = encoder.finish();
        a.decode(&mut BufCursor::new(&data[..])).unwrap();

        // b has no previous symbol, so a cleared copy bit must fail
        let mut encoder = FastEncoder::new();
        encoder.encode_bits(&[true, false, false]).encode_uint(1);
        let err = b
            .decode(&mut BufCursor::new(&encoder.finish()[..]))
            .unwrap_err();
        assert_eq!(err.kind, FastError::MandatoryNullViolation);
        assert_eq!(err.tag, Some(FieldTag::new(55)));
        assert_eq!(b.stats().errors, 1);
        assert!(a.dictionary().get(1).value().is_some());
        assert!(b.dictionary().get(1).is_undefined());
    }

    #[test]
    fn test_reset_forgets_previous_values() {
        let mut session = Session::new(quote_template());

        let mut encoder = FastEncoder::new();
        encoder
            .encode_bits(&[true, true, false])
            .encode_uint(7)
            .encode_ascii("IBM")
            .encode_int(0)
            .encode_int(1);
        let data = encoder.finish();
        session.decode(&mut BufCursor::new(&data[..])).unwrap();

        session.reset();
        assert!(session.dictionary().get(0).is_undefined());
        assert!(session.dictionary().get(1).is_undefined());

        // after reset the delta base is zero again
        let msg = session.decode(&mut BufCursor::new(&data[..])).unwrap();
        assert_eq!(
            msg.get(270u32),
            Some(&FieldValue::Decimal(ScaledDecimal::new(1, 0)))
        );
    }

    #[test]
    fn test_session_truncated_message() {
        let mut session = Session::new(quote_template());
        let mut encoder = FastEncoder::new();
        encoder.encode_bits(&[true, true]).encode_uint(1);
        let mut data = encoder.finish();
        data.push(b'I');

        let err = session.decode(&mut BufCursor::new(&data[..])).unwrap_err();
        assert_eq!(err.kind, FastError::TruncatedInput);
        assert_eq!(err.tag, Some(FieldTag::new(55)));
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_session_with_sequence_and_overruns() {
        let template = Template::new(
            2,
            "Book",
            [
                Field::mandatory(34, FieldType::UInt32, Operator::None).into(),
                Sequence::new(
                    Field::mandatory(268, FieldType::UInt32, Operator::None),
                    vec![Field::optional(270, FieldType::Int64, Operator::Copy).into()],
                )
                .into(),
            ],
        )
        .unwrap();
        let mut session = Session::new(Arc::new(template));

        let mut encoder = FastEncoder::new();
        encoder
            .encode_bits(&[])
            .encode_uint(1)
            .encode_uint(2)
            .encode_bits(&[true])
            .encode_nullable_int(Some(5));
        // second entry's map is an empty map byte: seven clear bits
        encoder.encode_bits(&[]);
        let data = encoder.finish();

        let msg = session.decode(&mut BufCursor::new(&data[..])).unwrap();
        let prices: Vec<_> = msg.get_all(270u32).map(|f| f.value.clone()).collect();
        assert_eq!(
            prices,
            vec![Some(FieldValue::Int(5)), Some(FieldValue::Int(5))]
        );
        assert_eq!(session.stats().pmap_overruns, 0);
        assert_eq!(session.template().name(), "Book");
        assert!(!session.config().strict_pmap);
    }
}
