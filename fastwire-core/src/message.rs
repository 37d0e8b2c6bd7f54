/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Decoded message representation.
//!
//! A [`DecodedMessage`] is the ordered list of `(tag, value)` pairs produced
//! by one template decode, with repeating-group entries inlined in order.
//! Rendering it (tag=value text, application objects) is up to the caller.

use crate::field::{FieldTag, FieldValue};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One decoded `(tag, value)` pair. `value` is `None` for a null optional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedField {
    /// The field tag.
    pub tag: FieldTag,
    /// The decoded value, or `None` when null.
    pub value: Option<FieldValue>,
}

impl DecodedField {
    /// Creates a new decoded field.
    #[inline]
    #[must_use]
    pub const fn new(tag: FieldTag, value: Option<FieldValue>) -> Self {
        Self { tag, value }
    }
}

/// Ordered output of a single message decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedMessage {
    /// Template the message was decoded with, when known.
    template_id: Option<u32>,
    /// Fields in template declaration order.
    fields: SmallVec<[DecodedField; 16]>,
}

impl DecodedMessage {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty message tagged with the template it belongs to.
    #[must_use]
    pub fn with_template_id(template_id: u32) -> Self {
        Self {
            template_id: Some(template_id),
            fields: SmallVec::new(),
        }
    }

    /// Returns the template ID, if set.
    #[inline]
    #[must_use]
    pub const fn template_id(&self) -> Option<u32> {
        self.template_id
    }

    /// Appends a field.
    pub fn push(&mut self, tag: FieldTag, value: Option<FieldValue>) {
        self.fields.push(DecodedField::new(tag, value));
    }

    /// Returns all decoded fields in order.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[DecodedField] {
        &self.fields
    }

    /// Returns an iterator over the decoded fields.
    pub fn iter(&self) -> std::slice::Iter<'_, DecodedField> {
        self.fields.iter()
    }

    /// Returns the number of decoded fields.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field was decoded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the first non-null value for a tag.
    #[must_use]
    pub fn get(&self, tag: impl Into<FieldTag>) -> Option<&FieldValue> {
        let tag = tag.into();
        self.fields
            .iter()
            .filter(|f| f.tag == tag)
            .find_map(|f| f.value.as_ref())
    }

    /// Returns every entry for a tag, in order. Group fields repeat once per entry.
    pub fn get_all(&self, tag: impl Into<FieldTag>) -> impl Iterator<Item = &DecodedField> {
        let tag = tag.into();
        self.fields.iter().filter(move |f| f.tag == tag)
    }

    /// Returns true if the tag appears in the message.
    #[must_use]
    pub fn contains(&self, tag: impl Into<FieldTag>) -> bool {
        let tag = tag.into();
        self.fields.iter().any(|f| f.tag == tag)
    }

    /// Consumes the message and returns its fields.
    #[must_use]
    pub fn into_fields(self) -> Vec<DecodedField> {
        self.fields.into_vec()
    }
}

impl<'a> IntoIterator for &'a DecodedMessage {
    type Item = &'a DecodedField;
    type IntoIter = std::slice::Iter<'a, DecodedField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DecodedMessage {
        let mut msg = DecodedMessage::with_template_id(1);
        msg.push(FieldTag::new(34), Some(FieldValue::UInt(7)));
        msg.push(FieldTag::new(268), Some(FieldValue::UInt(2)));
        msg.push(FieldTag::new(270), Some(FieldValue::Int(100)));
        msg.push(FieldTag::new(270), None);
        msg
    }

    #[test]
    fn test_message_order_and_lookup() {
        let msg = sample();
        assert_eq!(msg.template_id(), Some(1));
        assert_eq!(msg.len(), 4);
        assert_eq!(msg.fields()[0].tag, FieldTag::new(34));
        assert_eq!(msg.get(34u32), Some(&FieldValue::UInt(7)));
        assert!(msg.get(999u32).is_none());
    }

    #[test]
    fn test_message_repeated_tags() {
        let msg = sample();
        let entries: Vec<_> = msg.get_all(270u32).collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].value.is_none());
        assert!(msg.contains(270u32));
    }

    #[test]
    fn test_message_into_fields() {
        let fields = sample().into_fields();
        assert_eq!(fields.len(), 4);
        assert!(DecodedMessage::new().is_empty());
    }
}
