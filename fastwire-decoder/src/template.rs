/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Templates and the units they are made of.
//!
//! A [`Template`] is an ordered list of [`TemplateUnit`]s, each either a
//! scalar [`Field`] or a repeating [`Sequence`]. Templates are immutable once
//! built; the previous-value state their operators need lives in a
//! [`Dictionary`] owned by the decoding session, addressed by the slot each
//! field is given in [`Template::new`].

use crate::config::DecoderConfig;
use crate::cursor::ByteCursor;
use crate::dictionary::{Dictionary, DictionaryValue};
use crate::operators::{self, Operator};
use crate::pmap::PresenceMap;
use crate::types::{FieldType, Presence};
use fastwire_core::{DecodeError, DecodedMessage, FastError, FieldTag, FieldValue, Result};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Mutable state threaded through one message decode.
#[derive(Debug)]
pub struct DecodeContext<'a> {
    /// Previous values for the template being decoded.
    pub dictionary: &'a mut Dictionary,
    /// Active configuration.
    pub config: &'a DecoderConfig,
    pmap_overruns: usize,
}

impl<'a> DecodeContext<'a> {
    /// Creates a context over a session's dictionary.
    #[must_use]
    pub fn new(dictionary: &'a mut Dictionary, config: &'a DecoderConfig) -> Self {
        Self {
            dictionary,
            config,
            pmap_overruns: 0,
        }
    }

    /// Returns the number of presence-bit reads that ran past a map so far.
    #[must_use]
    pub const fn pmap_overruns(&self) -> usize {
        self.pmap_overruns
    }

    /// Closes a presence-map scope.
    ///
    /// Records over-reads, and under strict handling rejects a map with set
    /// bits nobody consumed.
    pub(crate) fn close_scope(
        &mut self,
        pmap: &PresenceMap,
        tag: Option<FieldTag>,
        offset: usize,
    ) -> Result<()> {
        if pmap.overruns() > 0 {
            self.pmap_overruns += pmap.overruns();
            warn!(
                overruns = pmap.overruns(),
                bits = pmap.len(),
                offset,
                "presence map over-read, missing bits treated as clear"
            );
        }
        if self.config.strict_pmap && pmap.has_unconsumed_set_bits() {
            return Err(DecodeError {
                kind: FastError::InvalidPresenceMap,
                tag,
                offset,
            });
        }
        Ok(())
    }
}

/// A scalar template field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    tag: FieldTag,
    field_type: FieldType,
    #[serde(default)]
    presence: Presence,
    #[serde(default)]
    operator: Operator,
    #[serde(default)]
    initial_value: Option<FieldValue>,
    #[serde(skip)]
    slot: usize,
}

impl Field {
    /// Creates a field without an initial value.
    #[must_use]
    pub fn new(
        tag: impl Into<FieldTag>,
        field_type: FieldType,
        presence: Presence,
        operator: Operator,
    ) -> Self {
        Self {
            tag: tag.into(),
            field_type,
            presence,
            operator,
            initial_value: None,
            slot: 0,
        }
    }

    /// Creates a mandatory field.
    #[must_use]
    pub fn mandatory(tag: impl Into<FieldTag>, field_type: FieldType, operator: Operator) -> Self {
        Self::new(tag, field_type, Presence::Mandatory, operator)
    }

    /// Creates an optional field.
    #[must_use]
    pub fn optional(tag: impl Into<FieldTag>, field_type: FieldType, operator: Operator) -> Self {
        Self::new(tag, field_type, Presence::Optional, operator)
    }

    /// Sets the initial value.
    #[must_use]
    pub fn with_initial_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Returns the field tag.
    #[must_use]
    pub const fn tag(&self) -> FieldTag {
        self.tag
    }

    /// Returns the field type.
    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns the field presence.
    #[must_use]
    pub const fn presence(&self) -> Presence {
        self.presence
    }

    /// Returns true if the field may be null.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.presence.is_optional()
    }

    /// Returns the field operator.
    #[must_use]
    pub const fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the initial value, if any.
    #[must_use]
    pub const fn initial_value(&self) -> Option<&FieldValue> {
        self.initial_value.as_ref()
    }

    /// Returns the dictionary slot assigned by [`Template::new`].
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// Returns true if the field consumes a bit of the enclosing presence map.
    #[must_use]
    pub const fn requires_pmap(&self) -> bool {
        self.operator.requires_pmap(self.presence)
    }

    /// Checks that operator, type, and initial value fit together.
    ///
    /// # Errors
    /// Returns `FastError::InvalidOperator` describing the mismatch.
    pub fn validate(&self) -> std::result::Result<(), FastError> {
        let invalid =
            |reason: &str| Err(FastError::InvalidOperator(format!("field {}: {reason}", self.tag)));

        match self.operator {
            Operator::Increment if !self.field_type.is_integer() => {
                return invalid("increment requires an integer type");
            }
            Operator::Tail if !self.field_type.is_byte_run() => {
                return invalid("tail requires a string or byte vector type");
            }
            Operator::Constant if self.initial_value.is_none() => {
                return invalid("constant requires an initial value");
            }
            _ => {}
        }

        match &self.initial_value {
            Some(value) if !self.field_type.accepts(value) => {
                let reason = format!("initial value {value} is not a {:?}", self.field_type);
                invalid(reason.as_str())
            }
            _ => Ok(()),
        }
    }

    /// Decodes this field, attributing any failure to its tag and start offset.
    ///
    /// # Errors
    /// Returns a [`DecodeError`] carrying the field tag.
    pub fn decode<C: ByteCursor + ?Sized>(
        &self,
        cursor: &mut C,
        pmap: &mut PresenceMap,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<Option<FieldValue>> {
        let offset = cursor.position();
        let value = operators::decode_field(self, cursor, pmap, ctx.dictionary, ctx.config)
            .map_err(|kind| DecodeError::field(kind, self.tag, offset))?;
        trace!(tag = %self.tag, operator = ?self.operator, ?value, "decoded field");
        Ok(value)
    }

    /// Returns the field's dictionary entry to its initial state.
    ///
    /// Copy, increment and tail entries are seeded with the initial value,
    /// or left undefined without one. Delta entries are always undefined.
    pub fn reset(&self, dictionary: &mut Dictionary) {
        match self.operator {
            Operator::Copy | Operator::Increment | Operator::Tail => match &self.initial_value {
                Some(initial) => {
                    dictionary.set(self.slot, DictionaryValue::Assigned(initial.clone()));
                }
                None => dictionary.clear(self.slot),
            },
            Operator::Delta => dictionary.clear(self.slot),
            Operator::None | Operator::Constant | Operator::Default => {}
        }
    }
}

/// A repeating group: a length field followed by repeated units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    length: Field,
    units: Vec<TemplateUnit>,
    #[serde(skip)]
    has_pmap: bool,
}

impl Sequence {
    /// Creates a sequence.
    #[must_use]
    pub fn new(length: Field, units: Vec<TemplateUnit>) -> Self {
        let has_pmap = units.iter().any(TemplateUnit::requires_pmap);
        Self {
            length,
            units,
            has_pmap,
        }
    }

    /// Returns the length field.
    #[must_use]
    pub const fn length_field(&self) -> &Field {
        &self.length
    }

    /// Returns the repeated units.
    #[must_use]
    pub fn units(&self) -> &[TemplateUnit] {
        &self.units
    }

    /// Returns true if every repetition starts with its own presence map.
    #[must_use]
    pub const fn has_pmap(&self) -> bool {
        self.has_pmap
    }

    /// Decodes the length and every repetition into `out`.
    ///
    /// # Errors
    /// Returns `FastError::MalformedLength` (tagged with the length field) for
    /// a negative or oversized length, or the first error of a repetition.
    pub fn decode<C: ByteCursor + ?Sized>(
        &self,
        cursor: &mut C,
        pmap: &mut PresenceMap,
        ctx: &mut DecodeContext<'_>,
        out: &mut DecodedMessage,
    ) -> Result<()> {
        let tag = self.length.tag();
        let offset = cursor.position();
        let Some(length) = self.length.decode(cursor, pmap, ctx)? else {
            emit(out, ctx.config, tag, None);
            return Ok(());
        };
        let count = repetitions(&length, ctx.config.max_sequence_length)
            .map_err(|kind| DecodeError::field(kind, tag, offset))?;
        emit(out, ctx.config, tag, Some(length));
        trace!(%tag, count, "decoding sequence");

        for _ in 0..count {
            let entry_offset = cursor.position();
            let mut entry_pmap = if self.has_pmap {
                PresenceMap::decode(cursor, ctx.config.max_pmap_bytes)
                    .map_err(|kind| DecodeError::field(kind, tag, entry_offset))?
            } else {
                PresenceMap::new()
            };
            decode_units(&self.units, cursor, &mut entry_pmap, ctx, out)?;
            ctx.close_scope(&entry_pmap, Some(tag), entry_offset)?;
        }
        Ok(())
    }

    /// Resets the length field and every nested unit.
    pub fn reset(&self, dictionary: &mut Dictionary) {
        self.length.reset(dictionary);
        for unit in &self.units {
            unit.reset(dictionary);
        }
    }

    fn validate(&self) -> std::result::Result<(), FastError> {
        if !self.length.field_type().is_integer() {
            return Err(FastError::InvalidOperator(format!(
                "sequence length {} must be an integer",
                self.length.tag()
            )));
        }
        self.length.validate()?;
        self.units.iter().try_for_each(TemplateUnit::validate)
    }
}

fn repetitions(length: &FieldValue, max: u32) -> std::result::Result<u32, FastError> {
    let length = length.as_i128().ok_or(FastError::MalformedLength { length: -1 })?;
    u32::try_from(length)
        .ok()
        .filter(|&n| n <= max)
        .ok_or(FastError::MalformedLength { length })
}

/// One element of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TemplateUnit {
    /// A scalar field.
    Field(Field),
    /// A repeating group.
    Sequence(Sequence),
}

impl TemplateUnit {
    /// Returns true if the unit consumes a bit of the enclosing presence map.
    #[must_use]
    pub const fn requires_pmap(&self) -> bool {
        match self {
            Self::Field(field) => field.requires_pmap(),
            Self::Sequence(sequence) => sequence.length.requires_pmap(),
        }
    }

    /// Decodes the unit, appending its output to `out`.
    ///
    /// # Errors
    /// Returns the first [`DecodeError`] of the unit.
    pub fn decode<C: ByteCursor + ?Sized>(
        &self,
        cursor: &mut C,
        pmap: &mut PresenceMap,
        ctx: &mut DecodeContext<'_>,
        out: &mut DecodedMessage,
    ) -> Result<()> {
        match self {
            Self::Field(field) => {
                let value = field.decode(cursor, pmap, ctx)?;
                emit(out, ctx.config, field.tag(), value);
                Ok(())
            }
            Self::Sequence(sequence) => sequence.decode(cursor, pmap, ctx, out),
        }
    }

    /// Resets the unit's dictionary entries.
    pub fn reset(&self, dictionary: &mut Dictionary) {
        match self {
            Self::Field(field) => field.reset(dictionary),
            Self::Sequence(sequence) => sequence.reset(dictionary),
        }
    }

    fn validate(&self) -> std::result::Result<(), FastError> {
        match self {
            Self::Field(field) => field.validate(),
            Self::Sequence(sequence) => sequence.validate(),
        }
    }

    fn prepare(&mut self, next_slot: &mut usize) {
        match self {
            Self::Field(field) => {
                field.slot = *next_slot;
                *next_slot += 1;
            }
            Self::Sequence(sequence) => {
                sequence.length.slot = *next_slot;
                *next_slot += 1;
                for unit in &mut sequence.units {
                    unit.prepare(next_slot);
                }
                sequence.has_pmap = sequence.units.iter().any(Self::requires_pmap);
            }
        }
    }
}

impl From<Field> for TemplateUnit {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

impl From<Sequence> for TemplateUnit {
    fn from(sequence: Sequence) -> Self {
        Self::Sequence(sequence)
    }
}

/// An immutable message layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    id: u32,
    name: String,
    units: Vec<TemplateUnit>,
    slots: usize,
}

impl Template {
    /// Creates a template, validating every field and assigning dictionary slots.
    ///
    /// # Arguments
    /// * `id` - Template identifier
    /// * `name` - Human-readable name
    /// * `units` - Ordered fields and sequences
    ///
    /// # Errors
    /// Returns `FastError::InvalidOperator` for an operator the field's type
    /// or initial value cannot support.
    pub fn new(
        id: u32,
        name: impl Into<String>,
        units: impl IntoIterator<Item = TemplateUnit>,
    ) -> std::result::Result<Self, FastError> {
        let mut units: Vec<TemplateUnit> = units.into_iter().collect();
        units.iter().try_for_each(TemplateUnit::validate)?;

        let mut slots = 0;
        for unit in &mut units {
            unit.prepare(&mut slots);
        }

        Ok(Self {
            id,
            name: name.into(),
            units,
            slots,
        })
    }

    /// Returns the template ID.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Returns the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the template units.
    #[must_use]
    pub fn units(&self) -> &[TemplateUnit] {
        &self.units
    }

    /// Returns the number of dictionary slots the template uses.
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.slots
    }

    /// Creates a dictionary sized for this template, in its reset state.
    #[must_use]
    pub fn new_dictionary(&self) -> Dictionary {
        let mut dictionary = Dictionary::with_slots(self.slots);
        self.reset(&mut dictionary);
        dictionary
    }

    /// Decodes one message: a presence map followed by the template units.
    ///
    /// On error the cursor position is unspecified; dictionary entries of
    /// fields decoded before the failing one keep their new values.
    ///
    /// # Errors
    /// Returns the first [`DecodeError`] encountered.
    pub fn decode<C: ByteCursor + ?Sized>(
        &self,
        cursor: &mut C,
        ctx: &mut DecodeContext<'_>,
    ) -> Result<DecodedMessage> {
        let offset = cursor.position();
        let mut pmap = PresenceMap::decode(cursor, ctx.config.max_pmap_bytes)
            .map_err(|kind| DecodeError::at(kind, offset))?;

        let mut message = DecodedMessage::with_template_id(self.id);
        self.decode_with_pmap(cursor, &mut pmap, ctx, &mut message)?;
        ctx.close_scope(&pmap, None, offset)?;
        Ok(message)
    }

    /// Decodes the template units against an already-read presence map.
    ///
    /// # Errors
    /// Returns the first [`DecodeError`] encountered.
    pub fn decode_with_pmap<C: ByteCursor + ?Sized>(
        &self,
        cursor: &mut C,
        pmap: &mut PresenceMap,
        ctx: &mut DecodeContext<'_>,
        out: &mut DecodedMessage,
    ) -> Result<()> {
        decode_units(&self.units, cursor, pmap, ctx, out)
    }

    /// Returns every stateful field of the template to its initial state.
    pub fn reset(&self, dictionary: &mut Dictionary) {
        for unit in &self.units {
            unit.reset(dictionary);
        }
    }
}

fn decode_units<C: ByteCursor + ?Sized>(
    units: &[TemplateUnit],
    cursor: &mut C,
    pmap: &mut PresenceMap,
    ctx: &mut DecodeContext<'_>,
    out: &mut DecodedMessage,
) -> Result<()> {
    for unit in units {
        unit.decode(cursor, pmap, ctx, out)?;
    }
    Ok(())
}

fn emit(
    out: &mut DecodedMessage,
    config: &DecoderConfig,
    tag: FieldTag,
    value: Option<FieldValue>,
) {
    if value.is_some() || config.emit_null_fields {
        out.push(tag, value);
    }
}
