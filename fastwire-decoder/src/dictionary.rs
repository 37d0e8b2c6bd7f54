/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Previous-value dictionary.
//!
//! Stateful operators (copy, increment, delta, tail) read and write the value
//! a field had in the previous message. The dictionary holds one entry per
//! field slot of a template and belongs to a single decoding session; the
//! template itself stays immutable.

use fastwire_core::FieldValue;

/// State for a dictionary entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DictionaryValue {
    /// No value is known: nothing decoded since a reset and no initial value.
    #[default]
    Undefined,
    /// The last value was null.
    Empty,
    /// The last decoded value.
    Assigned(FieldValue),
}

impl DictionaryValue {
    /// Returns true if the value is undefined.
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns true if the value is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the assigned value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&FieldValue> {
        match self {
            Self::Assigned(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Option<FieldValue>> for DictionaryValue {
    fn from(value: Option<FieldValue>) -> Self {
        value.map_or(Self::Empty, Self::Assigned)
    }
}

static UNDEFINED: DictionaryValue = DictionaryValue::Undefined;

/// Per-session store of previous values, indexed by field slot.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<DictionaryValue>,
}

impl Dictionary {
    /// Creates a dictionary with `slots` undefined entries.
    #[must_use]
    pub fn with_slots(slots: usize) -> Self {
        Self {
            entries: vec![DictionaryValue::Undefined; slots],
        }
    }

    /// Returns the entry for a slot. Unknown slots read as undefined.
    #[must_use]
    pub fn get(&self, slot: usize) -> &DictionaryValue {
        self.entries.get(slot).unwrap_or(&UNDEFINED)
    }

    /// Stores a value for a slot, growing the dictionary if needed.
    pub fn set(&mut self, slot: usize, value: DictionaryValue) {
        if slot >= self.entries.len() {
            self.entries.resize(slot + 1, DictionaryValue::Undefined);
        }
        self.entries[slot] = value;
    }

    /// Marks a slot undefined.
    pub fn clear(&mut self, slot: usize) {
        if let Some(entry) = self.entries.get_mut(slot) {
            *entry = DictionaryValue::Undefined;
        }
    }

    /// Marks every slot undefined.
    pub fn clear_all(&mut self) {
        self.entries.fill(DictionaryValue::Undefined);
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dictionary has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
