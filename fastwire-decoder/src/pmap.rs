/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! FAST presence map handling.
//!
//! The presence map (PMAP) is a bitmap that indicates which fields of a
//! message or group entry carry a value on the wire. It uses stop-bit
//! encoding: the high bit of each byte marks the last byte, the other seven
//! bits are presence bits, most significant first.

use crate::cursor::ByteCursor;
use crate::primitive::{DATA_MASK, STOP_BIT, read_stopbit_value};
use fastwire_core::FastError;
use smallvec::SmallVec;

/// Outcome of consuming one presence bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceBit {
    /// The bit was present and set.
    Set,
    /// The bit was present and clear.
    Clear,
    /// The map had no bit left; lenient decoding treats this as clear.
    Exhausted,
}

impl PresenceBit {
    /// Returns true only for [`PresenceBit::Set`].
    #[inline]
    #[must_use]
    pub const fn is_set(self) -> bool {
        matches!(self, Self::Set)
    }
}

/// FAST presence map.
///
/// Bits are consumed front to back as fields are decoded. Reads past the end
/// report [`PresenceBit::Exhausted`] and are counted in
/// [`PresenceMap::overruns`].
#[derive(Debug, Clone, Default)]
pub struct PresenceMap {
    /// The raw bits of the presence map.
    bits: SmallVec<[bool; 28]>,
    /// Current bit position.
    position: usize,
    /// Number of reads past the last bit.
    overruns: usize,
}

impl PresenceMap {
    /// Creates an empty presence map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a presence map from raw bits.
    #[must_use]
    pub fn from_bits(bits: impl IntoIterator<Item = bool>) -> Self {
        Self {
            bits: bits.into_iter().collect(),
            position: 0,
            overruns: 0,
        }
    }

    /// Decodes a presence map from the cursor.
    ///
    /// # Arguments
    /// * `cursor` - The input stream
    /// * `max_bytes` - Longest accepted map, in bytes
    ///
    /// # Errors
    /// Returns `FastError::TruncatedInput` if the data is incomplete, or
    /// `FastError::Overlong` if the map is longer than `max_bytes`.
    pub fn decode<C: ByteCursor + ?Sized>(
        cursor: &mut C,
        max_bytes: usize,
    ) -> Result<Self, FastError> {
        let run = read_stopbit_value(cursor, max_bytes)?;
        let mut bits = SmallVec::with_capacity(run.len() * 7);

        for byte in run.iter().map(|b| b & DATA_MASK) {
            // Extract 7 bits (excluding stop bit)
            for i in (0..7).rev() {
                bits.push((byte >> i) & 1 == 1);
            }
        }

        Ok(Self {
            bits,
            position: 0,
            overruns: 0,
        })
    }

    /// Consumes the next bit, distinguishing exhaustion from a clear bit.
    pub fn consume(&mut self) -> PresenceBit {
        match self.bits.get(self.position) {
            Some(&bit) => {
                self.position += 1;
                if bit {
                    PresenceBit::Set
                } else {
                    PresenceBit::Clear
                }
            }
            None => {
                self.overruns += 1;
                PresenceBit::Exhausted
            }
        }
    }

    /// Returns the next bit from the presence map.
    ///
    /// # Returns
    /// `true` if the field is present, `false` otherwise.
    /// Returns `false` if the map is exhausted.
    #[inline]
    pub fn next_bit(&mut self) -> bool {
        self.consume().is_set()
    }

    /// Consumes the next bit under the given strictness.
    ///
    /// # Errors
    /// Returns `FastError::PMapExhausted` when `strict` is set and the map
    /// has no bit left.
    pub fn take(&mut self, strict: bool) -> Result<bool, FastError> {
        match self.consume() {
            PresenceBit::Exhausted if strict => Err(FastError::PMapExhausted {
                capacity: self.bits.len(),
            }),
            bit => Ok(bit.is_set()),
        }
    }

    /// Returns the number of bits in the presence map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns true if the presence map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the current position in the presence map.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of reads that ran past the last bit.
    #[must_use]
    pub fn overruns(&self) -> usize {
        self.overruns
    }

    /// Returns true if a set bit remains unconsumed.
    #[must_use]
    pub fn has_unconsumed_set_bits(&self) -> bool {
        self.bits[self.position.min(self.bits.len())..]
            .iter()
            .any(|&bit| bit)
    }

    /// Encodes the presence map to bytes.
    ///
    /// # Returns
    /// The encoded bytes with stop-bit encoding.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        if self.bits.is_empty() {
            return vec![STOP_BIT]; // Empty pmap with stop bit
        }

        let mut result = Vec::with_capacity(self.bits.len().div_ceil(7));

        for chunk in self.bits.chunks(7) {
            let mut byte: u8 = 0;

            // Pack 7 bits into each byte
            for (i, &bit) in chunk.iter().enumerate() {
                if bit {
                    byte |= 1 << (6 - i);
                }
            }

            result.push(byte);
        }

        // Set stop bit on the last byte
        if let Some(last) = result.last_mut() {
            *last |= STOP_BIT;
        }

        result
    }
}
