/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! Decoder configuration.
//!
//! This module provides the knobs that bound allocation and select between
//! lenient and strict presence-map handling.

use serde::{Deserialize, Serialize};

/// Configuration shared by [`Session`](crate::Session) and
/// [`FastDecoder`](crate::FastDecoder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Fail on presence-bit over-reads and on set bits left unconsumed.
    pub strict_pmap: bool,
    /// Emit `(tag, None)` entries for optional fields that decoded to null.
    pub emit_null_fields: bool,
    /// Largest accepted sequence length.
    pub max_sequence_length: u32,
    /// Largest accepted byte-vector length prefix.
    pub max_byte_vector_length: usize,
    /// Largest accepted stop-bit run (strings).
    pub max_stopbit_length: usize,
    /// Largest accepted presence map, in bytes.
    pub max_pmap_bytes: usize,
}

impl DecoderConfig {
    /// Creates a lenient configuration with default bounds.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strict_pmap: false,
            emit_null_fields: false,
            max_sequence_length: 65_536,
            max_byte_vector_length: 1024 * 1024, // 1MB
            max_stopbit_length: 64 * 1024,
            max_pmap_bytes: 16,
        }
    }

    /// Creates a configuration with strict presence-map validation.
    #[must_use]
    pub const fn strict() -> Self {
        Self::new().with_strict_pmap(true)
    }

    /// Sets strict presence-map validation.
    #[must_use]
    pub const fn with_strict_pmap(mut self, strict: bool) -> Self {
        self.strict_pmap = strict;
        self
    }

    /// Sets whether null optional fields are emitted.
    #[must_use]
    pub const fn with_emit_null_fields(mut self, emit: bool) -> Self {
        self.emit_null_fields = emit;
        self
    }

    /// Sets the maximum sequence length.
    #[must_use]
    pub const fn with_max_sequence_length(mut self, max: u32) -> Self {
        self.max_sequence_length = max;
        self
    }

    /// Sets the maximum byte-vector length.
    #[must_use]
    pub const fn with_max_byte_vector_length(mut self, max: usize) -> Self {
        self.max_byte_vector_length = max;
        self
    }

    /// Sets the maximum stop-bit run length.
    #[must_use]
    pub const fn with_max_stopbit_length(mut self, max: usize) -> Self {
        self.max_stopbit_length = max;
        self
    }

    /// Sets the maximum presence map size in bytes.
    #[must_use]
    pub const fn with_max_pmap_bytes(mut self, max: usize) -> Self {
        self.max_pmap_bytes = max;
        self
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lenient() {
        let config = DecoderConfig::default();
        assert!(!config.strict_pmap);
        assert!(!config.emit_null_fields);
        assert_eq!(config.max_sequence_length, 65_536);
    }

    #[test]
    fn test_builder_methods() {
        let config = DecoderConfig::strict()
            .with_emit_null_fields(true)
            .with_max_sequence_length(10)
            .with_max_pmap_bytes(2);
        assert!(config.strict_pmap);
        assert!(config.emit_null_fields);
        assert_eq!(config.max_sequence_length, 10);
        assert_eq!(config.max_pmap_bytes, 2);
    }
}
