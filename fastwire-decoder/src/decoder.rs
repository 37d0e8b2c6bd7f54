/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 15/10/26
******************************************************************************/

//! FAST stream decoder.
//!
//! Decodes a stream whose messages may use any of a set of registered
//! templates. Each message starts with a presence map whose first bit
//! governs the template id (copy operator: bit clear reuses the previous
//! id); the remaining bits belong to the template's fields.

use crate::config::DecoderConfig;
use crate::cursor::ByteCursor;
use crate::dictionary::Dictionary;
use crate::pmap::PresenceMap;
use crate::primitive::read_uint;
use crate::session::SessionStats;
use crate::template::{DecodeContext, Template};
use fastwire_core::{DecodeError, DecodedMessage, FastError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// FAST protocol decoder.
#[derive(Debug, Default)]
pub struct FastDecoder {
    /// Registered templates by ID.
    templates: HashMap<u32, Arc<Template>>,
    /// Template-specific dictionaries.
    dictionaries: HashMap<u32, Dictionary>,
    /// Last used template ID.
    last_template_id: Option<u32>,
    config: DecoderConfig,
    stats: SessionStats,
}

impl FastDecoder {
    /// Creates a new FAST decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder with a custom configuration.
    #[must_use]
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Registers a template, replacing any template with the same ID.
    ///
    /// # Returns
    /// The replaced template, if any. Its dictionary is discarded.
    pub fn register(&mut self, template: impl Into<Arc<Template>>) -> Option<Arc<Template>> {
        let template = template.into();
        let id = template.id();
        debug!(template = id, name = template.name(), "registered template");
        self.dictionaries.insert(id, template.new_dictionary());
        self.templates.insert(id, template)
    }

    /// Returns the template registered under `id`.
    #[must_use]
    pub fn template(&self, id: u32) -> Option<&Arc<Template>> {
        self.templates.get(&id)
    }

    /// Returns the number of registered templates.
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.templates.len()
    }

    /// Returns the ID of the last decoded message's template.
    #[must_use]
    pub const fn last_template_id(&self) -> Option<u32> {
        self.last_template_id
    }

    /// Returns the decoder counters.
    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Resets every dictionary and forgets the last template ID.
    pub fn reset(&mut self) {
        for (id, dictionary) in &mut self.dictionaries {
            if let Some(template) = self.templates.get(id) {
                template.reset(dictionary);
            }
        }
        self.last_template_id = None;
        debug!(templates = self.templates.len(), "decoder reset");
    }

    /// Decodes the next message from `cursor`.
    ///
    /// # Errors
    /// Returns `FastError::UnknownTemplate` for an unregistered ID,
    /// `FastError::MandatoryNullViolation` when the first message omits its
    /// template ID, or the first error of the template's fields.
    pub fn decode<C: ByteCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<DecodedMessage> {
        let result = self.decode_message(cursor);
        match &result {
            Ok(message) => {
                self.stats.messages += 1;
                debug!(
                    template = message.template_id(),
                    fields = message.len(),
                    "decoded message"
                );
            }
            Err(err) => {
                self.stats.errors += 1;
                debug!(error = %err, "decode failed");
            }
        }
        result
    }

    fn decode_message<C: ByteCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<DecodedMessage> {
        let offset = cursor.position();
        let mut pmap = PresenceMap::decode(cursor, self.config.max_pmap_bytes)
            .map_err(|kind| DecodeError::at(kind, offset))?;

        let id_offset = cursor.position();
        let id = self
            .read_template_id(cursor, &mut pmap)
            .map_err(|kind| DecodeError::at(kind, id_offset))?;
        let template = self
            .templates
            .get(&id)
            .cloned()
            .ok_or(DecodeError::at(FastError::UnknownTemplate(id), id_offset))?;
        self.last_template_id = Some(id);

        let dictionary = self
            .dictionaries
            .entry(id)
            .or_insert_with(|| template.new_dictionary());
        let mut ctx = DecodeContext::new(dictionary, &self.config);
        let mut message = DecodedMessage::with_template_id(id);
        template.decode_with_pmap(cursor, &mut pmap, &mut ctx, &mut message)?;
        let closed = ctx.close_scope(&pmap, None, offset);
        self.stats.pmap_overruns += ctx.pmap_overruns() as u64;
        closed?;
        Ok(message)
    }

    fn read_template_id<C: ByteCursor + ?Sized>(
        &self,
        cursor: &mut C,
        pmap: &mut PresenceMap,
    ) -> std::result::Result<u32, FastError> {
        if pmap.take(self.config.strict_pmap)? {
            let id = read_uint(cursor, false)?.unwrap_or_default();
            u32::try_from(id).map_err(|_| FastError::IntegerOverflow)
        } else {
            self.last_template_id
                .ok_or(FastError::MandatoryNullViolation)
        }
    }
}
