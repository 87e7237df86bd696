use log::debug;

use crate::checksum::Checksum;
use crate::document::ingest;
use crate::err::{GadgetSpecError, Result};
use crate::extract::{extract_links, extract_module_prefs, extract_user_prefs, extract_views};
use crate::gadget_spec::GadgetSpec;

/// Default upper bound for a single gadget document.
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 1024 * 1024;

/// Default element nesting limit, the same as libxml's.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserSettings {
    max_document_size: Option<usize>,
    max_depth: usize,
    reject_doctype: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        ParserSettings {
            max_document_size: Some(DEFAULT_MAX_DOCUMENT_SIZE),
            max_depth: DEFAULT_MAX_DEPTH,
            reject_doctype: false,
        }
    }
}

impl ParserSettings {
    pub fn new() -> Self {
        ParserSettings::default()
    }

    /// Refuse documents larger than `limit` bytes before tokenizing them.
    /// `None` disables the check.
    pub fn max_document_size(mut self, limit: Option<usize>) -> Self {
        self.max_document_size = limit;
        self
    }

    /// Maximum element nesting depth, the root element being at depth 1.
    ///
    /// Anything nested deeper is a syntax error and tokenizing stops there.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Report any DOCTYPE declaration as a syntax error.
    ///
    /// DOCTYPEs are never expanded either way; by default they are skipped with a warning.
    pub fn reject_doctype(mut self, reject_doctype: bool) -> Self {
        self.reject_doctype = reject_doctype;
        self
    }

    pub fn get_max_document_size(&self) -> Option<usize> {
        self.max_document_size
    }

    pub fn get_max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn should_reject_doctype(&self) -> bool {
        self.reject_doctype
    }
}

/// Turns raw gadget definition bytes into a [`GadgetSpec`].
///
/// The parser keeps no state between calls besides its settings, so one instance can be
/// shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct GadgetSpecParser {
    config: ParserSettings,
}

impl GadgetSpecParser {
    pub fn new() -> Self {
        GadgetSpecParser::default()
    }

    pub fn with_configuration(mut self, configuration: ParserSettings) -> Self {
        self.config = configuration;
        self
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.config
    }

    /// Parse a complete gadget definition.
    ///
    /// Syntax problems are collected and returned together; after that, sections are
    /// extracted in a fixed order (module prefs, links, user prefs, views) and the first
    /// structural problem aborts the parse.
    pub fn parse(&self, bytes: &[u8]) -> Result<GadgetSpec> {
        if let Some(limit) = self.config.max_document_size {
            if bytes.len() > limit {
                return Err(GadgetSpecError::DocumentTooLarge {
                    size: bytes.len(),
                    limit,
                });
            }
        }

        let document = ingest(bytes, &self.config)?;
        let mut spec = GadgetSpec::new(Checksum::of(bytes));
        debug!("parsing gadget spec {}", spec.checksum());

        extract_module_prefs(&document, &mut spec)?;
        extract_links(&document, &mut spec)?;
        extract_user_prefs(&document, &mut spec)?;
        extract_views(&document, &mut spec)?;

        Ok(spec)
    }
}

/// Parse with default settings.
pub fn parse_gadget_spec(bytes: &[u8]) -> Result<GadgetSpec> {
    GadgetSpecParser::new().parse(bytes)
}
