//! Raw bytes to a generic element tree.
//!
//! This is the only place that talks to `quick-xml`. The section extractors work on the
//! [`Element`] tree produced here and never see tokenizer types.
//!
//! Text, names and attribute values are decoded with the encoding named in the XML
//! declaration (UTF-8 when absent). Element nesting is capped by
//! [`ParserSettings::max_depth`].
//!
//! Entities are never expanded: the DOCTYPE internal subset is ignored, so any reference to
//! an entity declared there is reported as undefined. Only the five predefined entities and
//! numeric character references are decoded.

use std::borrow::Cow;

use log::{debug, trace, warn};
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::err::{Diagnostic, GadgetSpecError, Result};
use crate::gadget_parser::ParserSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Missing attributes read as the empty string.
    pub fn attribute_or_empty(&self, name: &str) -> &str {
        self.attribute(name).unwrap_or_default()
    }

    /// Direct element children, in document order.
    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Every element below this one (not including itself), in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    pub fn descendants_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.descendants().filter(move |e| e.name == name)
    }

    /// Concatenation of all descendant text and CDATA, in document order.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// Pre-order walk over an element subtree.
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(top) = self.stack.last_mut() {
            match top.next() {
                Some(Node::Element(e)) => {
                    self.stack.push(e.children.iter());
                    return Some(e);
                }
                Some(Node::Text(_)) => {}
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

/// A successfully ingested document: exactly one root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Every element of the document including the root, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        std::iter::once(&self.root).chain(self.root.descendants())
    }

    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }
}

/// Tokenize `bytes` into a [`Document`].
///
/// Keeps going past recoverable problems so that every diagnostic can be reported at once.
/// If anything was reported, the whole set is returned as a single
/// [`GadgetSpecError::Syntax`].
pub fn ingest(bytes: &[u8], settings: &ParserSettings) -> Result<Document> {
    let mut builder = TreeBuilder::default();

    let mut reader = Reader::from_reader(bytes);
    let config = reader.config_mut();
    config.trim_text(false);
    config.expand_empty_elements = false;
    // End tags are matched against our own stack so that mismatches become diagnostics.
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    loop {
        let event = reader.read_event();
        let position = reader.buffer_position() as u64;
        // The declaration may switch the encoding, so ask again for every event.
        let decoder = reader.decoder();

        match event {
            Ok(Event::Start(start)) => {
                if builder.exceeds_depth(settings.get_max_depth(), position) {
                    break;
                }
                let element = builder.open_element(&decoder, &start, position);
                builder.stack.push(element);
            }
            Ok(Event::Empty(start)) => {
                if builder.exceeds_depth(settings.get_max_depth(), position) {
                    break;
                }
                let element = builder.open_element(&decoder, &start, position);
                builder.close_element(element, position);
            }
            Ok(Event::End(end)) => {
                let name = builder
                    .decode(&decoder, end.name().as_ref(), position, "end tag name")
                    .into_owned();
                builder.end_tag(&name, position);
            }
            Ok(Event::Text(text)) => {
                let raw = builder.decode(&decoder, &text, position, "text");
                let value = match unescape(&raw) {
                    Ok(v) => v.into_owned(),
                    Err(e) => {
                        builder.report(position, format!("invalid text content: {e}"));
                        raw.to_string()
                    }
                };
                builder.text(value, position);
            }
            Ok(Event::CData(cdata)) => {
                let value = builder
                    .decode(&decoder, &cdata, position, "CDATA section")
                    .into_owned();
                builder.text(value, position);
            }
            Ok(Event::DocType(_)) => {
                if settings.should_reject_doctype() {
                    builder.report(position, "DOCTYPE declarations are not allowed");
                } else {
                    warn!("ignoring DOCTYPE declaration at offset {position}, entities are not expanded");
                }
            }
            Ok(Event::Decl(_)) | Ok(Event::PI(_)) | Ok(Event::Comment(_)) => {}
            Ok(Event::Eof) => {
                builder.finish_open_elements(position);
                break;
            }
            Err(e) => {
                let error_position = reader.error_position() as u64;
                builder.report(error_position, e.to_string());

                // Ill-formed markup leaves the tokenizer in a usable state, real syntax
                // errors do not.
                if matches!(e, quick_xml::Error::IllFormed(_)) && position > error_position {
                    continue;
                }
                builder.finish_open_elements(position);
                break;
            }
        }
    }

    builder.finish()
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Element>,
    root: Option<Element>,
    diagnostics: Vec<Diagnostic>,
}

impl TreeBuilder {
    fn report(&mut self, position: u64, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(position, message);
        debug!("syntax diagnostic: {diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    fn decode<'b>(
        &mut self,
        decoder: &Decoder,
        bytes: &'b [u8],
        position: u64,
        what: &str,
    ) -> Cow<'b, str> {
        match decoder.decode(bytes) {
            Ok(s) => s,
            Err(e) => {
                self.report(position, format!("cannot decode {what}: {e}"));
                String::from_utf8_lossy(bytes)
            }
        }
    }

    /// Whether opening one more element would go past `max_depth`. Reports it if so.
    fn exceeds_depth(&mut self, max_depth: usize, position: u64) -> bool {
        if self.stack.len() < max_depth {
            return false;
        }
        self.report(
            position,
            format!("element nesting exceeds the maximum depth of {max_depth}"),
        );
        true
    }

    fn open_element(
        &mut self,
        decoder: &Decoder,
        start: &BytesStart<'_>,
        position: u64,
    ) -> Element {
        let name = self
            .decode(decoder, start.name().as_ref(), position, "element name")
            .into_owned();
        let mut attributes = Vec::new();

        for attr in start.attributes() {
            let attr = match attr {
                Ok(attr) => attr,
                Err(e) => {
                    self.report(position, format!("malformed attribute on <{name}>: {e}"));
                    break;
                }
            };

            let key = self
                .decode(decoder, attr.key.as_ref(), position, "attribute name")
                .into_owned();
            let raw = self.decode(decoder, &attr.value, position, "attribute value");
            let value = match unescape(&raw) {
                Ok(v) => v.into_owned(),
                Err(e) => {
                    let message = format!("invalid value for attribute `{key}` on <{name}>: {e}");
                    let fallback = raw.to_string();
                    self.report(position, message);
                    fallback
                }
            };

            attributes.push(Attribute { name: key, value });
        }

        trace!("open <{name}> with {} attributes", attributes.len());

        Element {
            name,
            attributes,
            children: Vec::new(),
        }
    }

    fn close_element(&mut self, element: Element, position: u64) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None if self.root.is_some() => {
                let name = element.name;
                self.report(
                    position,
                    format!("extra content at the end of the document: second root element <{name}>"),
                );
            }
            None => self.root = Some(element),
        }
    }

    fn end_tag(&mut self, name: &str, position: u64) {
        let Some(depth) = self.stack.iter().rposition(|e| e.name == name) else {
            self.report(position, format!("unexpected end tag </{name}>"));
            return;
        };

        // Anything opened after the matching element was never closed.
        while self.stack.len() > depth + 1 {
            if let Some(unclosed) = self.stack.pop() {
                self.report(
                    position,
                    format!(
                        "mismatched end tag: expected </{}>, found </{name}>",
                        unclosed.name
                    ),
                );
                self.close_element(unclosed, position);
            }
        }

        if let Some(element) = self.stack.pop() {
            self.close_element(element, position);
        }
    }

    fn text(&mut self, value: String, position: u64) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Node::Text(value)),
            None if value.trim().is_empty() => {}
            None => self.report(position, "text content outside of the root element"),
        }
    }

    fn finish_open_elements(&mut self, position: u64) {
        while let Some(unclosed) = self.stack.pop() {
            self.report(
                position,
                format!("premature end of data: element <{}> is not closed", unclosed.name),
            );
            self.close_element(unclosed, position);
        }
    }

    fn finish(mut self) -> Result<Document> {
        if self.root.is_none() && self.diagnostics.is_empty() {
            self.report(0, "document is empty: no root element found");
        }

        match self.root {
            Some(root) if self.diagnostics.is_empty() => Ok(Document { root }),
            _ => Err(GadgetSpecError::Syntax {
                diagnostics: self.diagnostics,
            }),
        }
    }
}
