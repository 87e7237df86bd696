#![deny(unused_must_use)]
#![forbid(unsafe_code)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]

#[macro_use]
mod macros;

pub mod checksum;
pub mod document;
pub mod err;
mod extract;
mod gadget_parser;
mod gadget_spec;
pub mod module_attributes;

pub use checksum::Checksum;
pub use err::{Diagnostic, GadgetSpecError, Result};
pub use gadget_parser::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_DOCUMENT_SIZE, GadgetSpecParser, ParserSettings,
    parse_gadget_spec,
};
pub use gadget_spec::{
    Authz, ContentType, DEFAULT_VIEW, EnumValue, FeatureSpec, GadgetSpec, HttpMethod, Link,
    LocaleSpec, Preload, UserPref, UserPrefDataType, View, Views,
};
pub use module_attributes::{KNOWN_ATTRIBUTES, ModuleAttributes};

// For tests, we only initialize logging once.
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static LOGGER_INIT: Once = Once::new();

// Rust runs the tests concurrently, so unless we synchronize logging access
// it will crash when attempting to run `cargo test` with some logging facilities.
#[cfg(test)]
pub fn ensure_env_logger_initialized() {
    use std::io::Write;

    LOGGER_INIT.call_once(|| {
        let mut builder = env_logger::Builder::from_default_env();
        builder
            .format(|buf, record| writeln!(buf, "[{}] - {}", record.level(), record.args()))
            .init();
    });
}
