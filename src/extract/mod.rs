//! Typed extraction of each gadget section from an ingested [`Document`].
//!
//! Every extractor reads the tree and writes its part of the [`GadgetSpec`] under
//! construction. They are independent of each other but run in a fixed order (see
//! [`crate::GadgetSpecParser::parse`]); the first fatal error aborts the parse.
//!
//! [`Document`]: crate::document::Document
//! [`GadgetSpec`]: crate::GadgetSpec

mod links;
mod module_prefs;
mod user_prefs;
mod views;

pub(crate) use links::extract_links;
pub(crate) use module_prefs::extract_module_prefs;
pub(crate) use user_prefs::extract_user_prefs;
pub(crate) use views::extract_views;

/// Lenient boolean attribute: `true`/`1` and `false`/`0` (any case), anything else is `default`.
pub(crate) fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
        _ => default,
    }
}
