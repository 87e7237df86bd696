use std::sync::LazyLock;

use hashbrown::HashMap as FastMap;
use log::trace;
use serde::Serialize;
use serde::ser::SerializeMap;

pub(crate) type AttributeSetter = fn(&mut ModuleAttributes, String);

module_attributes! {
    title => "title",
    author => "author",
    author_email => "authorEmail",
    description => "description",
    directory_title => "directoryTitle",
    screenshot => "screenshot",
    thumbnail => "thumbnail",
    title_url => "titleUrl",
    author_affiliation => "authorAffiliation",
    author_location => "authorLocation",
    author_photo => "authorPhoto",
    author_aboutme => "authorAboutme",
    author_quote => "authorQuote",
    author_link => "authorLink",
    show_stats => "showStats",
    show_in_directory => "showInDirectory",
    string => "string",
    width => "width",
    height => "height",
    category => "category",
    category2 => "category2",
    singleton => "singleton",
    render_inline => "renderInline",
    scaling => "scaling",
    scrolling => "scrolling",
}

static SETTER_TABLE: LazyLock<FastMap<&'static str, AttributeSetter, ahash::RandomState>> =
    LazyLock::new(|| {
        let mut table = FastMap::with_capacity_and_hasher(SETTERS.len(), ahash::RandomState::new());
        table.extend(SETTERS.iter().copied());
        table
    });

/// `directory_title` -> `directoryTitle`.
///
/// Underscores separate words; the first word gets a lowercase initial, the others an
/// uppercase one. The rest of each word is left alone, so `author_aboutme` becomes
/// `authorAboutme` and an already camel-cased `authorEmail` is unchanged.
pub fn canonical_attribute_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for word in raw.split('_').filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if out.is_empty() {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }

    out
}

impl ModuleAttributes {
    /// Bind `raw_name` if its canonical form is a known attribute.
    ///
    /// Returns whether the attribute was bound. Values are trimmed.
    pub fn bind(&mut self, raw_name: &str, value: &str) -> bool {
        let canonical = canonical_attribute_name(raw_name);
        match SETTER_TABLE.get(canonical.as_str()) {
            Some(setter) => {
                setter(self, value.trim().to_string());
                true
            }
            None => {
                trace!("dropping unknown ModulePrefs attribute `{raw_name}`");
                false
            }
        }
    }

    /// `category` and `category2`, skipping empty ones.
    pub fn categories(&self) -> Vec<&str> {
        [self.category(), self.category2()]
            .into_iter()
            .filter(|c| !c.is_empty())
            .collect()
    }
}

impl Serialize for ModuleAttributes {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
