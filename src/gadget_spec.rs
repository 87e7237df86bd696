use std::collections::BTreeMap;

use serde::Serialize;
use serde::ser::{SerializeMap, SerializeStruct};

use crate::checksum::Checksum;
use crate::module_attributes::ModuleAttributes;

/// Name of the view used when a content block does not name one.
pub const DEFAULT_VIEW: &str = "default";

upper_case_enum! {
    /// Authorization applied when a container fetches a preload.
    Authz, default = None, {
        None => "NONE",
        Signed => "SIGNED",
        OAuth => "OAUTH",
    }
}

upper_case_enum! {
    HttpMethod, default = Get, {
        Get => "GET",
        Post => "POST",
    }
}

upper_case_enum! {
    UserPrefDataType, default = String, {
        String => "STRING",
        Hidden => "HIDDEN",
        Bool => "BOOL",
        Enum => "ENUM",
        List => "LIST",
        Number => "NUMBER",
    }
}

upper_case_enum! {
    /// How a view's content is delivered.
    ContentType, default = Html, {
        Html => "HTML",
        Url => "URL",
    }
}

/// A `Require` or `Optional` feature declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSpec {
    pub name: String,
    pub optional: bool,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preload {
    pub href: String,
    pub authz: Authz,
    pub sign_viewer: bool,
    pub sign_owner: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleSpec {
    /// Lower-cased, `all` when absent.
    pub lang: String,
    /// Upper-cased, `all` when absent.
    pub country: String,
    pub messages_url: String,
    pub language_direction: String,
    /// Inline `messagebundle` messages. Kept alongside `messages_url`; neither overrides the other.
    pub message_bundle: BTreeMap<String, String>,
}

impl LocaleSpec {
    pub fn is_right_to_left(&self) -> bool {
        self.language_direction.trim().eq_ignore_ascii_case("rtl")
    }

    pub fn message(&self, name: &str) -> Option<&str> {
        self.message_bundle.get(name).map(String::as_str)
    }

    fn matches(&self, lang: &str, country: &str) -> bool {
        self.lang.eq_ignore_ascii_case(lang) && self.country.eq_ignore_ascii_case(country)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub href: String,
    pub preferred_height: Option<u32>,
    pub preferred_width: Option<u32>,
    pub quirks: bool,
    /// Bodies of every content block naming this view, concatenated in document order.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
    pub method: HttpMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    pub value: String,
    pub display_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPref {
    pub name: String,
    pub display_name: String,
    pub datatype: UserPrefDataType,
    pub default_value: String,
    pub required: bool,
    /// Only populated for `ENUM` prefs; always present, possibly empty.
    pub enum_values: Vec<EnumValue>,
}

/// A parsed gadget definition.
///
/// Built once by [`crate::GadgetSpecParser::parse`] and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GadgetSpec {
    pub(crate) checksum: Checksum,
    pub(crate) module_attributes: ModuleAttributes,
    pub(crate) icon: Option<String>,
    pub(crate) features: Vec<FeatureSpec>,
    pub(crate) preloads: Vec<Preload>,
    pub(crate) locales: Vec<LocaleSpec>,
    pub(crate) views: Views,
    pub(crate) links: Vec<Link>,
    pub(crate) user_prefs: Vec<UserPref>,
}

/// Views keyed by name, in order of first declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Views {
    entries: Vec<View>,
}

impl Views {
    pub fn get(&self, name: &str) -> Option<&View> {
        self.entries.iter().find(|v| v.name == name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut View> {
        self.entries.iter_mut().find(|v| v.name == name)
    }

    pub(crate) fn insert(&mut self, view: View) {
        self.entries.push(view);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|v| v.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, View> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Views {
    type Item = &'a View;
    type IntoIter = std::slice::Iter<'a, View>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for Views {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for view in &self.entries {
            map.serialize_entry(&view.name, view)?;
        }
        map.end()
    }
}

impl Serialize for GadgetSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GadgetSpec", 11)?;
        state.serialize_field("checksum", &self.checksum)?;
        state.serialize_field("moduleAttributes", &self.module_attributes)?;
        state.serialize_field("icon", &self.icon)?;
        state.serialize_field("requiredFeatures", &self.required_features())?;
        state.serialize_field("optionalFeatures", &self.optional_features())?;
        state.serialize_field("features", &self.features)?;
        state.serialize_field("preloads", &self.preloads)?;
        state.serialize_field("locales", &self.locales)?;
        state.serialize_field("views", &self.views)?;
        state.serialize_field("links", &self.links)?;
        state.serialize_field("userPrefs", &self.user_prefs)?;
        state.end()
    }
}

impl GadgetSpec {
    pub(crate) fn new(checksum: Checksum) -> Self {
        GadgetSpec {
            checksum,
            module_attributes: ModuleAttributes::default(),
            icon: None,
            features: Vec::new(),
            preloads: Vec::new(),
            locales: Vec::new(),
            views: Views::default(),
            links: Vec::new(),
            user_prefs: Vec::new(),
        }
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn module_attributes(&self) -> &ModuleAttributes {
        &self.module_attributes
    }

    pub fn title(&self) -> &str {
        self.module_attributes.title()
    }

    pub fn categories(&self) -> Vec<&str> {
        self.module_attributes.categories()
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Every `Require` and `Optional` declaration, in document order.
    pub fn features(&self) -> &[FeatureSpec] {
        &self.features
    }

    /// Names of the required features in document order, duplicates included.
    pub fn required_features(&self) -> Vec<&str> {
        self.feature_names(false)
    }

    /// Names of the optional features in document order, duplicates included.
    pub fn optional_features(&self) -> Vec<&str> {
        self.feature_names(true)
    }

    fn feature_names(&self, optional: bool) -> Vec<&str> {
        self.features
            .iter()
            .filter(|f| f.optional == optional)
            .map(|f| f.name.as_str())
            .collect()
    }

    pub fn preloads(&self) -> &[Preload] {
        &self.preloads
    }

    pub fn locales(&self) -> &[LocaleSpec] {
        &self.locales
    }

    /// Best locale for `lang`/`country`.
    ///
    /// Tries the exact pair, then the language for all countries, then all languages for the
    /// country, then the catch-all `all`/`ALL` locale.
    pub fn locale(&self, lang: &str, country: &str) -> Option<&LocaleSpec> {
        [(lang, country), (lang, "all"), ("all", country), ("all", "all")]
            .into_iter()
            .find_map(|(l, c)| self.locales.iter().find(|locale| locale.matches(l, c)))
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.get(name)
    }

    pub fn default_view(&self) -> Option<&View> {
        self.views.get(DEFAULT_VIEW)
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn user_prefs(&self) -> &[UserPref] {
        &self.user_prefs
    }

    pub fn user_pref(&self, name: &str) -> Option<&UserPref> {
        self.user_prefs.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn locale(lang: &str, country: &str) -> LocaleSpec {
        LocaleSpec {
            lang: lang.to_string(),
            country: country.to_string(),
            messages_url: String::new(),
            language_direction: String::new(),
            message_bundle: BTreeMap::new(),
        }
    }

    #[test]
    fn test_enum_parsing_upper_cases_and_defaults() {
        assert_eq!(Authz::parse("signed"), Authz::Signed);
        assert_eq!(Authz::parse(""), Authz::None);
        assert_eq!(Authz::parse("custom"), Authz::Other("CUSTOM".to_string()));
        assert_eq!(Authz::parse("custom").as_str(), "CUSTOM");

        assert_eq!(HttpMethod::parse("post"), HttpMethod::Post);
        assert_eq!(HttpMethod::parse(""), HttpMethod::Get);

        assert_eq!(UserPrefDataType::parse("enum"), UserPrefDataType::Enum);
        assert_eq!(UserPrefDataType::parse(""), UserPrefDataType::String);
        assert_eq!(UserPrefDataType::parse("Number").as_str(), "NUMBER");

        assert_eq!(ContentType::parse("URL"), ContentType::Url);
        assert_eq!(ContentType::parse("html"), ContentType::Html);
        assert_eq!(ContentType::parse(""), ContentType::Html);
        assert_eq!(
            ContentType::parse(" html-inline "),
            ContentType::Other("HTML-INLINE".to_string())
        );
    }

    #[test]
    fn test_locale_lookup_falls_back() {
        let mut spec = GadgetSpec::new(Checksum::of(b""));
        spec.locales = vec![locale("all", "ALL"), locale("en", "ALL"), locale("en", "US")];

        assert_eq!(spec.locale("en", "US").map(|l| l.country.as_str()), Some("US"));
        assert_eq!(spec.locale("en", "GB").map(|l| l.lang.as_str()), Some("en"));
        assert_eq!(spec.locale("fr", "FR").map(|l| l.lang.as_str()), Some("all"));
    }

    #[test]
    fn test_right_to_left() {
        let mut l = locale("he", "IL");
        assert!(!l.is_right_to_left());
        l.language_direction = "RTL".to_string();
        assert!(l.is_right_to_left());
    }

    #[test]
    fn test_feature_names_keep_order_and_duplicates() {
        let mut spec = GadgetSpec::new(Checksum::of(b""));
        for (name, optional) in [("a", false), ("b", true), ("a", false)] {
            spec.features.push(FeatureSpec {
                name: name.to_string(),
                optional,
                params: BTreeMap::new(),
            });
        }

        assert_eq!(spec.required_features(), vec!["a", "a"]);
        assert_eq!(spec.optional_features(), vec!["b"]);
    }
}
