use std::collections::BTreeMap;

use log::{debug, trace};

use super::parse_bool;
use crate::document::{Document, Element};
use crate::err::{GadgetSpecError, Result};
use crate::gadget_spec::{Authz, FeatureSpec, GadgetSpec, LocaleSpec, Preload};

const ALL: &str = "all";

/// The mandatory `ModulePrefs` block: known attributes, then icon, features, preloads and
/// locales.
pub(crate) fn extract_module_prefs(doc: &Document, spec: &mut GadgetSpec) -> Result<()> {
    let mut blocks = doc.elements_named("ModulePrefs");

    let module_prefs = blocks.next().ok_or(GadgetSpecError::MissingModulePrefs)?;
    let extra = blocks.count();
    if extra > 0 {
        return Err(GadgetSpecError::DuplicateModulePrefs { count: extra + 1 });
    }

    for attr in module_prefs.attributes() {
        spec.module_attributes.bind(&attr.name, &attr.value);
    }

    extract_icon(module_prefs, spec)?;
    extract_features(module_prefs, spec);
    extract_preloads(module_prefs, spec);
    extract_locales(module_prefs, spec);

    debug!(
        "ModulePrefs: {} attributes, {} features, {} preloads, {} locales",
        spec.module_attributes.iter().count(),
        spec.features.len(),
        spec.preloads.len(),
        spec.locales.len()
    );

    Ok(())
}

fn extract_icon(module_prefs: &Element, spec: &mut GadgetSpec) -> Result<()> {
    let icons: Vec<&Element> = module_prefs.descendants_named("Icon").collect();

    match icons.as_slice() {
        [] => {}
        [icon] => spec.icon = Some(icon.text().trim().to_string()),
        _ => return Err(GadgetSpecError::DuplicateIcon { count: icons.len() }),
    }

    Ok(())
}

fn extract_features(module_prefs: &Element, spec: &mut GadgetSpec) {
    for element in module_prefs.descendants() {
        let optional = match element.name() {
            "Require" => false,
            "Optional" => true,
            _ => continue,
        };

        let params = element
            .children()
            .filter(|c| c.name() == "Param")
            .map(|p| (p.attribute_or_empty("name").to_string(), p.text().trim().to_string()))
            .collect::<BTreeMap<_, _>>();

        trace!("feature `{}` (optional: {optional})", element.attribute_or_empty("feature"));

        spec.features.push(FeatureSpec {
            name: element.attribute_or_empty("feature").to_string(),
            optional,
            params,
        });
    }
}

fn extract_preloads(module_prefs: &Element, spec: &mut GadgetSpec) {
    spec.preloads
        .extend(module_prefs.descendants_named("Preload").map(|preload| Preload {
            href: preload.attribute_or_empty("href").to_string(),
            authz: Authz::parse(preload.attribute_or_empty("authz")),
            sign_viewer: parse_bool(preload.attribute("sign_viewer"), true),
            sign_owner: parse_bool(preload.attribute("sign_owner"), true),
        }));
}

fn extract_locales(module_prefs: &Element, spec: &mut GadgetSpec) {
    for locale in module_prefs.descendants_named("Locale") {
        let mut message_bundle = BTreeMap::new();
        if let Some(bundle) = locale.descendants_named("messagebundle").next() {
            for msg in bundle.descendants_named("msg") {
                message_bundle.insert(
                    msg.attribute_or_empty("name").to_string(),
                    msg.text().trim().to_string(),
                );
            }
        }

        let lang = match locale.attribute_or_empty("lang") {
            "" => ALL.to_string(),
            lang => lang.to_lowercase(),
        };
        let country = match locale.attribute_or_empty("country") {
            "" => ALL.to_string(),
            country => country.to_uppercase(),
        };

        spec.locales.push(LocaleSpec {
            lang,
            country,
            messages_url: locale.attribute_or_empty("messages").to_string(),
            language_direction: locale.attribute_or_empty("language_direction").to_string(),
            message_bundle,
        });
    }
}
