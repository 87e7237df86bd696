use log::debug;

use super::parse_bool;
use crate::document::Document;
use crate::err::Result;
use crate::gadget_spec::{EnumValue, GadgetSpec, UserPref, UserPrefDataType};

pub(crate) fn extract_user_prefs(doc: &Document, spec: &mut GadgetSpec) -> Result<()> {
    for pref in doc.elements_named("UserPref") {
        let datatype = UserPrefDataType::parse(pref.attribute_or_empty("datatype"));

        // Enum values are only meaningful for enum prefs; elsewhere they are ignored.
        let enum_values = if datatype == UserPrefDataType::Enum {
            pref.descendants_named("EnumValue")
                .map(|e| EnumValue {
                    value: e.attribute_or_empty("value").to_string(),
                    display_value: e.attribute_or_empty("display_value").to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        spec.user_prefs.push(UserPref {
            name: pref.attribute_or_empty("name").to_string(),
            display_name: pref.attribute_or_empty("display_name").to_string(),
            datatype,
            default_value: pref.attribute_or_empty("default_value").to_string(),
            required: parse_bool(pref.attribute("required"), false),
            enum_values,
        });
    }

    debug!("{} user prefs", spec.user_prefs.len());
    Ok(())
}
