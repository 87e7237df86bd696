use log::{debug, trace};

use crate::document::{Document, Element};
use crate::err::{GadgetSpecError, Result};
use crate::gadget_spec::{ContentType, DEFAULT_VIEW, GadgetSpec, View};

/// One declaration per `Content` element.
///
/// A comma-separated `view` attribute declares the same body under several names. A name
/// seen in an earlier declaration gets this body appended instead of a new entry.
pub(crate) fn extract_views(doc: &Document, spec: &mut GadgetSpec) -> Result<()> {
    for content in doc.elements_named("Content") {
        let content_type = ContentType::parse(content.attribute_or_empty("type"));
        let href = content.attribute_or_empty("href");
        let view_attr = content.attribute_or_empty("view");

        if content_type == ContentType::Url && href.trim().is_empty() {
            return Err(GadgetSpecError::MalformedContentHref {
                views: view_attr.to_string(),
            });
        }

        let body = content.text();

        for name in view_attr.split(',').map(str::trim) {
            let name = if name.is_empty() { DEFAULT_VIEW } else { name };

            match spec.views.get_mut(name) {
                Some(existing) => {
                    trace!("appending to view `{name}`");
                    existing.content.push_str(&body);
                }
                None => spec
                    .views
                    .insert(new_view(name, content_type.clone(), href, content, &body)),
            }
        }
    }

    if spec.views.is_empty() {
        return Err(GadgetSpecError::NoViews);
    }

    debug!("views: {:?}", spec.views.names().collect::<Vec<_>>());
    Ok(())
}

fn new_view(
    name: &str,
    content_type: ContentType,
    href: &str,
    content: &Element,
    body: &str,
) -> View {
    View {
        name: name.to_string(),
        content_type,
        href: href.to_string(),
        preferred_height: dimension(content, "preferred_height", "prefered_height"),
        preferred_width: dimension(content, "preferred_width", "prefered_width"),
        quirks: super::parse_bool(content.attribute("quirks"), true),
        content: body.to_string(),
    }
}

fn dimension(content: &Element, name: &str, legacy_name: &str) -> Option<u32> {
    content
        .attribute(name)
        .or_else(|| content.attribute(legacy_name))
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Checksum;
    use crate::document::ingest;
    use crate::gadget_parser::ParserSettings;
    use pretty_assertions::assert_eq;

    fn extract(xml: &str) -> Result<GadgetSpec> {
        let doc = ingest(xml.as_bytes(), &ParserSettings::default()).expect("valid xml");
        let mut spec = GadgetSpec::new(Checksum::of(xml.as_bytes()));
        extract_views(&doc, &mut spec)?;
        Ok(spec)
    }

    #[test]
    fn test_same_name_merges_in_document_order() {
        let spec = extract(
            r#"<Module>
                 <Content view="default"><![CDATA[first]]></Content>
                 <Content view="profile">other</Content>
                 <Content view="default"><![CDATA[second]]></Content>
               </Module>"#,
        )
        .unwrap();

        assert_eq!(spec.views().len(), 2);
        assert_eq!(spec.view("default").unwrap().content, "firstsecond");
        assert_eq!(spec.view("profile").unwrap().content, "other");
    }

    #[test]
    fn test_comma_list_expands_to_independent_views() {
        let spec = extract(
            r#"<Module><Content type="html" view="a, b" preferred_height="200" quirks="false">body</Content></Module>"#,
        )
        .unwrap();

        let a = spec.view("a").unwrap();
        let b = spec.view("b").unwrap();
        assert_eq!(a.content, "body");
        assert_eq!(b.content, "body");
        assert_eq!(a.preferred_height, Some(200));
        assert_eq!(b.preferred_height, Some(200));
        assert_eq!(a.preferred_width, None);
        assert!(!a.quirks);
        assert_eq!(a.content_type, ContentType::Html);
        assert_eq!(spec.views().names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_view_name_is_default() {
        let spec = extract(r#"<Module><Content prefered_width="300">x</Content></Module>"#).unwrap();
        let view = spec.default_view().unwrap();
        assert_eq!(view.preferred_width, Some(300));
        assert!(view.quirks);
    }

    #[test]
    fn test_url_view_requires_href() {
        assert!(matches!(
            extract(r#"<Module><Content type="url" view="canvas"/></Module>"#),
            Err(GadgetSpecError::MalformedContentHref { .. })
        ));

        let spec =
            extract(r#"<Module><Content type="URL" href="http://x/gadget.html"/></Module>"#).unwrap();
        let view = spec.default_view().unwrap();
        assert_eq!(view.content_type, ContentType::Url);
        assert_eq!(view.href, "http://x/gadget.html");

        assert!(extract(r#"<Module><Content type="html"/></Module>"#).is_ok());
    }

    #[test]
    fn test_no_content_is_an_error() {
        assert!(matches!(
            extract("<Module><ModulePrefs/></Module>"),
            Err(GadgetSpecError::NoViews)
        ));
    }
}
