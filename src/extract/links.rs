use log::debug;

use crate::document::{Document, Element};
use crate::err::Result;
use crate::gadget_spec::{GadgetSpec, HttpMethod, Link};

pub(crate) fn extract_links(doc: &Document, spec: &mut GadgetSpec) -> Result<()> {
    let mut found = Vec::new();
    collect_links(doc.root(), &mut found);

    spec.links.extend(found.into_iter().map(|link| Link {
        rel: link.attribute_or_empty("rel").to_string(),
        href: link.attribute_or_empty("href").to_string(),
        method: HttpMethod::parse(link.attribute_or_empty("method")),
    }));

    debug!("{} links", spec.links.len());
    Ok(())
}

/// `Link` elements in document order. Content bodies are markup for the rendered view, so
/// HTML `<link>` tags inside them are not gadget links.
fn collect_links<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    for child in element.children() {
        match child.name() {
            "Content" => continue,
            "Link" | "link" => out.push(child),
            _ => {}
        }
        collect_links(child, out);
    }
}
