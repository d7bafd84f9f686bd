//! Side navigation toggle
//!
//! The hamburger opens and closes the side nav; following a side nav link
//! or clicking anywhere outside closes it. Bound once for the shell, not
//! per fragment.

use blaze_dom::{Disposer, Document, DomError, EventType, NodeId};

use crate::config::NavConfig;

/// Bind the side nav handlers; returns an empty disposer if the shell has
/// no hamburger or side nav
pub fn bind_side_nav(document: &mut Document, nav: &NavConfig) -> Result<Disposer, DomError> {
    let mut bindings = Disposer::new();
    let (Some(hamburger), Some(side_nav)) = (
        document.query_selector(NodeId::ROOT, &nav.hamburger)?,
        document.query_selector(NodeId::ROOT, &nav.side_nav)?,
    ) else {
        return Ok(bindings);
    };

    let open = nav.open_class.clone();
    let active = nav.active_class.clone();
    bindings.push(document.add_event_listener(hamburger, EventType::Click, move |doc, _| {
        doc.toggle_class(side_nav, &open, None);
        doc.toggle_class(hamburger, &active, None);
    }));

    for link in document.query_selector_all(NodeId::ROOT, &nav.side_link)? {
        let open = nav.open_class.clone();
        let active = nav.active_class.clone();
        bindings.push(document.add_event_listener(link, EventType::Click, move |doc, event| {
            let phone = doc
                .get_attribute(event.current_target, "href")
                .is_some_and(|href| href.starts_with("tel:"));
            if !phone {
                close(doc, side_nav, hamburger, &open, &active);
            }
        }));
    }

    let open = nav.open_class.clone();
    let active = nav.active_class.clone();
    bindings.push(document.add_event_listener(NodeId::ROOT, EventType::Click, move |doc, event| {
        let path: Vec<NodeId> = std::iter::once(event.target)
            .chain(doc.tree().ancestors(event.target))
            .collect();
        let inside = path.contains(&side_nav) || path.contains(&hamburger);
        if !inside && doc.has_class(side_nav, &open) {
            close(doc, side_nav, hamburger, &open, &active);
        }
    }));

    tracing::debug!("Bound side nav ({} listeners)", bindings.len());
    Ok(bindings)
}

fn close(doc: &mut Document, side_nav: NodeId, hamburger: NodeId, open: &str, active: &str) {
    doc.remove_class(side_nav, open);
    doc.remove_class(hamburger, active);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell() -> (Document, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = Document::new("about:blank");
        let body = doc.body();
        let hamburger = doc.tree.create_element("button");
        let side = doc.tree.create_element("aside");
        let link = doc.tree.create_element("a");
        let phone = doc.tree.create_element("a");
        let outside = doc.tree.create_element("p");
        for (parent, child) in [(body, hamburger), (body, side), (side, link), (side, phone), (body, outside)] {
            doc.tree.append_child(parent, child);
        }
        doc.add_class(hamburger, "hamburger");
        doc.add_class(side, "side-nav");
        doc.set_attribute(link, "href", "#menu").unwrap();
        doc.set_attribute(phone, "href", "tel:+910000000000").unwrap();
        (doc, hamburger, side, phone, outside)
    }

    #[test]
    fn test_hamburger_toggles() {
        let (mut doc, hamburger, side, _, _) = shell();
        let bindings = bind_side_nav(&mut doc, &NavConfig::default()).unwrap();
        assert_eq!(bindings.len(), 4);

        doc.click(hamburger);
        assert!(doc.has_class(side, "open"));
        assert!(doc.has_class(hamburger, "active"));

        doc.click(hamburger);
        assert!(!doc.has_class(side, "open"));
        bindings.dispose(&mut doc);
    }

    #[test]
    fn test_phone_link_keeps_open_outside_click_closes() {
        let (mut doc, hamburger, side, phone, outside) = shell();
        let bindings = bind_side_nav(&mut doc, &NavConfig::default()).unwrap();

        doc.click(hamburger);
        doc.click(phone);
        assert!(doc.has_class(side, "open"));

        doc.click(outside);
        assert!(!doc.has_class(side, "open"));
        assert!(!doc.has_class(hamburger, "active"));
        bindings.dispose(&mut doc);
    }

    #[test]
    fn test_missing_elements_bind_nothing() {
        let mut doc = Document::new("about:blank");
        assert!(bind_side_nav(&mut doc, &NavConfig::default()).unwrap().is_empty());
    }
}
