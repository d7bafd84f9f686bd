//! Page component initializer
//!
//! Runs after each fragment swap, in order:
//!
//! 1. smooth-scroll binding for in-page anchor links in the fragment
//! 2. lazy loading for deferred images and iframes in the fragment
//! 3. navigation UI sync for the new route
//!
//! Re-running disposes the bindings of the previous run first.

use blaze_dom::{Disposer, Document, DomError, EventType, NodeId, ScrollBehavior, ScrollBlock};
use serde::Serialize;

use crate::config::{LazyConfig, NavConfig};
use crate::lazy::LazyLoader;
use crate::nav::{sync_nav, NavReport};
use crate::routes::RouteTable;

/// What one initializer run bound
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InitReport {
    /// Anchor links bound for smooth scrolling
    pub smooth_links: usize,
    /// Deferred elements loaded right away
    pub lazy_loaded: usize,
    /// Deferred elements waiting for intersection
    pub lazy_pending: usize,
    pub nav: NavReport,
    /// Listeners released from the previous run
    pub disposed: usize,
}

/// Fragment enhancement passes
#[derive(Debug)]
pub struct PageInitializer {
    bindings: Disposer,
    lazy: LazyLoader,
    runs: u64,
}

impl PageInitializer {
    pub fn new(lazy: LazyConfig, loaded_class: &str) -> Self {
        Self {
            bindings: Disposer::new(),
            lazy: LazyLoader::new(lazy, loaded_class),
            runs: 0,
        }
    }

    /// Run every pass against the fragment under `root`
    pub fn run(
        &mut self,
        document: &mut Document,
        root: NodeId,
        route: &str,
        routes: &RouteTable,
        nav: &NavConfig,
    ) -> Result<InitReport, DomError> {
        let disposed = self.teardown(document);

        let smooth = bind_smooth_scroll(document, root, routes)?;
        let smooth_links = smooth.len();
        self.bindings.extend(smooth);

        self.lazy.observe(document, root)?;
        let lazy_loaded = self.lazy.check(document).len();

        let nav = sync_nav(document, route, nav)?;

        self.runs += 1;
        tracing::debug!(
            "Initialized {} (run {}): {} links, {} lazy loaded",
            route,
            self.runs,
            smooth_links,
            lazy_loaded
        );
        Ok(InitReport {
            smooth_links,
            lazy_loaded,
            lazy_pending: self.lazy.pending(),
            nav,
            disposed,
        })
    }

    /// Release everything the last run bound
    pub fn teardown(&mut self, document: &mut Document) -> usize {
        self.lazy.disconnect(document);
        std::mem::take(&mut self.bindings).dispose(document)
    }

    /// Re-check lazy targets after the viewport moved
    pub fn viewport_changed(&mut self, document: &mut Document) -> Vec<NodeId> {
        self.lazy.check(document)
    }

    pub fn lazy(&self) -> &LazyLoader {
        &self.lazy
    }

    /// Listeners currently held
    pub fn bound(&self) -> usize {
        self.bindings.len()
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }
}

/// Bind smooth scrolling to `a[href^="#"]` links under `root` that point to
/// an element id rather than a route
pub fn bind_smooth_scroll(
    document: &mut Document,
    root: NodeId,
    routes: &RouteTable,
) -> Result<Disposer, DomError> {
    let mut bindings = Disposer::new();
    for anchor in document.query_selector_all(root, r##"a[href^="#"]"##)? {
        let Some(id) = document
            .get_attribute(anchor, "href")
            .and_then(|href| href.strip_prefix('#'))
            .filter(|id| !id.is_empty() && !routes.contains(id))
            .map(str::to_string)
        else {
            continue;
        };

        bindings.push(document.add_event_listener(anchor, EventType::Click, move |doc, event| {
            event.prevent_default();
            if let Some(target) = doc.get_element_by_id(&id) {
                doc.scroll_into_view(target, ScrollBlock::Start, ScrollBehavior::Smooth);
            }
        }));
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blaze_dom::Rect;

    fn fragment() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new("about:blank");
        let app = doc.tree.create_element("main");
        doc.tree.append_child(doc.body(), app);

        let to_section = doc.tree.create_element("a");
        let to_route = doc.tree.create_element("a");
        let section = doc.tree.create_element("section");
        for child in [to_section, to_route, section] {
            doc.tree.append_child(app, child);
        }
        doc.set_attribute(to_section, "href", "#specials").unwrap();
        doc.set_attribute(to_route, "href", "#menu").unwrap();
        doc.set_attribute(section, "id", "specials").unwrap();
        doc.set_layout(section, Rect::new(0.0, 900.0, 800.0, 400.0));
        (doc, app, to_section)
    }

    #[test]
    fn test_route_links_are_not_bound() {
        let (mut doc, app, to_section) = fragment();
        let bindings = bind_smooth_scroll(&mut doc, app, &RouteTable::blaze()).unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(doc.events().count_for(to_section, EventType::Click), 1);
        bindings.dispose(&mut doc);
    }

    #[test]
    fn test_click_scrolls_and_prevents_default() {
        let (mut doc, app, to_section) = fragment();
        let bindings = bind_smooth_scroll(&mut doc, app, &RouteTable::blaze()).unwrap();

        let event = doc.click(to_section);
        assert!(event.is_default_prevented());
        assert_eq!(doc.viewport().scroll_y, 900.0);
        assert_eq!(doc.viewport_behavior(), Some(ScrollBehavior::Smooth));
        bindings.dispose(&mut doc);
    }

    #[test]
    fn test_rerun_does_not_accumulate() {
        let (mut doc, app, to_section) = fragment();
        let mut init = PageInitializer::new(LazyConfig::default(), "loaded");
        let routes = RouteTable::blaze();
        let nav = NavConfig::default();

        init.run(&mut doc, app, "menu", &routes, &nav).unwrap();
        let second = init.run(&mut doc, app, "menu", &routes, &nav).unwrap();

        assert_eq!(second.disposed, 1);
        assert_eq!(init.bound(), 1);
        assert_eq!(doc.events().count_for(to_section, EventType::Click), 1);
        assert_eq!(init.runs(), 2);
    }
}
