//! Document-level tests for blaze-dom
//!
//! Queries, class changes, scrolling and listener bookkeeping.

use std::cell::Cell;
use std::rc::Rc;

use blaze_dom::{
    Disposer, Document, EventType, NodeId, Rect, ScrollBehavior, ScrollBlock, Viewport,
};

fn nav_document() -> (Document, NodeId, Vec<NodeId>) {
    let mut doc = Document::new("about:blank");
    let body = doc.body();
    let nav = doc.tree.create_element("nav");
    let strip = doc.tree.create_element("div");
    doc.tree.append_child(body, nav);
    doc.tree.append_child(nav, strip);
    doc.add_class(nav, "horizontal-nav");
    doc.add_class(strip, "nav-container");

    let mut links = Vec::new();
    for route in ["home", "menu", "chinese"] {
        let a = doc.tree.create_element("a");
        doc.tree.append_child(strip, a);
        doc.add_class(a, "horizontal-nav-item");
        doc.set_attribute(a, "href", &format!("#{route}")).unwrap();
        links.push(a);
    }
    (doc, strip, links)
}

// ============================================================================
// QUERIES
// ============================================================================

#[test]
fn test_query_by_href() {
    let (doc, _, links) = nav_document();
    let found = doc
        .query_selector(NodeId::ROOT, r##".horizontal-nav-item[href="#chinese"]"##)
        .unwrap();
    assert_eq!(found, Some(links[2]));
}

#[test]
fn test_closest_finds_strip() {
    let (doc, strip, links) = nav_document();
    assert_eq!(doc.closest(links[0], ".nav-container").unwrap(), Some(strip));
    assert_eq!(doc.closest(links[0], ".side-nav").unwrap(), None);
}

#[test]
fn test_invalid_selector_is_an_error() {
    let (doc, _, _) = nav_document();
    assert!(doc.query_selector_all(NodeId::ROOT, "nav > a").is_err());
}

#[test]
fn test_set_attribute_on_removed_node() {
    let (mut doc, strip, links) = nav_document();
    doc.clear_children(strip);
    assert!(doc.set_attribute(links[0], "href", "#x").is_err());
}

// ============================================================================
// SCROLLING
// ============================================================================

#[test]
fn test_scroll_into_view_start() {
    let mut doc = Document::new("about:blank");
    let target = doc.tree.create_element("section");
    doc.tree.append_child(doc.body(), target);
    doc.set_viewport(Viewport::new(400.0, 600.0));
    doc.set_layout(target, Rect::new(0.0, 1500.0, 400.0, 300.0));

    assert!(doc.scroll_into_view(target, ScrollBlock::Start, ScrollBehavior::Smooth));
    assert_eq!(doc.viewport().scroll_y, 1500.0);
    assert_eq!(doc.viewport_behavior(), Some(ScrollBehavior::Smooth));
}

#[test]
fn test_scroll_into_view_without_layout() {
    let mut doc = Document::new("about:blank");
    let target = doc.tree.create_element("section");
    assert!(!doc.scroll_into_view(target, ScrollBlock::Start, ScrollBehavior::Smooth));
    assert_eq!(doc.viewport().scroll_y, 0.0);
}

#[test]
fn test_scroll_to_records_behavior() {
    let (mut doc, strip, _) = nav_document();
    doc.scroll_to(strip, 120.0, 0.0, ScrollBehavior::Smooth);
    let state = doc.scroll_state(strip);
    assert_eq!(state.left, 120.0);
    assert_eq!(state.behavior, Some(ScrollBehavior::Smooth));
}

// ============================================================================
// LISTENERS
// ============================================================================

#[test]
fn test_disposer_removes_listeners() {
    let (mut doc, _, links) = nav_document();
    let clicks = Rc::new(Cell::new(0));

    let mut disposer = Disposer::new();
    for &link in &links {
        let clicks = Rc::clone(&clicks);
        disposer.push(doc.add_event_listener(link, EventType::Click, move |_, _| {
            clicks.set(clicks.get() + 1);
        }));
    }
    doc.click(links[1]);
    assert_eq!(clicks.get(), 1);

    assert_eq!(disposer.dispose(&mut doc), 3);
    doc.click(links[1]);
    assert_eq!(clicks.get(), 1);
    assert!(doc.events().is_empty());
}

#[test]
fn test_stop_propagation() {
    let (mut doc, strip, links) = nav_document();
    let reached_strip = Rc::new(Cell::new(false));
    let flag = Rc::clone(&reached_strip);

    doc.add_event_listener(links[0], EventType::Click, |_, event| event.stop_propagation());
    doc.add_event_listener(strip, EventType::Click, move |_, _| flag.set(true));

    doc.click(links[0]);
    assert!(!reached_strip.get());
}

#[test]
fn test_handler_can_mutate_document() {
    let (mut doc, _, links) = nav_document();
    let target = links[2];
    doc.add_event_listener(target, EventType::Click, move |doc, event| {
        doc.add_class(event.current_target, "active");
    });

    doc.click(target);
    assert!(doc.has_class(target, "active"));
}

#[test]
fn test_load_does_not_bubble() {
    let (mut doc, strip, links) = nav_document();
    let hit = Rc::new(Cell::new(false));
    let flag = Rc::clone(&hit);
    doc.add_event_listener(strip, EventType::Load, move |_, _| flag.set(true));

    doc.dispatch_event(links[0], EventType::Load);
    assert!(!hit.get());
}
