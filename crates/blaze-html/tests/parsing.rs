//! Parsing tests for blaze-html
//!
//! Shell documents, route fragments and malformed markup.

use blaze_dom::{NodeId, Selector};
use blaze_html::{parse, parse_document, parse_fragment_into, ParseError};

// ============================================================================
// SHELL DOCUMENTS
// ============================================================================

#[test]
fn test_shell_document_finds_app_container() {
    let html = r##"<!DOCTYPE html>
<html>
<head><title>Blaze</title></head>
<body>
  <nav class="horizontal-nav"><div class="nav-container">
    <a class="horizontal-nav-item" href="#home">Home</a>
    <a class="horizontal-nav-item" href="#menu">Menu</a>
  </div></nav>
  <main id="app"></main>
</body>
</html>"##;
    let doc = parse_document(html, "file:///site/index.html");

    assert_eq!(doc.url(), "file:///site/index.html");
    assert_eq!(doc.title(), "Blaze");
    assert!(doc.get_element_by_id("app").is_some());
    assert_eq!(
        doc.query_selector_all(NodeId::ROOT, ".horizontal-nav-item").unwrap().len(),
        2
    );
}

#[test]
fn test_attributes_survive_parsing() {
    let doc = parse(r#"<img data-src="img/burger.webp" alt="Burger &amp; fries">"#);
    let img = doc.query_selector(NodeId::ROOT, "img[data-src]").unwrap().unwrap();

    assert_eq!(doc.get_attribute(img, "data-src"), Some("img/burger.webp"));
    assert_eq!(doc.get_attribute(img, "alt"), Some("Burger & fries"));
}

// ============================================================================
// FRAGMENTS
// ============================================================================

#[test]
fn test_fragment_appends_after_existing_children() {
    let mut doc = parse(r#"<main id="app"><p>old</p></main>"#);
    let app = doc.get_element_by_id("app").unwrap();

    let added = parse_fragment_into(&mut doc, app, "<h2>Chinese</h2>").unwrap();

    assert_eq!(added.len(), 1);
    assert_eq!(doc.tree().child_ids(app).len(), 2);
    assert_eq!(doc.inner_html(app), "<p>old</p><h2>Chinese</h2>");
}

#[test]
fn test_fragment_nodes_match_descendant_selectors() {
    let mut doc = parse(r#"<main id="app"></main>"#);
    let app = doc.get_element_by_id("app").unwrap();
    parse_fragment_into(&mut doc, app, r##"<section><a href="#specials">Specials</a></section>"##)
        .unwrap();

    let link = doc.query_selector(app, "a").unwrap().unwrap();
    assert!(Selector::parse("#app section a[href^=\"#\"]").unwrap().matches(doc.tree(), link));
}

#[test]
fn test_fragment_with_missing_target() {
    let mut doc = parse("<main></main>");
    let err = parse_fragment_into(&mut doc, NodeId::NONE, "<p>x</p>").unwrap_err();
    assert!(matches!(err, ParseError::MissingTarget(_)));
}

#[test]
fn test_empty_fragment_appends_nothing() {
    let mut doc = parse(r#"<main id="app"></main>"#);
    let app = doc.get_element_by_id("app").unwrap();
    assert!(parse_fragment_into(&mut doc, app, "   \n ").unwrap().is_empty());
}

// ============================================================================
// MALFORMED HTML
// ============================================================================

#[test]
fn test_unclosed_fragment_is_repaired() {
    let mut doc = parse(r#"<main id="app"></main>"#);
    let app = doc.get_element_by_id("app").unwrap();
    parse_fragment_into(&mut doc, app, "<div><p><span>text").unwrap();

    assert_eq!(doc.inner_html(app), "<div><p><span>text</span></p></div>");
}

#[test]
fn test_parse_orphan_closing_tag() {
    let doc = parse("</div>");
    assert!(doc.body().is_valid());
}
