//! Page initializer tests for blaze-router

use blaze_dom::{EventType, NodeId, Rect, Viewport};
use blaze_net::MemoryFetcher;
use blaze_router::{
    LazyConfig, MemoryStore, NavConfig, NavigationRequest, PageInitializer, RouteTable, Router,
    RouterConfig,
};
use smol::block_on;

const SHELL: &str = r##"<html><body>
  <nav class="horizontal-nav"><div class="nav-container">
    <a class="horizontal-nav-item" href="#home">Home</a>
    <a class="horizontal-nav-item" href="#menu">Menu</a>
  </div></nav>
  <main id="app"></main>
</body></html>"##;

const MENU: &str = r##"<a href="#starters">Starters</a>
<section id="starters"><img data-src="img/momo.jpg" alt="Momos"></section>
<iframe data-src="https://maps.example/blaze"></iframe>"##;

// ============================================================================
// IDEMPOTENCE
// ============================================================================

#[test]
fn test_revisiting_route_does_not_accumulate_listeners() {
    let fetcher = MemoryFetcher::new();
    fetcher.insert("pages/home.html", "<h1>Home</h1>");
    fetcher.insert("pages/menu.html", MENU);
    let document = blaze_html::parse_document(SHELL, "file:///blaze/index.html#menu");
    let mut router = Router::new(document, RouterConfig::default(), MemoryStore::new()).unwrap();

    block_on(router.start(&fetcher)).unwrap();
    let first = router.document().events().len();
    assert_eq!(router.last_init().unwrap().smooth_links, 1);

    for route in ["home", "menu", "home", "menu"] {
        block_on(router.navigate(&fetcher, NavigationRequest::new(route))).unwrap();
    }

    assert_eq!(router.document().events().len(), first);
    assert_eq!(router.state().current(), Some("menu"));
}

#[test]
fn test_rerun_on_same_fragment_replaces_bindings() {
    let mut doc = blaze_html::parse_document(SHELL, "file:///blaze/index.html");
    let app = doc.get_element_by_id("app").unwrap();
    blaze_html::parse_fragment_into(&mut doc, app, MENU).unwrap();
    let anchor = doc.query_selector(app, r##"a[href="#starters"]"##).unwrap().unwrap();

    let mut init = PageInitializer::new(LazyConfig::default(), "loaded");
    let routes = RouteTable::blaze();
    let nav = NavConfig::default();
    for _ in 0..3 {
        init.run(&mut doc, app, "menu", &routes, &nav).unwrap();
    }

    assert_eq!(doc.events().count_for(anchor, EventType::Click), 1);
    assert_eq!(init.runs(), 3);

    init.teardown(&mut doc);
    assert!(doc.events().is_empty());
}

// ============================================================================
// LAZY LOADING
// ============================================================================

#[test]
fn test_lazy_targets_load_once() {
    let mut doc = blaze_html::parse_document(SHELL, "file:///blaze/index.html");
    doc.set_viewport(Viewport::new(1280.0, 800.0));
    let app = doc.get_element_by_id("app").unwrap();
    blaze_html::parse_fragment_into(
        &mut doc,
        app,
        r#"<img id="top" data-src="img/top.jpg"><img id="low" data-src="img/low.jpg"><iframe id="map" data-src="map.html"></iframe>"#,
    )
    .unwrap();
    let top = doc.get_element_by_id("top").unwrap();
    let low = doc.get_element_by_id("low").unwrap();
    let map = doc.get_element_by_id("map").unwrap();
    doc.set_layout(top, Rect::new(0.0, 100.0, 400.0, 300.0));
    doc.set_layout(low, Rect::new(0.0, 2000.0, 400.0, 300.0));
    // inside the iframe margin, below the fold
    doc.set_layout(map, Rect::new(0.0, 900.0, 600.0, 400.0));

    let mut init = PageInitializer::new(LazyConfig::default(), "loaded");
    let report = init
        .run(&mut doc, app, "menu", &RouteTable::blaze(), &NavConfig::default())
        .unwrap();

    assert_eq!(report.lazy_loaded, 2);
    assert_eq!(report.lazy_pending, 1);
    assert_eq!(doc.get_attribute(top, "src"), Some("img/top.jpg"));
    assert!(doc.has_class(top, "loaded"));
    assert_eq!(doc.get_attribute(map, "src"), Some("map.html"));
    assert_eq!(doc.get_attribute(map, "data-src"), None);
    assert_eq!(doc.get_attribute(low, "src"), None);

    let mut viewport = doc.viewport();
    viewport.scroll_y = 1500.0;
    doc.set_viewport(viewport);
    assert_eq!(init.viewport_changed(&mut doc), vec![low]);
    assert!(init.viewport_changed(&mut doc).is_empty());
    assert_eq!(init.lazy().loaded(), 3);
}

#[test]
fn test_router_viewport_change_loads_pending() {
    let fetcher = MemoryFetcher::new();
    fetcher.insert("pages/menu.html", r#"<img id="dish" data-src="img/dish.jpg">"#);
    let document = blaze_html::parse_document(SHELL, "file:///blaze/index.html");
    let mut router = Router::new(document, RouterConfig::default(), MemoryStore::new()).unwrap();

    // without layout the image loads with the fragment
    block_on(router.navigate(&fetcher, NavigationRequest::new("menu"))).unwrap();
    let dish = router.document().get_element_by_id("dish").unwrap();
    assert_eq!(router.document().get_attribute(dish, "src"), Some("img/dish.jpg"));

    let loaded = router.set_viewport(Viewport::new(375.0, 667.0)).unwrap();
    assert!(loaded.is_empty());
    assert_eq!(router.document().viewport().width, 375.0);
    assert!(router.document().query_selector(NodeId::ROOT, ".horizontal-nav-item.active").unwrap().is_some());
}
