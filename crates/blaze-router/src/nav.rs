//! Navigation UI sync
//!
//! Marks the nav entries for the current route active and centres the
//! active horizontal entry in its scroll strip. Layout boxes are document
//! coordinates of the unscrolled content.

use blaze_dom::{Document, DomError, NodeId, ScrollBehavior};
use serde::Serialize;

use crate::config::NavConfig;

/// Result of one sync pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavReport {
    /// Entries now marked active
    pub active: usize,
    /// Horizontal entry that was centred
    #[serde(skip)]
    pub active_item: Option<NodeId>,
    /// Strip scroll offset, when layout was available
    pub scroll_left: Option<f64>,
}

/// Apply the active marker for `route` and centre it
pub fn sync_nav(document: &mut Document, route: &str, nav: &NavConfig) -> Result<NavReport, DomError> {
    let href = format!("#{route}");
    let mut report = NavReport::default();

    let horizontal = document.query_selector_all(NodeId::ROOT, &nav.horizontal_item)?;
    let side = document.query_selector_all(NodeId::ROOT, &nav.side_link)?;
    for &item in horizontal.iter().chain(&side) {
        let is_active = document.get_attribute(item, "href") == Some(href.as_str());
        document.toggle_class(item, &nav.active_class, Some(is_active));
        if is_active {
            report.active += 1;
        }
    }

    let Some(strip) = document.query_selector(NodeId::ROOT, &nav.strip)? else {
        return Ok(report);
    };
    let active_item = horizontal.into_iter().find(|&item| {
        document.has_class(item, &nav.active_class) && document.tree().ancestors(item).contains(&strip)
    });
    report.active_item = active_item;
    report.scroll_left = active_item.and_then(|item| centre_in_strip(document, strip, item));

    tracing::debug!("Nav sync for {}: {} active", route, report.active);
    Ok(report)
}

/// Scroll `strip` so `item` sits in its middle, clamped to the scroll range
pub fn centre_in_strip(document: &mut Document, strip: NodeId, item: NodeId) -> Option<f64> {
    let strip_box = document.layout(strip)?;
    let item_box = document.layout(item)?;

    let offset_left = item_box.x - strip_box.x;
    let target = offset_left - strip_box.width / 2.0 + item_box.width / 2.0;

    let content_width = document
        .tree()
        .descendants(strip)
        .into_iter()
        .filter_map(|id| document.layout(id))
        .map(|rect| rect.right() - strip_box.x)
        .fold(strip_box.width, f64::max);
    let max_scroll = (content_width - strip_box.width).max(0.0);

    let left = target.clamp(0.0, max_scroll);
    let top = document.scroll_state(strip).top;
    document.scroll_to(strip, left, top, ScrollBehavior::Smooth);
    Some(left)
}
