//! Document - High-level document API

use std::rc::Rc;

use crate::{
    inner_html, DomError, DomEvent, DomTree, EventRegistry, EventType, ListenerId, NodeId, Rect,
    ScrollBehavior, ScrollBlock, ScrollState, SelectorList, Viewport,
};

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
    viewport: Viewport,
    viewport_behavior: Option<ScrollBehavior>,
    events: EventRegistry,
}

impl Document {
    /// Create a new document with html/head/body
    pub fn new(url: &str) -> Self {
        let mut doc = Self::empty(url);
        let html = doc.tree.create_element("html");
        let head = doc.tree.create_element("head");
        let body = doc.tree.create_element("body");
        doc.tree.append_child(NodeId::ROOT, html);
        doc.tree.append_child(html, head);
        doc.tree.append_child(html, body);
        doc.finalize();
        doc
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
            viewport: Viewport::default(),
            viewport_behavior: None,
            events: EventRegistry::new(),
        }
    }

    /// Locate html/head/body after the tree was built externally
    pub fn finalize(&mut self) {
        let find = |tree: &DomTree, parent: NodeId, tag: &str| {
            tree.children(parent)
                .find(|(_, n)| n.as_element().is_some_and(|e| e.tag == tag))
                .map_or(NodeId::NONE, |(id, _)| id)
        };
        self.html_element = find(&self.tree, NodeId::ROOT, "html");
        self.head_element = find(&self.tree, self.html_element, "head");
        self.body_element = find(&self.tree, self.html_element, "body");
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Text of the first <title> element
    pub fn title(&self) -> String {
        self.tree
            .descendants(NodeId::ROOT)
            .into_iter()
            .find(|&id| self.tree.element(id).is_some_and(|e| e.tag == "title"))
            .map(|id| self.tree.text_content(id).trim().to_string())
            .unwrap_or_default()
    }

    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    pub fn head(&self) -> NodeId {
        self.head_element
    }

    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Get element by ID
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree
            .descendants(NodeId::ROOT)
            .into_iter()
            .find(|&node| self.tree.element(node).and_then(|e| e.id()) == Some(id))
    }

    /// First element under `root` matching `selector`
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(SelectorList::parse(selector)?.query(&self.tree, root))
    }

    /// All elements under `root` matching `selector`
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        Ok(SelectorList::parse(selector)?.query_all(&self.tree, root))
    }

    /// Nearest inclusive ancestor matching `selector`
    pub fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let list = SelectorList::parse(selector)?;
        Ok(std::iter::once(node)
            .chain(self.tree.ancestors(node))
            .find(|&id| list.matches(&self.tree, id)))
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.tree.element(node)?.get_attr(name)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let elem = self.element_mut(node)?;
        elem.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.tree.element_mut(node)?.remove_attr(name)
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut crate::ElementData, DomError> {
        if !self.tree.contains(node) {
            return Err(DomError::NoSuchNode(node));
        }
        self.tree.element_mut(node).ok_or(DomError::NotAnElement(node))
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.tree.element(node).is_some_and(|e| e.has_class(class))
    }

    /// Add a class, returns true if the element changed
    pub fn add_class(&mut self, node: NodeId, class: &str) -> bool {
        self.update_classes(node, |list| list.add(class))
    }

    /// Remove a class, returns true if the element changed
    pub fn remove_class(&mut self, node: NodeId, class: &str) -> bool {
        self.update_classes(node, |list| list.remove(class))
    }

    /// Toggle a class, returns the new state
    pub fn toggle_class(&mut self, node: NodeId, class: &str, force: Option<bool>) -> bool {
        let mut state = false;
        self.update_classes(node, |list| {
            let had = list.contains(class);
            state = list.toggle(class, force);
            had != state
        });
        state
    }

    fn update_classes(&mut self, node: NodeId, f: impl FnOnce(&mut crate::ClassList) -> bool) -> bool {
        let Some(elem) = self.tree.element_mut(node) else {
            return false;
        };
        let mut list = elem.class_list();
        let changed = f(&mut list);
        if changed {
            elem.set_class_list(&list);
        }
        changed
    }

    /// Assign a layout box to a node
    pub fn set_layout(&mut self, node: NodeId, rect: Rect) {
        if let Some(n) = self.tree.get_mut(node) {
            n.layout = Some(rect);
        }
    }

    pub fn layout(&self, node: NodeId) -> Option<Rect> {
        self.tree.get(node)?.layout
    }

    pub fn scroll_state(&self, node: NodeId) -> ScrollState {
        self.tree.get(node).map(|n| n.scroll).unwrap_or_default()
    }

    /// Scroll a container to an offset
    pub fn scroll_to(&mut self, node: NodeId, left: f64, top: f64, behavior: ScrollBehavior) {
        if let Some(n) = self.tree.get_mut(node) {
            n.scroll = ScrollState {
                left,
                top,
                behavior: Some(behavior),
            };
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Behavior of the last viewport scroll
    pub fn viewport_behavior(&self) -> Option<ScrollBehavior> {
        self.viewport_behavior
    }

    /// Scroll the viewport so `node` is visible, returns false without layout
    pub fn scroll_into_view(&mut self, node: NodeId, block: ScrollBlock, behavior: ScrollBehavior) -> bool {
        let Some(rect) = self.layout(node) else {
            return false;
        };
        let top = match block {
            ScrollBlock::Start => rect.y,
            ScrollBlock::Center => rect.y + rect.height / 2.0 - self.viewport.height / 2.0,
            ScrollBlock::End => rect.bottom() - self.viewport.height,
        };
        self.viewport.scroll_y = top.max(0.0);
        self.viewport_behavior = Some(behavior);
        true
    }

    /// Register a listener on `node`
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event_type: EventType,
        handler: impl Fn(&mut Document, &mut DomEvent) + 'static,
    ) -> ListenerId {
        self.events.add(node, event_type, Rc::new(handler))
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.events.remove(id)
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    /// Dispatch an event at `target`, bubbling through ancestors
    pub fn dispatch_event(&mut self, target: NodeId, event_type: EventType) -> DomEvent {
        let mut event = DomEvent::new(event_type, target);
        let mut path = vec![target];
        if event.bubbles {
            path.extend(self.tree.ancestors(target));
        }

        for node in path {
            event.current_target = node;
            for handler in self.events.handlers_for(node, event_type) {
                handler(self, &mut event);
            }
            if event.is_propagation_stopped() {
                break;
            }
        }

        tracing::trace!(
            "dispatched {} at {} (default prevented: {})",
            event_type.as_str(),
            target,
            event.is_default_prevented()
        );
        event
    }

    /// Simulate a user click
    pub fn click(&mut self, node: NodeId) -> DomEvent {
        self.dispatch_event(node, EventType::Click)
    }

    /// Remove all children of `parent` and their listeners
    pub fn clear_children(&mut self, parent: NodeId) -> usize {
        let removed = self.tree.remove_children(parent);
        let purged = self.events.purge(&removed);
        if purged > 0 {
            tracing::debug!("purged {} listeners from removed nodes", purged);
        }
        removed.len()
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        inner_html(&self.tree, node)
    }

    pub fn text_content(&self, node: NodeId) -> String {
        self.tree.text_content(node)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}
