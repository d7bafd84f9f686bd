//! Lazy loading of deferred images and iframes
//!
//! An intersection check over `img[data-src]` and `iframe[data-src]`
//! targets. Targets without a layout box count as intersecting.

use blaze_dom::{Disposer, Document, DomError, EventType, NodeId};

use crate::config::LazyConfig;

/// Kind of deferred element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazyKind {
    Image,
    Iframe,
}

#[derive(Debug, Clone, Copy)]
struct Target {
    node: NodeId,
    kind: LazyKind,
}

/// Observer for deferred media
#[derive(Debug)]
pub struct LazyLoader {
    config: LazyConfig,
    loaded_class: String,
    targets: Vec<Target>,
    listeners: Disposer,
    loaded: usize,
}

impl LazyLoader {
    pub fn new(config: LazyConfig, loaded_class: &str) -> Self {
        Self {
            config,
            loaded_class: loaded_class.to_string(),
            targets: Vec::new(),
            listeners: Disposer::new(),
            loaded: 0,
        }
    }

    /// Replace the observed set with the deferred elements under `root`
    pub fn observe(&mut self, document: &mut Document, root: NodeId) -> Result<usize, DomError> {
        self.disconnect(document);

        for (selector, kind) in [("img[data-src]", LazyKind::Image), ("iframe[data-src]", LazyKind::Iframe)] {
            for node in document.query_selector_all(root, selector)? {
                let done = document.get_attribute(node, "src").is_some()
                    && document.get_attribute(node, "src") == document.get_attribute(node, "data-src");
                if !done {
                    self.targets.push(Target { node, kind });
                }
            }
        }
        Ok(self.targets.len())
    }

    /// Stop observing and drop load listeners
    pub fn disconnect(&mut self, document: &mut Document) {
        self.targets.clear();
        std::mem::take(&mut self.listeners).dispose(document);
    }

    /// Load every target that intersects the viewport, returning them
    pub fn check(&mut self, document: &mut Document) -> Vec<NodeId> {
        let viewport = document.viewport().rect();
        let mut hits = Vec::new();
        let mut waiting = Vec::new();

        for target in std::mem::take(&mut self.targets) {
            if !document.tree().contains(target.node) {
                continue;
            }
            let margin = match target.kind {
                LazyKind::Image => self.config.image_margin,
                LazyKind::Iframe => self.config.iframe_margin,
            };
            let visible = document
                .layout(target.node)
                .is_none_or(|rect| rect.intersects(&viewport.inflate(0.0, margin)));
            if visible && self.load(document, target) {
                hits.push(target.node);
            } else if !visible {
                waiting.push(target);
            }
        }

        self.targets = waiting;
        self.loaded += hits.len();
        if !hits.is_empty() {
            tracing::debug!("Lazy loaded {} elements, {} pending", hits.len(), self.targets.len());
        }
        hits
    }

    fn load(&mut self, document: &mut Document, target: Target) -> bool {
        let Some(src) = document.get_attribute(target.node, "data-src").map(str::to_string) else {
            return false;
        };
        if document.set_attribute(target.node, "src", &src).is_err() {
            return false;
        }

        match target.kind {
            LazyKind::Iframe => {
                document.remove_attribute(target.node, "data-src");
            }
            LazyKind::Image => {
                let class = self.loaded_class.clone();
                self.listeners.push(document.add_event_listener(
                    target.node,
                    EventType::Load,
                    move |doc, event| {
                        doc.add_class(event.target, &class);
                    },
                ));
                // no decoder: the image finishes loading as soon as src is set
                document.dispatch_event(target.node, EventType::Load);
            }
        }
        true
    }

    /// Targets still waiting for intersection
    pub fn pending(&self) -> usize {
        self.targets.len()
    }

    /// Total elements loaded by this observer
    pub fn loaded(&self) -> usize {
        self.loaded
    }
}
