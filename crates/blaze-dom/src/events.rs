//! DOM Events
//!
//! Listener registration, bubbling dispatch and disposers.
//!
//! Handlers are reference counted so dispatch can clone them out of the
//! registry and call them with `&mut Document`.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::{Document, NodeId};

/// DOM event types used by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Click,
    Load,
    Scroll,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Load => "load",
            EventType::Scroll => "scroll",
        }
    }
}

/// DOM event
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub event_type: EventType,
    pub target: NodeId,
    pub current_target: NodeId,
    pub bubbles: bool,
    pub cancelable: bool,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    pub fn new(event_type: EventType, target: NodeId) -> Self {
        Self {
            event_type,
            target,
            current_target: target,
            bubbles: !matches!(event_type, EventType::Load | EventType::Scroll),
            cancelable: matches!(event_type, EventType::Click),
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Registered listener handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Event handler
pub type Handler = Rc<dyn Fn(&mut Document, &mut DomEvent)>;

struct Listener {
    node: NodeId,
    event_type: EventType,
    handler: Handler,
}

/// Listener registry, ordered by registration
#[derive(Default)]
pub struct EventRegistry {
    listeners: BTreeMap<ListenerId, Listener>,
    next_id: u64,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, node: NodeId, event_type: EventType, handler: Handler) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, Listener { node, event_type, handler });
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Drop listeners attached to removed nodes
    pub(crate) fn purge(&mut self, removed: &[NodeId]) -> usize {
        if removed.is_empty() {
            return 0;
        }
        let removed: HashSet<NodeId> = removed.iter().copied().collect();
        let before = self.listeners.len();
        self.listeners.retain(|_, l| !removed.contains(&l.node));
        before - self.listeners.len()
    }

    pub(crate) fn handlers_for(&self, node: NodeId, event_type: EventType) -> Vec<Handler> {
        self.listeners
            .values()
            .filter(|l| l.node == node && l.event_type == event_type)
            .map(|l| Rc::clone(&l.handler))
            .collect()
    }

    /// Total registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Listeners registered on one node
    pub fn count_for(&self, node: NodeId, event_type: EventType) -> usize {
        self.listeners
            .values()
            .filter(|l| l.node == node && l.event_type == event_type)
            .count()
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("listeners", &self.listeners.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

/// Collected listener registrations that can be torn down together
#[derive(Debug, Default)]
#[must_use = "dropping a Disposer leaves its listeners registered"]
pub struct Disposer {
    ids: Vec<ListenerId>,
}

impl Disposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: ListenerId) {
        self.ids.push(id);
    }

    pub fn extend(&mut self, other: Disposer) {
        self.ids.extend(other.ids);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Remove every listener, returns how many were still registered
    pub fn dispose(self, document: &mut Document) -> usize {
        self.ids
            .into_iter()
            .filter(|&id| document.remove_event_listener(id))
            .count()
    }
}

impl From<ListenerId> for Disposer {
    fn from(id: ListenerId) -> Self {
        Self { ids: vec![id] }
    }
}
