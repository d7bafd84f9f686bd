//! Blaze DOM - Document Object Model
//!
//! Arena-backed DOM tree for the SPA shell. Nodes are addressed by
//! [`NodeId`]; removed nodes leave a tombstone so a stale id never resolves
//! to a node inserted later.

mod classlist;
mod document;
mod events;
mod geometry;
mod node;
mod selector;
mod serialize;
mod tree;

pub use classlist::ClassList;
pub use document::Document;
pub use events::{Disposer, DomEvent, EventRegistry, EventType, Handler, ListenerId};
pub use geometry::{Rect, ScrollBehavior, ScrollBlock, ScrollState, Viewport};
pub use node::{Attribute, ElementData, Node, NodeData};
pub use selector::{Selector, SelectorList};
pub use serialize::{inner_html, outer_html};
pub use tree::{Children, DomTree};

use std::fmt;

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this id refers to a node slot
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#none")
        }
    }
}

/// DOM error
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("Invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No such node: {0}")]
    NoSuchNode(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),
}
