//! DOM Tree (arena-based allocation)

use crate::{ElementData, Node, NodeId};

/// Arena-based DOM tree
///
/// Slot 0 always holds the document node. Removing a subtree tombstones its
/// slots; ids are never reused, so a stale id can never alias a newer node.
/// The slot vector only grows: every fragment swap leaves its old nodes
/// behind as empty slots. [`DomTree::len`] counts live nodes and
/// [`DomTree::slots`] the allocated ones.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Option<Node>>,
    live: usize,
}

impl DomTree {
    /// Create a tree containing only the document node
    pub fn new() -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            live: 0,
        };
        tree.push(Node::document());
        tree
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        self.live += 1;
        id
    }

    /// Document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)?.as_ref()
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)?.as_mut()
    }

    /// Check whether the id refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id)?.as_element()
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id)?.as_element_mut()
    }

    /// Number of live nodes in the tree
    pub fn len(&self) -> usize {
        self.live
    }

    /// Allocated slots, tombstones included
    pub fn slots(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree holds nothing but the document node
    pub fn is_empty(&self) -> bool {
        self.live <= 1
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Node::text(text))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(Node::comment(text))
    }

    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.push(Node::doctype(name))
    }

    /// Append `child` as last child of `parent`, detaching it first.
    ///
    /// Returns false if either node is gone or the append would create a
    /// cycle.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if self.ancestors(parent).contains(&child) {
            return false;
        }

        self.detach(child);

        let Some(prev_last) = self.get(parent).map(|p| p.last_child) else {
            return false;
        };
        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = prev_last;
            node.next_sibling = NodeId::NONE;
        }
        if let Some(prev) = self.get_mut(prev_last) {
            prev.next_sibling = child;
        }
        if let Some(p) = self.get_mut(parent) {
            if !p.first_child.is_valid() {
                p.first_child = child;
            }
            p.last_child = child;
        }
        true
    }

    /// Unlink a node from its parent and siblings
    pub fn detach(&mut self, id: NodeId) {
        let Some((parent, prev, next)) = self
            .get(id)
            .map(|n| (n.parent, n.prev_sibling, n.next_sibling))
        else {
            return;
        };

        if let Some(p) = self.get_mut(prev) {
            p.next_sibling = next;
        }
        if let Some(n) = self.get_mut(next) {
            n.prev_sibling = prev;
        }
        if let Some(p) = self.get_mut(parent) {
            if p.first_child == id {
                p.first_child = next;
            }
            if p.last_child == id {
                p.last_child = prev;
            }
        }
        if let Some(n) = self.get_mut(id) {
            n.parent = NodeId::NONE;
            n.prev_sibling = NodeId::NONE;
            n.next_sibling = NodeId::NONE;
        }
    }

    /// Remove a node and its subtree, returning every removed id
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if id == NodeId::ROOT || !self.contains(id) {
            return Vec::new();
        }
        self.detach(id);

        let mut removed = vec![id];
        removed.extend(self.descendants(id));
        for &gone in &removed {
            if let Some(slot) = self.nodes.get_mut(gone.0 as usize) {
                if slot.take().is_some() {
                    self.live -= 1;
                }
            }
        }
        removed
    }

    /// Remove all children of `parent`, returning every removed id
    pub fn remove_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let mut removed = Vec::new();
        for child in self.child_ids(parent) {
            removed.extend(self.remove(child));
        }
        removed
    }

    /// Iterate direct children
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(parent).map_or(NodeId::NONE, |p| p.first_child),
        }
    }

    pub fn child_ids(&self, parent: NodeId) -> Vec<NodeId> {
        self.children(parent).map(|(id, _)| id).collect()
    }

    /// All descendants of `root` in document (pre-)order, excluding `root`
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_ids(root).into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.child_ids(id).into_iter().rev());
        }
        out
    }

    /// Ancestors from parent up to the document node
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.get(id).map_or(NodeId::NONE, |n| n.parent);
        while let Some(node) = self.get(current) {
            out.push(current);
            current = node.parent;
        }
        out
    }

    /// Check whether the node is attached to the document
    pub fn is_connected(&self, id: NodeId) -> bool {
        id == NodeId::ROOT || self.ancestors(id).last() == Some(&NodeId::ROOT)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            out.push_str(text);
        }
        for desc in self.descendants(id) {
            if let Some(text) = self.get(desc).and_then(Node::as_text) {
                out.push_str(text);
            }
        }
        out
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the direct children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}
