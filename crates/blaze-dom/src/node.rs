//! DOM Node
//!
//! Nodes link to parent and siblings by [`NodeId`] instead of pointers.

use crate::{ClassList, NodeId, Rect, ScrollState};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
    /// Layout box, if the element has been laid out
    pub layout: Option<Rect>,
    /// Scroll offsets when the node is a scroll container
    pub scroll: ScrollState,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
            layout: None,
            scroll: ScrollState::default(),
        }
    }

    /// Create a new element node
    pub fn element(tag: &str) -> Self {
        Self::with_data(NodeData::Element(ElementData::new(tag)))
    }

    /// Create a new text node
    pub fn text(content: &str) -> Self {
        Self::with_data(NodeData::Text(content.to_string()))
    }

    pub fn comment(content: &str) -> Self {
        Self::with_data(NodeData::Comment(content.to_string()))
    }

    pub fn doctype(name: &str) -> Self {
        Self::with_data(NodeData::Doctype { name: name.to_string() })
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// DOCTYPE
    Doctype { name: String },
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    attrs: Vec<Attribute>,
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Set an attribute, returning the previous value
    pub fn set_attr(&mut self, name: &str, value: &str) -> Option<String> {
        if let Some(attr) = self.attrs.iter_mut().find(|a| a.name == name) {
            return Some(std::mem::replace(&mut attr.value, value.to_string()));
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        None
    }

    /// Remove an attribute, returning its value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(pos).value)
    }

    pub fn attrs(&self) -> impl Iterator<Item = &Attribute> {
        self.attrs.iter()
    }

    pub fn id(&self) -> Option<&str> {
        self.get_attr("id")
    }

    pub fn class_list(&self) -> ClassList {
        ClassList::parse(self.get_attr("class").unwrap_or_default())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|c| c.split_whitespace().any(|t| t == class))
    }

    /// Write a class list back to the `class` attribute
    pub fn set_class_list(&mut self, list: &ClassList) {
        if list.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", &list.to_string());
        }
    }
}
