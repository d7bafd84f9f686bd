//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it into the arena DOM.

use blaze_dom::{Document, DomTree, NodeId};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::ParseError;

/// HTML5 parser
pub struct HtmlParser {
    keep_whitespace: bool,
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self {
            keep_whitespace: false,
        }
    }

    /// Keep whitespace-only text nodes (dropped by default)
    pub fn keep_whitespace(mut self, keep: bool) -> Self {
        self.keep_whitespace = keep;
        self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = parse_document(RcDom::default(), Default::default()).one(html);

        let mut document = Document::empty(url);
        self.convert_node(&dom.document, document.tree_mut(), NodeId::ROOT);
        document.finalize();

        tracing::debug!("Parsed {} nodes", document.tree().len());
        document
    }

    /// Parse a fragment and append it under `parent`.
    ///
    /// The markup goes through the full document algorithm; whatever lands in
    /// the implied `<head>` (styles, links) and `<body>` is grafted in that
    /// order. Whitespace text is always kept so the container holds the
    /// markup as fetched. Returns the top-level nodes that were appended.
    pub fn parse_fragment_into(
        &self,
        document: &mut Document,
        parent: NodeId,
        html: &str,
    ) -> Result<Vec<NodeId>, ParseError> {
        let Some(target) = document.tree().get(parent) else {
            return Err(ParseError::MissingTarget(parent));
        };
        if !target.is_element() {
            return Err(ParseError::InvalidTarget(parent));
        }

        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        let before = document.tree().child_ids(parent).len();

        let grafter = Self { keep_whitespace: true };
        for section in implied_sections(&dom.document) {
            for child in section.children.borrow().iter() {
                grafter.convert_node(child, document.tree_mut(), parent);
            }
        }

        let appended: Vec<NodeId> = document
            .tree()
            .child_ids(parent)
            .into_iter()
            .skip(before)
            .collect();
        tracing::debug!("Inserted {} fragment nodes under {}", appended.len(), parent);
        Ok(appended)
    }

    /// Convert an RcDom node into the arena tree
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent);
                }
            }
            RcNodeData::Doctype { name, .. } => {
                let id = tree.create_doctype(name);
                tree.append_child(parent, id);
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                if self.keep_whitespace || !text.trim().is_empty() {
                    let id = tree.create_text(&text);
                    tree.append_child(parent, id);
                }
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(contents);
                tree.append_child(parent, id);
            }
            RcNodeData::Element { name, attrs, .. } => {
                let id = tree.create_element(&name.local);
                if let Some(elem) = tree.element_mut(id) {
                    for attr in attrs.borrow().iter() {
                        elem.set_attr(&attr.name.local, &attr.value);
                    }
                }
                tree.append_child(parent, id);

                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, id);
                }
            }
            RcNodeData::ProcessingInstruction { .. } => {}
        }
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// The implied `<head>` and `<body>` of a parsed fragment, in that order
fn implied_sections(document: &Handle) -> Vec<Handle> {
    let children = document.children.borrow();
    let Some(html) = children.iter().find(|c| is_element(c, "html")) else {
        return Vec::new();
    };
    let sections = html.children.borrow();
    ["head", "body"]
        .iter()
        .filter_map(|tag| sections.iter().find(|c| is_element(c, tag)).cloned())
        .collect()
}

fn is_element(handle: &Handle, tag: &str) -> bool {
    matches!(&handle.data, RcNodeData::Element { name, .. } if name.local.as_ref() == tag)
}
