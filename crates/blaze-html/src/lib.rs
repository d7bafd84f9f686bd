//! Blaze HTML Parser
//!
//! HTML5 parsing built on html5ever. Shell documents are parsed whole;
//! route fragments are parsed and grafted under a container element.

mod parser;

pub use parser::HtmlParser;

use blaze_dom::{Document, NodeId};

/// Parse an HTML string into a Document
pub fn parse(html: &str) -> Document {
    HtmlParser::new().parse(html)
}

/// Parse an HTML string into a Document with a URL
pub fn parse_document(html: &str, url: &str) -> Document {
    HtmlParser::new().parse_with_url(html, url)
}

/// Parse `html` and append the resulting nodes under `parent`
pub fn parse_fragment_into(
    document: &mut Document,
    parent: NodeId,
    html: &str,
) -> Result<Vec<NodeId>, ParseError> {
    HtmlParser::new().parse_fragment_into(document, parent, html)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Fragment target {0} is not in the document")]
    MissingTarget(NodeId),

    #[error("Fragment target {0} is not an element")]
    InvalidTarget(NodeId),
}
