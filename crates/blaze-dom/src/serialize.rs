//! HTML serialization (innerHTML / outerHTML)

use crate::{DomTree, NodeData, NodeId};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize the children of `node`
pub fn inner_html(tree: &DomTree, node: NodeId) -> String {
    let mut out = String::new();
    for (child, _) in tree.children(node) {
        write_node(tree, child, false, &mut out);
    }
    out
}

/// Serialize `node` including its own tag
pub fn outer_html(tree: &DomTree, node: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, node, false, &mut out);
    out
}

fn write_node(tree: &DomTree, id: NodeId, raw_text: bool, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.data {
        NodeData::Document => {
            for (child, _) in tree.children(id) {
                write_node(tree, child, false, out);
            }
        }
        NodeData::Doctype { name } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text(text) if raw_text => out.push_str(text),
        NodeData::Text(text) => escape_into(text, false, out),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element(elem) => {
            out.push('<');
            out.push_str(&elem.tag);
            for attr in elem.attrs() {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                escape_into(&attr.value, true, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&elem.tag.as_str()) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&elem.tag.as_str());
            for (child, _) in tree.children(id) {
                write_node(tree, child, raw, out);
            }
            out.push_str("</");
            out.push_str(&elem.tag);
            out.push('>');
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_escapes() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let img = tree.create_element("img");
        if let Some(e) = tree.element_mut(img) {
            e.set_attr("alt", "Fish & \"Chips\"");
        }
        let text = tree.create_text("1 < 2");
        tree.append_child(tree.root(), p);
        tree.append_child(p, text);
        tree.append_child(p, img);

        assert_eq!(
            outer_html(&tree, p),
            r#"<p>1 &lt; 2<img alt="Fish &amp; &quot;Chips&quot;"></p>"#
        );
    }
}
