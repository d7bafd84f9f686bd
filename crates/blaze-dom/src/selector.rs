//! Simple CSS selectors
//!
//! Supports type, `#id`, `.class`, `*`, attribute selectors (`[a]`, `[a=v]`,
//! `[a^=v]`, `[a$=v]`, `[a*=v]`), compounds of those, the descendant
//! combinator and comma-separated lists. That is enough for the shell's
//! queries (`a[href^="#"]`, `.horizontal-nav .nav-container`, ...).

use crate::{DomError, DomTree, ElementData, NodeId};

/// Attribute matching operator
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrOp {
    Exists,
    Equals(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    op: AttrOp,
}

impl AttrSelector {
    fn matches(&self, elem: &ElementData) -> bool {
        let Some(value) = elem.get_attr(&self.name) else {
            return false;
        };
        match &self.op {
            AttrOp::Exists => true,
            AttrOp::Equals(v) => value == v,
            AttrOp::Prefix(v) => value.starts_with(v.as_str()),
            AttrOp::Suffix(v) => value.ends_with(v.as_str()),
            AttrOp::Contains(v) => value.contains(v.as_str()),
        }
    }
}

/// One compound selector, e.g. `a.nav-item[href^="#"]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

impl Compound {
    fn matches(&self, elem: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if !elem.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if elem.id() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| elem.has_class(c)) && self.attrs.iter().all(|a| a.matches(elem))
    }
}

/// A chain of compounds joined by descendant combinators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Compound>,
}

impl Selector {
    /// Parse a single complex selector (no commas)
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let mut parser = Parser::new(input);
        let mut parts = Vec::new();
        loop {
            parser.skip_whitespace();
            if parser.at_end() {
                break;
            }
            parts.push(parser.compound()?);
        }
        if parts.is_empty() {
            return Err(parser.error("empty selector"));
        }
        Ok(Self { parts })
    }

    /// Check if `node` matches, walking ancestors for descendant combinators
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some((subject, rest)) = self.parts.split_last() else {
            return false;
        };
        let Some(elem) = tree.element(node) else {
            return false;
        };
        if !subject.matches(elem) {
            return false;
        }

        let mut remaining = rest.iter().rev().peekable();
        for ancestor in tree.ancestors(node) {
            let Some(compound) = remaining.peek() else {
                break;
            };
            if tree.element(ancestor).is_some_and(|e| compound.matches(e)) {
                remaining.next();
            }
        }
        remaining.peek().is_none()
    }
}

/// Comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let selectors = split_top_level(input)
            .into_iter()
            .map(Selector::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(tree, node))
    }

    /// All matching descendants of `root` in document order
    pub fn query_all(&self, tree: &DomTree, root: NodeId) -> Vec<NodeId> {
        tree.descendants(root)
            .into_iter()
            .filter(|&id| self.matches(tree, id))
            .collect()
    }

    /// First matching descendant of `root`
    pub fn query(&self, tree: &DomTree, root: NodeId) -> Option<NodeId> {
        tree.descendants(root)
            .into_iter()
            .find(|&id| self.matches(tree, id))
    }
}

/// Split on commas that are not inside brackets or quotes
fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, reason: &str) -> DomError {
        DomError::InvalidSelector {
            selector: self.input.to_string(),
            reason: reason.to_string(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn ident(&mut self) -> Result<String, DomError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        if start == self.pos {
            return Err(self.error("expected identifier"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn compound(&mut self) -> Result<Compound, DomError> {
        let mut compound = Compound::default();
        let mut any = false;
        match self.peek() {
            Some('*') => {
                self.bump();
                any = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
                any = true;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.attribute()?);
                }
                Some(c) if c.is_whitespace() => break,
                None => break,
                Some(_) => return Err(self.error("unsupported selector syntax")),
            }
            any = true;
        }

        if !any {
            return Err(self.error("empty compound selector"));
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<AttrSelector, DomError> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();

        let op = match self.bump() {
            Some(']') => return Ok(AttrSelector { name, op: AttrOp::Exists }),
            Some('=') => "=",
            Some(c @ ('^' | '$' | '*')) => {
                if self.bump() != Some('=') {
                    return Err(self.error("expected `=` in attribute selector"));
                }
                match c {
                    '^' => "^=",
                    '$' => "$=",
                    _ => "*=",
                }
            }
            _ => return Err(self.error("malformed attribute selector")),
        };

        self.skip_whitespace();
        let value = self.attribute_value()?;
        self.skip_whitespace();
        if self.bump() != Some(']') {
            return Err(self.error("unterminated attribute selector"));
        }

        let op = match op {
            "=" => AttrOp::Equals(value),
            "^=" => AttrOp::Prefix(value),
            "$=" => AttrOp::Suffix(value),
            _ => AttrOp::Contains(value),
        };
        Ok(AttrSelector { name, op })
    }

    fn attribute_value(&mut self) -> Result<String, DomError> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c == q {
                        let value = self.input[start..self.pos].to_string();
                        self.bump();
                        return Ok(value);
                    }
                    self.bump();
                }
                Err(self.error("unterminated string"))
            }
            _ => self.ident(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId) {
        let mut tree = DomTree::new();
        let nav = tree.create_element("nav");
        if let Some(e) = tree.element_mut(nav) {
            e.set_attr("class", "horizontal-nav");
        }
        let strip = tree.create_element("div");
        if let Some(e) = tree.element_mut(strip) {
            e.set_attr("class", "nav-container");
        }
        let link = tree.create_element("a");
        if let Some(e) = tree.element_mut(link) {
            e.set_attr("class", "horizontal-nav-item active");
            e.set_attr("href", "#chinese");
        }
        tree.append_child(tree.root(), nav);
        tree.append_child(nav, strip);
        tree.append_child(strip, link);
        (tree, strip, link)
    }

    #[test]
    fn test_compound_and_attr() {
        let (tree, _, link) = sample();
        let sel = Selector::parse(r##"a.horizontal-nav-item[href^="#"]"##).unwrap();
        assert!(sel.matches(&tree, link));
        assert!(!Selector::parse("a[href$=menu]").unwrap().matches(&tree, link));
        assert!(Selector::parse("[href*=hin]").unwrap().matches(&tree, link));
    }

    #[test]
    fn test_descendant() {
        let (tree, strip, link) = sample();
        let sel = Selector::parse(".horizontal-nav .nav-container").unwrap();
        assert!(sel.matches(&tree, strip));
        assert!(!sel.matches(&tree, link));
        assert!(Selector::parse("nav a").unwrap().matches(&tree, link));
        assert!(!Selector::parse("main a").unwrap().matches(&tree, link));
    }

    #[test]
    fn test_list_and_query() {
        let (tree, strip, link) = sample();
        let list = SelectorList::parse(".nav-container, a.active").unwrap();
        assert_eq!(list.query_all(&tree, tree.root()), vec![strip, link]);
    }

    #[test]
    fn test_invalid() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("a[href").is_err());
        assert!(Selector::parse("a > b").is_err());
        assert!(Selector::parse("div.").is_err());
    }
}
