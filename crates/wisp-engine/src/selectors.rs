//! CSS Selectors for querySelector
//!
//! Supports type, universal, `#id`, `.class` and attribute selectors,
//! compounds of those, the descendant and child combinators, and selector
//! lists. Matching runs right to left from the candidate element.

use wisp_dom::{CompiledSelector, DomError, DomResult, DomTree, Namespace, NodeId, SelectorEngine};

/// The selector engine handed to `query_selector*`, `matches` and `closest`
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleSelectors;

impl SelectorEngine for SimpleSelectors {
    fn compile(&self, selectors: &str) -> DomResult<Box<dyn CompiledSelector>> {
        Ok(Box::new(SelectorList::parse(selectors)?))
    }
}

/// A component of a compound selector
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Universal selector *
    Universal,
    /// Type selector (tag name)
    Type(String),
    /// ID selector #id
    Id(String),
    /// Class selector .class
    Class(String),
    /// Attribute selector [attr], [attr=value], etc.
    Attribute(AttributeSelector),
}

/// Attribute selector
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSelector {
    pub name: String,
    pub matcher: Option<AttributeMatcher>,
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeMatcher {
    /// [attr=value] - exact match
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Includes(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value] - starts with
    Prefix(String),
    /// [attr$=value] - ends with
    Suffix(String),
    /// [attr*=value] - contains substring
    Substring(String),
}

impl AttributeSelector {
    /// Check if an attribute value matches
    pub fn matches(&self, value: Option<&str>) -> bool {
        let (Some(matcher), Some(value)) = (&self.matcher, value) else {
            return self.matcher.is_none() && value.is_some();
        };
        let fold = |s: &str| if self.case_insensitive { s.to_ascii_lowercase() } else { s.to_string() };
        let value = fold(value);
        match matcher {
            AttributeMatcher::Exact(expected) => value == fold(expected),
            AttributeMatcher::Includes(expected) => {
                let expected = fold(expected);
                !expected.is_empty() && value.split_ascii_whitespace().any(|w| w == expected)
            }
            AttributeMatcher::DashMatch(expected) => {
                let expected = fold(expected);
                value == expected || value.strip_prefix(expected.as_str()).is_some_and(|rest| rest.starts_with('-'))
            }
            // Empty operands never match for the substring family
            AttributeMatcher::Prefix(expected) => !expected.is_empty() && value.starts_with(&fold(expected)),
            AttributeMatcher::Suffix(expected) => !expected.is_empty() && value.ends_with(&fold(expected)),
            AttributeMatcher::Substring(expected) => !expected.is_empty() && value.contains(&fold(expected)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace
    Descendant,
    /// `>`
    Child,
}

/// Compound selectors joined by combinators, left to right
#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    compounds: Vec<Vec<SelectorComponent>>,
    /// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

/// Parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    /// Parse selector text; anything unsupported is a `Syntax` error
    pub fn parse(input: &str) -> DomResult<Self> {
        let mut parser = Parser { input, pos: 0 };
        let mut selectors = Vec::new();
        loop {
            parser.skip_whitespace();
            selectors.push(parser.complex()?);
            parser.skip_whitespace();
            match parser.bump() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(parser.error(&format!("unexpected {c:?}"))),
            }
        }
        Ok(Self { selectors })
    }

    /// Number of selectors in the list
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl CompiledSelector for SelectorList {
    fn matches(&self, tree: &DomTree, element: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(tree, element, s.compounds.len() - 1))
    }
}

impl ComplexSelector {
    fn matches(&self, tree: &DomTree, element: NodeId, index: usize) -> bool {
        if !self.compounds[index].iter().all(|c| matches_component(tree, element, c)) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => tree.parent_element(element).is_some_and(|p| self.matches(tree, p, index - 1)),
            Combinator::Descendant => tree
                .ancestors(element)
                .filter(|&a| tree.is_element(a))
                .any(|a| self.matches(tree, a, index - 1)),
        }
    }
}

fn matches_component(tree: &DomTree, element: NodeId, component: &SelectorComponent) -> bool {
    let Some(el) = tree.element(element) else {
        return false;
    };
    match component {
        SelectorComponent::Universal => true,
        SelectorComponent::Type(name) if el.namespace() == &Namespace::Html => el.local_name().eq_ignore_ascii_case(name),
        SelectorComponent::Type(name) => el.local_name() == name,
        SelectorComponent::Id(id) => el.id() == Some(id.as_str()),
        SelectorComponent::Class(class) => el.has_class(class),
        SelectorComponent::Attribute(attr) => attr.matches(tree.get_attribute(element, &attr.name)),
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Returns whether anything was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, message: &str) -> DomError {
        DomError::Syntax(format!("{message} at offset {} in selector {:?}", self.pos, self.input))
    }

    fn complex(&mut self) -> DomResult<ComplexSelector> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();
        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if spaced => Combinator::Descendant,
                Some(c) => return Err(self.error(&format!("unexpected {c:?}"))),
            };
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }
        Ok(ComplexSelector { compounds, combinators })
    }

    fn compound(&mut self) -> DomResult<Vec<SelectorComponent>> {
        let mut components = Vec::new();
        if self.eat('*') {
            components.push(SelectorComponent::Universal);
        } else if self.peek().is_some_and(is_ident_start) {
            components.push(SelectorComponent::Type(self.ident()?));
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    components.push(SelectorComponent::Id(self.ident()?));
                }
                Some('.') => {
                    self.pos += 1;
                    components.push(SelectorComponent::Class(self.ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    components.push(SelectorComponent::Attribute(self.attribute()?));
                }
                _ => break,
            }
        }
        if components.is_empty() {
            return Err(self.error("expected a selector"));
        }
        Ok(components)
    }

    fn ident(&mut self) -> DomResult<String> {
        let start = self.pos;
        if !self.peek().is_some_and(is_ident_start) {
            return Err(self.error("expected an identifier"));
        }
        while self.peek().is_some_and(is_ident_char) {
            self.bump();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// After `[`
    fn attribute(&mut self) -> DomResult<AttributeSelector> {
        self.skip_whitespace();
        let name = self.ident()?;
        self.skip_whitespace();

        let op = match self.bump() {
            Some(']') => return Ok(AttributeSelector { name, matcher: None, case_insensitive: false }),
            Some('=') => '=',
            Some(op @ ('~' | '|' | '^' | '$' | '*')) if self.eat('=') => op,
            _ => return Err(self.error("malformed attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                let len = self.input[start..].find(quote).ok_or_else(|| self.error("unterminated string"))?;
                self.pos += len + 1;
                self.input[start..start + len].to_string()
            }
            _ => self.ident()?,
        };
        self.skip_whitespace();
        let case_insensitive = self.eat('i') || self.eat('I');
        if !case_insensitive {
            let _ = self.eat('s') || self.eat('S');
        }
        self.skip_whitespace();
        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }

        let matcher = match op {
            '=' => AttributeMatcher::Exact(value),
            '~' => AttributeMatcher::Includes(value),
            '|' => AttributeMatcher::DashMatch(value),
            '^' => AttributeMatcher::Prefix(value),
            '$' => AttributeMatcher::Suffix(value),
            _ => AttributeMatcher::Substring(value),
        };
        Ok(AttributeSelector { name, matcher: Some(matcher), case_insensitive })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_html::HtmlParser;

    fn doc(html: &str) -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let doc = HtmlParser::default().parse_document(&mut tree, html, "about:blank").unwrap();
        (tree, doc)
    }

    fn ids(tree: &DomTree, root: NodeId, selector: &str) -> Vec<String> {
        tree.query_selector_all(&SimpleSelectors, root, selector)
            .unwrap()
            .to_vec(tree)
            .into_iter()
            .filter_map(|n| tree.get_attribute(n, "id").map(str::to_string))
            .collect()
    }

    #[test]
    fn test_parse_shapes() {
        assert_eq!(SelectorList::parse("div").unwrap().len(), 1);
        assert_eq!(SelectorList::parse("a, b ,c").unwrap().len(), 3);
        assert!(SelectorList::parse("div.a#b[c][d='e f']").is_ok());
        assert!(SelectorList::parse("ul > li a").is_ok());
        assert!(SelectorList::parse("*").is_ok());
    }

    #[test]
    fn test_syntax_errors() {
        for bad in ["", " ", "div,", ",div", "div >", "a:hover", "a + b", "[x", "[x=]", "#", ".1a", "[x='y]", "a ~ b"] {
            let err = SelectorList::parse(bad).unwrap_err();
            assert_eq!(err.exception_name(), Some("SyntaxError"), "{bad:?}");
        }
    }

    #[test]
    fn test_type_id_class() {
        let (tree, doc) = doc(r#"<div id="a" class="x y"></div><p id="b" class="y"></p><DIV id="c"></DIV>"#);
        assert_eq!(ids(&tree, doc, "div"), ["a", "c"]);
        assert_eq!(ids(&tree, doc, "DIV"), ["a", "c"]);
        assert_eq!(ids(&tree, doc, ".y"), ["a", "b"]);
        assert_eq!(ids(&tree, doc, "div.y"), ["a"]);
        assert_eq!(ids(&tree, doc, "#b"), ["b"]);
        assert_eq!(ids(&tree, doc, ".x.y"), ["a"]);
    }

    #[test]
    fn test_combinators() {
        let (tree, doc) = doc(r#"<ul id="u"><li id="l1"><a id="a1"></a></li><li id="l2"><span><a id="a2"></a></span></li></ul>"#);
        assert_eq!(ids(&tree, doc, "ul a"), ["a1", "a2"]);
        assert_eq!(ids(&tree, doc, "li > a"), ["a1"]);
        assert_eq!(ids(&tree, doc, "ul > li > a"), ["a1"]);
        assert_eq!(ids(&tree, doc, "ul > li a"), ["a1", "a2"]);
        assert!(ids(&tree, doc, "span > li").is_empty());
    }

    #[test]
    fn test_descendant_backtracks() {
        // The nearest `div` ancestor is not under `section`, a farther one is
        let (tree, doc) = doc(r#"<section><div><article><div><p id="p"></p></div></article></div></section>"#);
        assert_eq!(ids(&tree, doc, "section > div p"), ["p"]);
    }

    #[test]
    fn test_attribute_matchers() {
        let (tree, doc) = doc(
            r#"<i id="a" lang="en-US" rel="nofollow noopener" href="https://x.org/doc.pdf"></i><i id="b" lang="EN"></i>"#,
        );
        assert_eq!(ids(&tree, doc, "[lang]"), ["a", "b"]);
        assert_eq!(ids(&tree, doc, "[lang=EN]"), ["b"]);
        assert_eq!(ids(&tree, doc, "[lang=en i]"), ["b"]);
        assert_eq!(ids(&tree, doc, "[lang|=en]"), ["a"]);
        assert_eq!(ids(&tree, doc, "[rel~=noopener]"), ["a"]);
        assert_eq!(ids(&tree, doc, r#"[href^="https:"]"#), ["a"]);
        assert_eq!(ids(&tree, doc, "[href$='.pdf']"), ["a"]);
        assert_eq!(ids(&tree, doc, "[href*=x]"), ["a"]);
        assert!(ids(&tree, doc, "[href^='']").is_empty());
    }

    #[test]
    fn test_selector_list_in_tree_order() {
        let (tree, doc) = doc(r#"<p id="1"></p><div id="2"></div><p id="3"></p>"#);
        assert_eq!(ids(&tree, doc, "div, p"), ["1", "2", "3"]);
    }

    #[test]
    fn test_closest_and_matches() {
        let (tree, doc) = doc(r#"<div class="card"><p><b id="t"></b></p></div>"#);
        let b = tree.get_element_by_id(doc, "t").unwrap();
        let card = tree.closest(&SimpleSelectors, b, ".card").unwrap().unwrap();
        assert!(tree.matches(&SimpleSelectors, card, "div.card").unwrap());
        assert!(tree.matches(&SimpleSelectors, b, "div b").unwrap());
        assert!(!tree.matches(&SimpleSelectors, b, "div > b").unwrap());
    }
}
