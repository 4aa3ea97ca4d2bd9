//! Element Data
//!
//! Tag interning, namespaces, attributes and name validation.

use crate::{DomError, DomResult, NodeId};

macro_rules! html_tags {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// Well-known HTML tag
        ///
        /// Elements keep their full local name as well; the tag only makes
        /// common comparisons cheap.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Tag {
            $($variant,)*
            /// Any other local name
            Other,
        }

        impl Tag {
            /// Look up a lowercase local name
            pub fn from_local_name(name: &str) -> Self {
                match name {
                    $($name => Self::$variant,)*
                    _ => Self::Other,
                }
            }

            /// Canonical lowercase name, `None` for [`Tag::Other`]
            pub fn as_str(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($name),)*
                    Self::Other => None,
                }
            }
        }
    };
}

html_tags! {
    A => "a",
    Article => "article",
    Aside => "aside",
    Audio => "audio",
    B => "b",
    Blockquote => "blockquote",
    Body => "body",
    Br => "br",
    Button => "button",
    Canvas => "canvas",
    Code => "code",
    Div => "div",
    Em => "em",
    Footer => "footer",
    Form => "form",
    H1 => "h1",
    H2 => "h2",
    H3 => "h3",
    H4 => "h4",
    H5 => "h5",
    H6 => "h6",
    Head => "head",
    Header => "header",
    Hr => "hr",
    Html => "html",
    I => "i",
    Iframe => "iframe",
    Img => "img",
    Input => "input",
    Label => "label",
    Li => "li",
    Link => "link",
    Main => "main",
    Meta => "meta",
    Nav => "nav",
    Ol => "ol",
    OptionTag => "option",
    P => "p",
    Pre => "pre",
    Script => "script",
    Section => "section",
    Select => "select",
    Slot => "slot",
    Span => "span",
    Strong => "strong",
    Style => "style",
    Table => "table",
    Tbody => "tbody",
    Td => "td",
    Template => "template",
    Textarea => "textarea",
    Th => "th",
    Thead => "thead",
    Title => "title",
    Tr => "tr",
    Ul => "ul",
    Video => "video",
}

/// Element namespace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    /// No namespace
    #[default]
    None,
    Html,
    Svg,
    MathMl,
    Xml,
    Xmlns,
    XLink,
    Other(String),
}

impl Namespace {
    pub const HTML_URI: &'static str = "http://www.w3.org/1999/xhtml";
    pub const SVG_URI: &'static str = "http://www.w3.org/2000/svg";
    pub const MATHML_URI: &'static str = "http://www.w3.org/1998/Math/MathML";
    pub const XML_URI: &'static str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS_URI: &'static str = "http://www.w3.org/2000/xmlns/";
    pub const XLINK_URI: &'static str = "http://www.w3.org/1999/xlink";

    /// Namespace for a URI; the empty string is no namespace
    pub fn from_uri(uri: &str) -> Self {
        match uri {
            "" => Self::None,
            Self::HTML_URI => Self::Html,
            Self::SVG_URI => Self::Svg,
            Self::MATHML_URI => Self::MathMl,
            Self::XML_URI => Self::Xml,
            Self::XMLNS_URI => Self::Xmlns,
            Self::XLINK_URI => Self::XLink,
            other => Self::Other(other.to_string()),
        }
    }

    /// URI, `None` for no namespace
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Html => Some(Self::HTML_URI),
            Self::Svg => Some(Self::SVG_URI),
            Self::MathMl => Some(Self::MATHML_URI),
            Self::Xml => Some(Self::XML_URI),
            Self::Xmlns => Some(Self::XMLNS_URI),
            Self::XLink => Some(Self::XLINK_URI),
            Self::Other(uri) => Some(uri),
        }
    }
}

/// Element attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name (`prefix:local` or `local`)
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// Element-specific data
#[derive(Debug, Clone)]
pub struct ElementData {
    pub(crate) tag: Tag,
    pub(crate) local_name: String,
    pub(crate) prefix: Option<String>,
    pub(crate) namespace: Namespace,
    pub(crate) attrs: Vec<Attribute>,
    pub(crate) shadow_root: Option<NodeId>,
    pub(crate) template_contents: Option<NodeId>,
}

impl ElementData {
    pub(crate) fn new(namespace: Namespace, prefix: Option<String>, local_name: String) -> Self {
        let tag = if namespace == Namespace::Html {
            Tag::from_local_name(&local_name)
        } else {
            Tag::Other
        };
        Self {
            tag,
            local_name,
            prefix,
            namespace,
            attrs: Vec::new(),
            shadow_root: None,
            template_contents: None,
        }
    }

    /// Interned tag, [`Tag::Other`] outside the HTML namespace
    #[inline]
    pub fn tag(&self) -> Tag {
        self.tag
    }

    #[inline]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    #[inline]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    #[inline]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Whether this is an HTML element with the given tag
    #[inline]
    pub fn is(&self, tag: Tag) -> bool {
        self.tag == tag && tag != Tag::Other
    }

    /// `prefix:local` or `local`
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// `tagName`: uppercased for HTML elements
    pub fn tag_name(&self) -> String {
        let name = self.qualified_name();
        if self.namespace == Namespace::Html {
            name.to_ascii_uppercase()
        } else {
            name
        }
    }

    /// Get attribute value by qualified name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// All attributes in insertion order
    #[inline]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attrs
    }

    /// `id` attribute
    #[inline]
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Whitespace-separated `class` tokens
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class")
            .unwrap_or("")
            .split(|c: char| c.is_ascii_whitespace())
            .filter(|s| !s.is_empty())
    }

    /// Check if element has a class
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Attached shadow root, regardless of mode
    #[inline]
    pub fn shadow_root(&self) -> Option<NodeId> {
        self.shadow_root
    }

    /// Content fragment of a `<template>`
    #[inline]
    pub fn template_contents(&self) -> Option<NodeId> {
        self.template_contents
    }

    /// Set an attribute, returning the previous value
    pub(crate) fn set_attr(&mut self, name: &str, value: &str) -> Option<String> {
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => Some(std::mem::replace(&mut attr.value, value.to_string())),
            None => {
                self.attrs.push(Attribute::new(name, value));
                None
            }
        }
    }

    /// Remove an attribute, returning its value
    pub(crate) fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(pos).value)
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c) || c.is_ascii_digit() || c == '-' || c == '.'
}

/// Validate an element, attribute or processing-instruction name
pub fn validate_name(name: &str) -> DomResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => is_name_start_char(first) && chars.all(is_name_char),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DomError::InvalidCharacter(name.to_string()))
    }
}

/// Split and validate a qualified name into `(prefix, local)`
pub fn validate_qualified_name(name: &str) -> DomResult<(Option<&str>, &str)> {
    validate_name(name)?;
    match name.split_once(':') {
        Some((prefix, local)) if prefix.is_empty() || local.is_empty() || local.contains(':') => {
            Err(DomError::InvalidCharacter(name.to_string()))
        }
        Some((prefix, local)) => Ok((Some(prefix), local)),
        None => Ok((None, name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_lookup() {
        assert_eq!(Tag::from_local_name("div"), Tag::Div);
        assert_eq!(Tag::from_local_name("option"), Tag::OptionTag);
        assert_eq!(Tag::from_local_name("x-widget"), Tag::Other);
        assert_eq!(Tag::Span.as_str(), Some("span"));
    }

    #[test]
    fn test_namespace_round_trip() {
        let ns = Namespace::from_uri(Namespace::SVG_URI);
        assert_eq!(ns, Namespace::Svg);
        assert_eq!(ns.uri(), Some(Namespace::SVG_URI));
        assert_eq!(Namespace::from_uri("").uri(), None);
    }

    #[test]
    fn test_attributes() {
        let mut el = ElementData::new(Namespace::Html, None, "div".into());
        assert_eq!(el.set_attr("class", "a  b"), None);
        assert_eq!(el.set_attr("id", "main"), None);
        assert_eq!(el.set_attr("id", "other"), Some("main".into()));
        assert_eq!(el.id(), Some("other"));
        assert!(el.has_class("b"));
        assert_eq!(el.classes().count(), 2);
        assert_eq!(el.remove_attr("id"), Some("other".into()));
        assert_eq!(el.id(), None);
    }

    #[test]
    fn test_tag_name_case() {
        let html = ElementData::new(Namespace::Html, None, "div".into());
        assert_eq!(html.tag_name(), "DIV");
        let svg = ElementData::new(Namespace::Svg, None, "foreignObject".into());
        assert_eq!(svg.tag_name(), "foreignObject");
        assert_eq!(svg.tag(), Tag::Other);
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("div").is_ok());
        assert!(validate_name("x-foo.bar_1").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("1abc").is_err());
        assert!(validate_name("a b").is_err());
        assert!(validate_name("a<b").is_err());
    }

    #[test]
    fn test_validate_qualified_name() {
        assert_eq!(validate_qualified_name("svg:rect").unwrap(), (Some("svg"), "rect"));
        assert_eq!(validate_qualified_name("rect").unwrap(), (None, "rect"));
        assert!(validate_qualified_name(":rect").is_err());
        assert!(validate_qualified_name("a:b:c").is_err());
    }
}
