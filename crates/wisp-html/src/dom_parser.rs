//! `DOMParser`

use std::str::FromStr;

use wisp_dom::{DomError, DomTree, NodeId};

use crate::{HtmlParser, HtmlResult, ParserOptions};

/// MIME types `parseFromString` recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedType {
    TextHtml,
    TextXml,
    ApplicationXml,
    ApplicationXhtmlXml,
    ImageSvgXml,
}

impl SupportedType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextHtml => "text/html",
            Self::TextXml => "text/xml",
            Self::ApplicationXml => "application/xml",
            Self::ApplicationXhtmlXml => "application/xhtml+xml",
            Self::ImageSvgXml => "image/svg+xml",
        }
    }

    #[inline]
    pub fn is_xml(self) -> bool {
        self != Self::TextHtml
    }
}

impl FromStr for SupportedType {
    type Err = DomError;

    fn from_str(mime: &str) -> Result<Self, Self::Err> {
        Ok(match mime {
            "text/html" => Self::TextHtml,
            "text/xml" => Self::TextXml,
            "application/xml" => Self::ApplicationXml,
            "application/xhtml+xml" => Self::ApplicationXhtmlXml,
            "image/svg+xml" => Self::ImageSvgXml,
            other => return Err(DomError::NotSupported(format!("unknown MIME type {other:?}"))),
        })
    }
}

/// Parses markup into a new document of the tree
#[derive(Debug, Clone)]
pub struct DomParser {
    parser: HtmlParser,
    url: String,
}

impl Default for DomParser {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

impl DomParser {
    /// Documents created by the parser carry `url` and never run scripts
    pub fn new(url: &str) -> Self {
        let options = ParserOptions { scripting_enabled: false, ..Default::default() };
        Self { parser: HtmlParser::new(options), url: url.to_string() }
    }

    /// `parseFromString`: only `text/html` produces a document
    pub fn parse_from_string(&self, tree: &mut DomTree, source: &str, mime: &str) -> HtmlResult<NodeId> {
        let ty: SupportedType = mime.parse()?;
        if ty.is_xml() {
            tracing::debug!(mime = ty.as_str(), "XML parsing requested");
            return Err(DomError::NotSupported(format!("{} documents are not supported", ty.as_str())).into());
        }
        self.parser.parse_document(tree, source, &self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_document() {
        let mut tree = DomTree::new();
        let doc = DomParser::default().parse_from_string(&mut tree, "<p id=a>x</p>", "text/html").unwrap();
        assert!(tree.get_element_by_id(doc, "a").is_some());
        assert_eq!(tree.document_url(doc), Some("about:blank"));
    }

    #[test]
    fn test_xml_types_rejected() {
        let mut tree = DomTree::new();
        for mime in ["text/xml", "application/xml", "application/xhtml+xml", "image/svg+xml"] {
            let err = DomParser::default().parse_from_string(&mut tree, "<a/>", mime).unwrap_err();
            assert_eq!(err.exception_name(), Some("NotSupportedError"));
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut tree = DomTree::new();
        let err = DomParser::default().parse_from_string(&mut tree, "x", "text/plain").unwrap_err();
        assert_eq!(err.exception_name(), Some("NotSupportedError"));
    }

    #[test]
    fn test_noscript_parsed_as_markup() {
        let mut tree = DomTree::new();
        let doc = DomParser::default()
            .parse_from_string(&mut tree, "<noscript><b>x</b></noscript>", "text/html")
            .unwrap();
        assert_eq!(tree.get_elements_by_tag_name(doc, "b").len(&tree), 1);
    }
}
