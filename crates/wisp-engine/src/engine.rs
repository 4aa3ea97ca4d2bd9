//! Engine - Main entry point

use std::io::Read;

use url::Url;
use wisp_dom::{DomTree, Page};
use wisp_html::{DomParser, HtmlParser};

use crate::{Config, EngineResult};

/// The Wisp page factory
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    parser: HtmlParser,
}

impl Engine {
    /// Create a new engine with the given configuration
    pub fn new(config: Config) -> Self {
        tracing::info!(version = crate::VERSION, max_nodes = config.max_nodes, "Wisp engine initialized");
        let parser = HtmlParser::new(config.parser_options());
        Self { config, parser }
    }

    /// Get engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn user_agent(&self) -> &str {
        &self.config.user_agent
    }

    /// Empty page at the configured default URL
    pub fn new_page(&self) -> EngineResult<Page> {
        let url = normalize_url(&self.config.default_url)?;
        Ok(Page::new(self.config.limits(), &url)?)
    }

    /// Parse `html` into a fresh page whose document has `url`
    pub fn load_html(&self, html: &str, url: &str) -> EngineResult<Page> {
        let url = normalize_url(url)?;
        tracing::info!(url = %url, "loading document");
        let mut tree = DomTree::with_limits(self.config.limits());
        let document = self.parser.parse_document(&mut tree, html, &url)?;
        Ok(Page::from_tree(tree, document))
    }

    /// Like [`Engine::load_html`], reading UTF-8 from `reader`
    pub fn load_reader<R: Read>(&self, reader: &mut R, url: &str) -> EngineResult<Page> {
        let url = normalize_url(url)?;
        tracing::info!(url = %url, "loading document from reader");
        let mut tree = DomTree::with_limits(self.config.limits());
        let document = self.parser.parse_reader(&mut tree, reader, &url)?;
        Ok(Page::from_tree(tree, document))
    }

    /// Parser for `innerHTML` and fragment work on this engine's pages
    pub fn html_parser(&self) -> &HtmlParser {
        &self.parser
    }

    /// `new DOMParser()` for a page at `url`
    pub fn dom_parser(&self, url: &str) -> EngineResult<DomParser> {
        Ok(DomParser::new(&normalize_url(url)?))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn normalize_url(url: &str) -> EngineResult<String> {
    Ok(Url::parse(url)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;

    #[test]
    fn test_new_page() {
        let engine = Engine::default();
        let page = engine.new_page().unwrap();
        assert_eq!(page.dom.document_url(page.document()), Some("about:blank"));
        assert!(engine.user_agent().starts_with("Wisp/"));
    }

    #[test]
    fn test_load_html_normalizes_url() {
        let engine = Engine::default();
        let page = engine.load_html("<title>x</title>", "HTTPS://Example.com").unwrap();
        assert_eq!(page.dom.document_url(page.document()), Some("https://example.com/"));
        assert_eq!(page.dom.title(page.document()), "x");
    }

    #[test]
    fn test_invalid_url() {
        let err = Engine::default().load_html("", "not a url").unwrap_err();
        assert!(matches!(err, EngineError::Url(_)));
    }

    #[test]
    fn test_node_limit_from_config() {
        let engine = Engine::new(Config { max_nodes: 3, ..Default::default() });
        let err = engine.load_html("<p>x</p>", "about:blank").unwrap_err();
        match err {
            EngineError::Html(e) => assert_eq!(e.exception_name(), None),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_drop_whitespace_config() {
        let engine = Engine::new(Config { drop_whitespace_text: true, ..Default::default() });
        let page = engine.load_html("<ul>\n <li>a</li>\n</ul>", "about:blank").unwrap();
        let ul = page.dom.get_elements_by_tag_name(page.document(), "ul").item(&page.dom, 0).unwrap();
        assert_eq!(page.dom.child_count(ul), 1);
    }
}
