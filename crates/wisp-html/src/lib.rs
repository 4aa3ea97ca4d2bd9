//! Wisp HTML - html5ever bridge
//!
//! Parses HTML documents and fragments into a [`wisp_dom::DomTree`] through
//! its public factories and mutation primitives, and serializes subtrees back
//! to markup for `innerHTML`/`outerHTML`.

mod dom_parser;
mod error;
mod parser;
mod serializer;
mod streaming;

pub use dom_parser::{DomParser, SupportedType};
pub use error::{HtmlError, HtmlResult};
pub use parser::{HtmlParser, ParserOptions};
pub use serializer::{inner_html, outer_html};
pub use streaming::StreamingParser;

use wisp_dom::{DomTree, NodeId};

/// Parse an HTML document into `tree` with default options
pub fn parse(tree: &mut DomTree, html: &str) -> HtmlResult<NodeId> {
    HtmlParser::default().parse_document(tree, html, "about:blank")
}
