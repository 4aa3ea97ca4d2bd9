//! Incremental document parsing
//!
//! Bytes arrive in arbitrary chunks, possibly splitting UTF-8 sequences.
//! The tokenizer runs as each chunk is fed; the node graph is populated
//! once the input is finished.

use html5ever::driver::Parser;
use html5ever::parse_document;
use html5ever::tendril::stream::Utf8LossyDecoder;
use html5ever::tendril::{ByteTendril, TendrilSink};
use markup5ever_rcdom::RcDom;
use wisp_dom::{DomTree, NodeId};

use crate::{HtmlParser, HtmlResult, ParserOptions};

/// Chunked HTML document parser
pub struct StreamingParser {
    decoder: Utf8LossyDecoder<Parser<RcDom>>,
    parser: HtmlParser,
    url: String,
    fed: usize,
}

impl StreamingParser {
    pub fn new(options: ParserOptions, url: &str) -> Self {
        let decoder = parse_document(RcDom::default(), options.parse_opts()).from_utf8();
        Self { decoder, parser: HtmlParser::new(options), url: url.to_string(), fed: 0 }
    }

    /// Feed the next chunk of input; empty chunks are ignored
    pub fn feed(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.fed += bytes.len();
        tracing::trace!(chunk = bytes.len(), total = self.fed, "feeding HTML chunk");
        self.decoder.process(ByteTendril::from_slice(bytes));
    }

    /// Bytes fed so far
    #[inline]
    pub fn bytes_fed(&self) -> usize {
        self.fed
    }

    /// End of input: build the document into `tree`
    pub fn finish(self, tree: &mut DomTree) -> HtmlResult<NodeId> {
        let dom = self.decoder.finish();
        tracing::debug!(url = %self.url, bytes = self.fed, "finished streaming parse");
        self.parser.build_document(tree, &dom, &self.url)
    }
}

impl std::fmt::Debug for StreamingParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingParser")
            .field("url", &self.url)
            .field("fed", &self.fed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_match_single_parse() {
        let html = "<!DOCTYPE html><title>t</title><ul><li>one<li>two</ul>";
        let mut streaming = StreamingParser::new(ParserOptions::default(), "about:blank");
        for chunk in html.as_bytes().chunks(5) {
            streaming.feed(chunk);
        }
        assert_eq!(streaming.bytes_fed(), html.len());

        let mut tree = DomTree::new();
        let doc = streaming.finish(&mut tree).unwrap();
        assert_eq!(tree.title(doc), "t");
        assert_eq!(tree.get_elements_by_tag_name(doc, "li").len(&tree), 2);
    }

    #[test]
    fn test_split_utf8_sequence() {
        let bytes = "<p>日本</p>".as_bytes();
        let mut streaming = StreamingParser::new(ParserOptions::default(), "about:blank");
        // Split in the middle of the first multi-byte character
        streaming.feed(&bytes[..4]);
        streaming.feed(&bytes[4..]);
        let mut tree = DomTree::new();
        let doc = streaming.finish(&mut tree).unwrap();
        assert_eq!(tree.text_content(tree.body(doc).unwrap()).as_deref(), Some("日本"));
    }

    #[test]
    fn test_empty_input() {
        let mut streaming = StreamingParser::new(ParserOptions::default(), "about:blank");
        streaming.feed(b"");
        let mut tree = DomTree::new();
        let doc = streaming.finish(&mut tree).unwrap();
        assert!(tree.body(doc).is_some());
    }
}
