//! Markup output for `innerHTML` and `outerHTML`
//!
//! Writes the node graph back out as HTML. Template elements contribute
//! their contents fragment, children of raw-text elements are copied
//! verbatim, and the walk keeps its own stack so deep trees are safe.

use wisp_dom::{DomTree, ElementData, Namespace, NodeData, NodeId};

/// `innerHTML` getter
pub fn inner_html(tree: &DomTree, node: NodeId) -> String {
    let mut markup = Markup::new(tree);
    markup.queue_children(node);
    markup.finish()
}

/// `outerHTML` getter
pub fn outer_html(tree: &DomTree, node: NodeId) -> String {
    let mut markup = Markup::new(tree);
    markup.pending.push(Pending::Node(node));
    markup.finish()
}

enum Pending {
    Node(NodeId),
    EndTag(String),
}

struct Markup<'a> {
    tree: &'a DomTree,
    pending: Vec<Pending>,
    out: String,
}

impl<'a> Markup<'a> {
    fn new(tree: &'a DomTree) -> Self {
        Self { tree, pending: Vec::new(), out: String::new() }
    }

    /// Children of `parent`, queued so the first is written first
    fn queue_children(&mut self, parent: NodeId) {
        let start = self.pending.len();
        self.pending.extend(self.tree.children(parent).map(Pending::Node));
        self.pending[start..].reverse();
    }

    fn finish(mut self) -> String {
        while let Some(next) = self.pending.pop() {
            match next {
                Pending::Node(id) => self.write_node(id),
                Pending::EndTag(name) => self.end_tag(&name),
            }
        }
        self.out
    }

    fn write_node(&mut self, id: NodeId) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else {
            return;
        };
        match node.data() {
            NodeData::Document(_) | NodeData::DocumentFragment | NodeData::ShadowRoot(_) => {
                self.queue_children(id);
            }
            NodeData::Element(el) => self.write_element(id, el),
            NodeData::Text(text) => push_escaped(&mut self.out, text, false),
            NodeData::Comment(text) => {
                self.out.push_str("<!--");
                self.out.push_str(text);
                self.out.push_str("-->");
            }
            NodeData::DocumentType { name, .. } => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(name);
                self.out.push('>');
            }
            NodeData::ProcessingInstruction { target, data } => {
                self.out.push_str("<?");
                self.out.push_str(target);
                if !data.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(data);
                }
                self.out.push('>');
            }
        }
    }

    fn write_element(&mut self, id: NodeId, el: &ElementData) {
        let html = el.namespace() == &Namespace::Html;
        let name = if html { el.local_name().to_string() } else { el.qualified_name() };

        self.out.push('<');
        self.out.push_str(&name);
        for attr in el.attributes() {
            self.out.push(' ');
            self.out.push_str(&attr.name);
            self.out.push_str("=\"");
            push_escaped(&mut self.out, &attr.value, true);
            self.out.push('"');
        }
        self.out.push('>');

        if html && is_void(el.local_name()) {
            return;
        }
        if html && is_raw_text(el.local_name()) {
            for child in self.tree.children(id) {
                if let Some(NodeData::Text(text)) = self.tree.get(child).map(|n| n.data()) {
                    self.out.push_str(text);
                }
            }
            self.end_tag(&name);
            return;
        }

        self.pending.push(Pending::EndTag(name));
        self.queue_children(el.template_contents().unwrap_or(id));
    }

    fn end_tag(&mut self, name: &str) {
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }
}

/// Elements written without an end tag or children
fn is_void(local_name: &str) -> bool {
    matches!(
        local_name,
        "area" | "base" | "basefont" | "bgsound" | "br" | "col" | "embed" | "frame" | "hr"
            | "img" | "input" | "keygen" | "link" | "meta" | "param" | "source" | "track" | "wbr"
    )
}

/// Elements whose text children are not escaped
fn is_raw_text(local_name: &str) -> bool {
    matches!(
        local_name,
        "style" | "script" | "xmp" | "iframe" | "noembed" | "noframes" | "plaintext" | "noscript"
    )
}

fn push_escaped(out: &mut String, text: &str, in_attribute: bool) {
    for c in text.chars() {
        let entity = match c {
            '&' => "&amp;",
            '\u{a0}' => "&nbsp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' if in_attribute => "&quot;",
            _ => {
                out.push(c);
                continue;
            }
        };
        out.push_str(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HtmlParser;

    fn body_of(html: &str) -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let doc = HtmlParser::default().parse_document(&mut tree, html, "about:blank").unwrap();
        let body = tree.body(doc).unwrap();
        (tree, body)
    }

    #[test]
    fn test_text_vs_attribute_escaping() {
        let mut text = String::new();
        push_escaped(&mut text, "1 < 2 & \"q\"\u{a0}", false);
        assert_eq!(text, "1 &lt; 2 &amp; \"q\"&nbsp;");

        let mut attr = String::new();
        push_escaped(&mut attr, "1 < 2 & \"q\"", true);
        assert_eq!(attr, "1 &lt; 2 &amp; &quot;q&quot;");
    }

    #[test]
    fn test_void_elements() {
        let (tree, body) = body_of(r#"<p>a<br>b<img src="x.png"></p>"#);
        assert_eq!(inner_html(&tree, body), r#"<p>a<br>b<img src="x.png"></p>"#);
    }

    #[test]
    fn test_raw_text_not_escaped() {
        let (tree, body) = body_of("<script>if (a < b) {}</script><p>a &lt; b</p>");
        assert_eq!(inner_html(&tree, body), "<script>if (a < b) {}</script><p>a &lt; b</p>");
    }

    #[test]
    fn test_outer_html_and_attributes() {
        let (tree, body) = body_of(r#"<div id="x" hidden title="a&quot;b">t</div>"#);
        let div = tree.first_child(body).unwrap();
        assert_eq!(outer_html(&tree, div), r#"<div id="x" hidden="" title="a&quot;b">t</div>"#);
    }

    #[test]
    fn test_template_and_comment() {
        let (tree, body) = body_of("<template><b>x</b></template><!--c-->");
        assert_eq!(inner_html(&tree, body), "<template><b>x</b></template><!--c-->");
    }

    #[test]
    fn test_nested_end_tags_in_order() {
        let (tree, body) = body_of("<ul><li>a</li><li><em>b</em>c</li></ul><p>d</p>");
        assert_eq!(inner_html(&tree, body), "<ul><li>a</li><li><em>b</em>c</li></ul><p>d</p>");
    }

    #[test]
    fn test_document_serialization() {
        let mut tree = DomTree::new();
        let doc = HtmlParser::default()
            .parse_document(&mut tree, "<!DOCTYPE html><title>t</title>", "about:blank")
            .unwrap();
        assert_eq!(
            outer_html(&tree, doc),
            "<!DOCTYPE html><html><head><title>t</title></head><body></body></html>"
        );
    }
}
