//! HTML5 parser bridge
//!
//! html5ever builds an `RcDom`, which is then copied into the node graph
//! through the same factories and `append_child` calls a script would use.
//! The copy walks an explicit stack so arbitrarily deep markup never
//! recurses.

use std::io::Read;

use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::{QuirksMode as TreeQuirksMode, TreeBuilderOpts};
use html5ever::{LocalName, ParseOpts, QualName, local_name, ns, parse_document, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use wisp_dom::{Attribute, DocumentKind, DomError, DomResult, DomTree, ElementData, Namespace, NodeId, QuirksMode};

use crate::HtmlResult;

/// Tree-builder knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Parse `<noscript>` as raw text, as a browser with scripting does
    pub scripting_enabled: bool,
    /// Skip text nodes made only of whitespace, outside `<pre>` and friends
    pub drop_whitespace_text: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { scripting_enabled: true, drop_whitespace_text: false }
    }
}

impl ParserOptions {
    pub(crate) fn parse_opts(&self) -> ParseOpts {
        ParseOpts {
            tree_builder: TreeBuilderOpts {
                scripting_enabled: self.scripting_enabled,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// HTML5 parser
#[derive(Debug, Clone, Default)]
pub struct HtmlParser {
    options: ParserOptions,
}

impl HtmlParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Parse a complete document into a new document node of `tree`
    pub fn parse_document(&self, tree: &mut DomTree, html: &str, url: &str) -> HtmlResult<NodeId> {
        tracing::debug!(url, bytes = html.len(), "parsing HTML document");
        let dom = parse_document(RcDom::default(), self.options.parse_opts()).one(html);
        self.build_document(tree, &dom, url)
    }

    /// Parse UTF-8 bytes from a reader; invalid sequences become U+FFFD
    pub fn parse_reader<R: Read>(&self, tree: &mut DomTree, reader: &mut R, url: &str) -> HtmlResult<NodeId> {
        tracing::debug!(url, "parsing HTML document from reader");
        let dom = parse_document(RcDom::default(), self.options.parse_opts())
            .from_utf8()
            .read_from(reader)?;
        self.build_document(tree, &dom, url)
    }

    pub(crate) fn build_document(&self, tree: &mut DomTree, dom: &RcDom, url: &str) -> HtmlResult<NodeId> {
        let doc = tree.create_document(DocumentKind::Html, url)?;
        tree.set_quirks_mode(doc, quirks_mode(dom.quirks_mode.get()));

        let before = tree.len();
        Converter::new(tree, doc, self.options).convert_children(&dom.document, doc)?;

        let errors = dom.errors.borrow().len();
        tracing::debug!(url, nodes = tree.len() - before, errors, "parsed HTML document");
        Ok(doc)
    }

    /// Parse `html` in the context of `context` into a new, unattached
    /// document fragment. Non-element contexts parse as if inside `<body>`.
    pub fn parse_fragment(&self, tree: &mut DomTree, context: NodeId, html: &str) -> HtmlResult<NodeId> {
        let doc = tree.get(context).ok_or(DomError::NotFound("fragment context"))?.owner_document();
        let context_name = match tree.element(context) {
            Some(el) => QualName::new(
                None,
                el.namespace().uri().unwrap_or("").into(),
                LocalName::from(el.local_name()),
            ),
            None => QualName::new(None, ns!(html), local_name!("body")),
        };

        let dom = parse_fragment(
            RcDom::default(),
            self.options.parse_opts(),
            context_name,
            Vec::new(),
            self.options.scripting_enabled,
        )
        .one(html);

        let fragment = tree.create_document_fragment(doc)?;
        // Fragment parsing roots its output under a synthetic `html` element
        let root = dom.document.children.borrow().first().cloned();
        if let Some(root) = root {
            Converter::new(tree, doc, self.options).convert_children(&root, fragment)?;
        }
        tracing::debug!(context = %context, errors = dom.errors.borrow().len(), "parsed HTML fragment");
        Ok(fragment)
    }

    /// `innerHTML` setter: replace the children of `element` (or of its
    /// template contents) with the parsed fragment
    pub fn set_inner_html(&self, tree: &mut DomTree, element: NodeId, html: &str) -> HtmlResult<()> {
        let fragment = self.parse_fragment(tree, element, html)?;
        let target = tree.element(element).and_then(ElementData::template_contents).unwrap_or(element);
        tree.replace_all(target, Some(fragment))?;
        Ok(())
    }
}

fn quirks_mode(mode: TreeQuirksMode) -> QuirksMode {
    match mode {
        TreeQuirksMode::Quirks => QuirksMode::Quirks,
        TreeQuirksMode::LimitedQuirks => QuirksMode::LimitedQuirks,
        TreeQuirksMode::NoQuirks => QuirksMode::NoQuirks,
    }
}

fn qualified_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", &**prefix, &*name.local),
        None => name.local.to_string(),
    }
}

/// Copies an `RcDom` subtree into the node graph
pub(crate) struct Converter<'a> {
    tree: &'a mut DomTree,
    doc: NodeId,
    drop_whitespace_text: bool,
}

impl<'a> Converter<'a> {
    pub(crate) fn new(tree: &'a mut DomTree, doc: NodeId, options: ParserOptions) -> Self {
        Self { tree, doc, drop_whitespace_text: options.drop_whitespace_text }
    }

    /// Append copies of the children of `from` to `into`, in order
    pub(crate) fn convert_children(&mut self, from: &Handle, into: NodeId) -> DomResult<()> {
        let mut stack: Vec<(Handle, NodeId)> =
            from.children.borrow().iter().rev().map(|c| (c.clone(), into)).collect();

        while let Some((handle, parent)) = stack.pop() {
            let Some(id) = self.create(&handle, parent)? else {
                continue;
            };
            self.tree.append_child(parent, id)?;

            if let RcNodeData::Element { template_contents, .. } = &handle.data {
                let contents = template_contents.borrow();
                let fragment = self.tree.element(id).and_then(ElementData::template_contents);
                if let (Some(contents), Some(fragment)) = (contents.as_ref(), fragment) {
                    stack.extend(contents.children.borrow().iter().rev().map(|c| (c.clone(), fragment)));
                }
            }
            stack.extend(handle.children.borrow().iter().rev().map(|c| (c.clone(), id)));
        }
        Ok(())
    }

    fn create(&mut self, handle: &Handle, parent: NodeId) -> DomResult<Option<NodeId>> {
        let doc = self.doc;
        let id = match &handle.data {
            RcNodeData::Document => return Ok(None),
            RcNodeData::Doctype { name, public_id, system_id } => {
                self.tree.create_document_type(doc, name, public_id, system_id)?
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                if self.drop_whitespace_text && text.trim().is_empty() && !self.keeps_whitespace(parent) {
                    return Ok(None);
                }
                self.tree.create_text_node(doc, &text)?
            }
            RcNodeData::Comment { contents } => self.tree.create_comment(doc, contents)?,
            RcNodeData::Element { name, attrs, .. } => {
                let attrs = attrs
                    .borrow()
                    .iter()
                    .map(|a| Attribute::new(qualified_name(&a.name), a.value.to_string()))
                    .collect();
                self.tree.create_parsed_element(
                    doc,
                    Namespace::from_uri(&name.ns),
                    name.prefix.as_ref().map(|p| p.to_string()),
                    name.local.to_string(),
                    attrs,
                )?
            }
            RcNodeData::ProcessingInstruction { target, contents } => {
                self.tree.create_processing_instruction(doc, target, contents)?
            }
        };
        Ok(Some(id))
    }

    fn keeps_whitespace(&self, parent: NodeId) -> bool {
        self.tree
            .element(parent)
            .is_some_and(|e| matches!(e.local_name(), "pre" | "textarea" | "listing" | "script" | "style"))
    }
}
