//! Comprehensive tests for wisp-html
//!
//! Parsed trees behave like script-built ones: collections stay live,
//! the id index answers, events dispatch and serialization round-trips.

use std::cell::RefCell;
use std::rc::Rc;

use wisp_dom::{DomTree, Event, EventInit, ListenerOptions, Page, listener};
use wisp_html::{HtmlParser, StreamingParser, inner_html, outer_html, parse};

// ============================================================================
// Parsing into the node graph
// ============================================================================

#[test]
fn test_live_collection_over_parsed_tree() {
    let mut tree = DomTree::new();
    let doc = parse(&mut tree, r#"<div id="a"><span>x</span></div>"#).unwrap();
    let spans = tree.get_elements_by_tag_name(doc, "span");
    assert_eq!(spans.len(&tree), 1);

    let a = tree.get_element_by_id(doc, "a").unwrap();
    let span = tree.first_child(a).unwrap();
    tree.remove_child(a, span).unwrap();
    assert_eq!(spans.len(&tree), 0);
}

#[test]
fn test_parse_nested_structure() {
    let html = r#"
        <html>
            <head>
                <title>Test Page</title>
                <meta charset="utf-8">
            </head>
            <body>
                <div id="container">
                    <h1>Welcome</h1>
                    <p class="intro">This is a test.</p>
                    <ul>
                        <li>Item 1</li>
                        <li>Item 2</li>
                        <li>Item 3</li>
                    </ul>
                </div>
            </body>
        </html>
    "#;
    let mut tree = DomTree::new();
    let doc = parse(&mut tree, html).unwrap();
    assert_eq!(tree.title(doc), "Test Page");
    assert_eq!(tree.get_elements_by_tag_name(doc, "li").len(&tree), 3);
    assert_eq!(tree.get_elements_by_class_name(doc, "intro").len(&tree), 1);
    let container = tree.get_element_by_id(doc, "container").unwrap();
    assert!(tree.is_connected(container));
}

#[test]
fn test_parse_malformed_html() {
    let html = "<div><p>Unclosed paragraph<span>Unclosed span</div><p>after";
    let mut tree = DomTree::new();
    let doc = parse(&mut tree, html).unwrap();
    assert_eq!(tree.get_elements_by_tag_name(doc, "p").len(&tree), 2);
    assert_eq!(tree.get_elements_by_tag_name(doc, "span").len(&tree), 1);
}

#[test]
fn test_streaming_and_single_shot_agree() {
    let html = r#"<!DOCTYPE html><body><section><h2 class="t">A</h2><p>b &amp; c</p></section>"#;
    let mut a = DomTree::new();
    let doc_a = parse(&mut a, html).unwrap();

    let mut streaming = StreamingParser::new(Default::default(), "about:blank");
    for chunk in html.as_bytes().chunks(3) {
        streaming.feed(chunk);
    }
    let mut b = DomTree::new();
    let doc_b = streaming.finish(&mut b).unwrap();

    assert_eq!(outer_html(&a, doc_a), outer_html(&b, doc_b));
}

// ============================================================================
// innerHTML / outerHTML
// ============================================================================

#[test]
fn test_inner_html_round_trip() {
    let markup = r#"<ul class="list"><li>one</li><li data-n="2">two &amp; more</li></ul><br>"#;
    let mut tree = DomTree::new();
    let doc = parse(&mut tree, markup).unwrap();
    let body = tree.body(doc).unwrap();
    assert_eq!(inner_html(&tree, body), markup);
}

#[test]
fn test_set_inner_html_updates_index() {
    let mut tree = DomTree::new();
    let doc = parse(&mut tree, r#"<div id="host"><p id="old"></p></div>"#).unwrap();
    let host = tree.get_element_by_id(doc, "host").unwrap();
    HtmlParser::default().set_inner_html(&mut tree, host, r#"<p id="new">n</p>"#).unwrap();
    assert!(tree.get_element_by_id(doc, "old").is_none());
    assert!(tree.get_element_by_id(doc, "new").is_some());
    assert_eq!(inner_html(&tree, host), r#"<p id="new">n</p>"#);
}

#[test]
fn test_set_inner_html_on_template() {
    let mut tree = DomTree::new();
    let doc = parse(&mut tree, "<template id=t></template>").unwrap();
    let template = tree.get_element_by_id(doc, "t").unwrap();
    HtmlParser::default().set_inner_html(&mut tree, template, "<i>x</i>").unwrap();
    assert_eq!(tree.child_count(template), 0);
    assert_eq!(inner_html(&tree, template), "<i>x</i>");
}

// ============================================================================
// Events on parsed pages
// ============================================================================

#[test]
fn test_dispatch_on_parsed_page() {
    let mut tree = DomTree::new();
    let doc = parse(&mut tree, r#"<div id="outer"><button id="b">go</button></div>"#).unwrap();
    let mut page = Page::from_tree(tree, doc);
    let outer = page.dom.get_element_by_id(doc, "outer").unwrap();
    let button = page.dom.get_element_by_id(doc, "b").unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    page.add_event_listener(
        outer,
        "click",
        listener(move |_, event| {
            log.borrow_mut().push(event.event_type().to_string());
            Ok(())
        }),
        ListenerOptions::default(),
    );

    let mut event = Event::new("click", EventInit { bubbles: true, ..Default::default() });
    assert!(page.dispatch_event(button.into(), &mut event).unwrap());
    assert_eq!(*seen.borrow(), vec!["click".to_string()]);
}
