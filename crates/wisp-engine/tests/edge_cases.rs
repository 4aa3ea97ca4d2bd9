//! Edge case tests for wisp-engine

use wisp_dom::AbortReason;
use wisp_engine::{Config, Engine, EngineError, SimpleSelectors, TimerQueue, TreeSnapshot};

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_empty_json_is_default() {
    assert_eq!(Config::from_json("{}").unwrap(), Config::default());
}

#[test]
fn test_unknown_fields_are_ignored() {
    let config = Config::from_json(r#"{ "user_agent": "x", "future_option": 1 }"#).unwrap();
    assert_eq!(config.user_agent, "x");
}

#[test]
fn test_bad_default_url() {
    let engine = Engine::new(Config { default_url: "::".into(), ..Default::default() });
    assert!(matches!(engine.new_page(), Err(EngineError::Url(_))));
}

#[test]
fn test_new_page_respects_limit() {
    let engine = Engine::new(Config { max_nodes: 2, ..Default::default() });
    let mut page = engine.new_page().unwrap();
    let doc = page.document();
    let a = page.dom.create_element(doc, "a").unwrap();
    page.dom.append_child(doc, a).unwrap();
    let err = page.dom.create_element(doc, "b").unwrap_err();
    assert!(err.is_out_of_resources());
}

// ============================================================================
// Selectors
// ============================================================================

#[test]
fn test_invalid_selector_is_syntax_error() {
    let page = Engine::default().load_html("<p></p>", "about:blank").unwrap();
    let err = page.dom.query_selector(&SimpleSelectors, page.document(), "p::before").unwrap_err();
    assert_eq!(err.exception_name(), Some("SyntaxError"));
}

#[test]
fn test_selector_on_deep_tree() {
    let depth = 3000;
    let html = format!("{}<b id=leaf></b>", "<div>".repeat(depth));
    let page = Engine::default().load_html(&html, "about:blank").unwrap();
    let doc = page.document();
    let leaf = page.dom.query_selector(&SimpleSelectors, doc, "body > div div > b#leaf").unwrap();
    assert!(leaf.is_some());
    let divs = page.dom.query_selector_all(&SimpleSelectors, doc, "div div").unwrap();
    assert_eq!(divs.len(&page.dom), depth - 1);
}

#[test]
fn test_query_scoped_to_subtree() {
    let page = Engine::default()
        .load_html("<div id=a><p></p></div><div id=b><p></p><p></p></div>", "about:blank")
        .unwrap();
    let b = page.dom.get_element_by_id(page.document(), "b").unwrap();
    assert_eq!(page.dom.query_selector_all(&SimpleSelectors, b, "p").unwrap().len(&page.dom), 2);
    // The scope element itself is never a result
    assert!(page.dom.query_selector(&SimpleSelectors, b, "#b").unwrap().is_none());
}

// ============================================================================
// Timers and signals
// ============================================================================

#[test]
fn test_advance_with_nothing_pending() {
    let mut page = Engine::default().new_page().unwrap();
    let mut timers = TimerQueue::new();
    assert_eq!(timers.advance(&mut page, 10), 0);
    assert_eq!(timers.run_until_idle(&mut page), 0);
    assert_eq!(timers.now(), 10);
}

#[test]
fn test_any_follows_first_timeout() {
    let mut page = Engine::default().new_page().unwrap();
    let mut timers = TimerQueue::new();
    let slow = page.abort_signal_timeout(100, &mut timers);
    let fast = page.abort_signal_timeout(10, &mut timers);
    let any = page.abort_signal_any(&[slow, fast]);

    timers.advance(&mut page, 10);
    assert_eq!(page.signal_reason(any), Some(&AbortReason::Timeout));
    assert!(!page.signal_aborted(slow));
}

#[test]
fn test_zero_delay_timeout() {
    let mut page = Engine::default().new_page().unwrap();
    let mut timers = TimerQueue::new();
    let signal = page.abort_signal_timeout(0, &mut timers);
    assert!(!page.signal_aborted(signal));
    assert_eq!(timers.advance(&mut page, 0), 1);
    assert!(page.signal_aborted(signal));
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn test_snapshot_of_detached_node() {
    let mut page = Engine::default().new_page().unwrap();
    let doc = page.document();
    let div = page.dom.create_element(doc, "div").unwrap();
    let snap = TreeSnapshot::capture(&page.dom, div);
    assert_eq!(snap.nodes.len(), 1);
    assert_eq!(snap.nodes[0].depth, 0);
    assert_eq!(snap.nodes[0].parent, None);
}
