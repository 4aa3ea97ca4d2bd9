//! Wisp Engine
//!
//! Page factory and embedding glue for the Wisp DOM.
//!
//! # Example
//! ```rust,ignore
//! use wisp_engine::{Engine, Config, SimpleSelectors};
//!
//! let engine = Engine::new(Config::default());
//! let page = engine.load_html("<p class=a>hi</p>", "https://example.com/")?;
//! let p = page.dom.query_selector(&SimpleSelectors, page.document(), "p.a")?;
//! ```

mod config;
mod engine;
mod error;
mod selectors;
mod snapshot;
mod timers;

pub use config::Config;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use selectors::{AttributeMatcher, AttributeSelector, Combinator, SelectorComponent, SelectorList, SimpleSelectors};
pub use snapshot::{AttributeSnapshot, NodeSnapshot, TreeSnapshot};
pub use timers::TimerQueue;

// Re-export sub-crates for advanced usage
pub use wisp_dom as dom;
pub use wisp_html as html;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
