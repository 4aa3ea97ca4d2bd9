//! Wisp - Main Entry Point
//!
//! ```text
//! wisp <file.html> [--json] [--config FILE] [--url URL]
//!                  [--id ID] [--tag NAME] [--select SELECTORS] [--html]
//! ```
//!
//! Without a query the whole document tree is dumped. Queries print every
//! match, as a tree dump or, with `--html`, as markup.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use url::Url;
use wisp_dom::{NodeId, Page};
use wisp_engine::html::outer_html;
use wisp_engine::{Config, Engine, SimpleSelectors, TreeSnapshot};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

enum Query {
    Id(String),
    Tag(String),
    Select(String),
}

#[derive(Parser, Debug)]
#[command(name = "wisp")]
#[command(version, about = "Parse an HTML document and inspect its tree", long_about = None)]
struct Args {
    /// HTML file to load
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Engine configuration as JSON
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Document URL, defaults to the file's URL
    #[arg(long)]
    url: Option<String>,

    /// Print the element with this id
    #[arg(long, group = "query")]
    id: Option<String>,

    /// Print every element with this tag name
    #[arg(long, value_name = "NAME", group = "query")]
    tag: Option<String>,

    /// Print every element matching a selector list
    #[arg(long, value_name = "SELECTORS", group = "query")]
    select: Option<String>,

    /// Dump trees as JSON
    #[arg(long)]
    json: bool,

    /// Print matches as markup
    #[arg(long, conflicts_with = "json")]
    html: bool,
}

impl Args {
    fn query(&self) -> Option<Query> {
        if let Some(id) = &self.id {
            Some(Query::Id(id.clone()))
        } else if let Some(tag) = &self.tag {
            Some(Query::Tag(tag.clone()))
        } else {
            self.select.clone().map(Query::Select)
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            Config::from_json(&text)?
        }
        None => Config::default(),
    };

    let url = match &args.url {
        Some(url) => url.clone(),
        None => file_url(&args.input)?,
    };
    let engine = Engine::new(config);
    let file = File::open(&args.input).with_context(|| format!("opening {}", args.input.display()))?;
    let page = engine.load_reader(&mut BufReader::new(file), &url)?;
    tracing::info!(nodes = page.node_count(), "document loaded");

    let query = args.query();
    let roots = match &query {
        None => vec![page.document()],
        Some(query) => run_query(&page, query)?,
    };
    if query.is_some() && roots.is_empty() {
        tracing::warn!("no matches");
    }

    for root in roots {
        if args.html {
            println!("{}", outer_html(&page.dom, root));
            continue;
        }
        let snapshot = TreeSnapshot::capture(&page.dom, root);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else {
            print!("{}", snapshot.to_text());
        }
    }
    Ok(())
}

fn run_query(page: &Page, query: &Query) -> Result<Vec<NodeId>> {
    let doc = page.document();
    Ok(match query {
        Query::Id(id) => page.dom.get_element_by_id(doc, id).into_iter().collect(),
        Query::Tag(name) => page.dom.get_elements_by_tag_name(doc, name).to_vec(&page.dom),
        Query::Select(selectors) => page.dom.query_selector_all(&SimpleSelectors, doc, selectors)?.to_vec(&page.dom),
    })
}

fn file_url(path: &Path) -> Result<String> {
    let absolute = path.canonicalize().with_context(|| format!("resolving {}", path.display()))?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| anyhow!("cannot express {} as a URL", absolute.display()))
}
