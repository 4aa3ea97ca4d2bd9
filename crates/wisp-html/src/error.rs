//! HTML bridge errors

use wisp_dom::DomError;

/// Result type for parsing and serialization
pub type HtmlResult<T> = Result<T, HtmlError>;

#[derive(Debug, thiserror::Error)]
pub enum HtmlError {
    /// Reading the input failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Building the tree failed
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl HtmlError {
    /// DOM exception name when the failure came from the node graph
    pub fn exception_name(&self) -> Option<&'static str> {
        match self {
            Self::Io(_) => None,
            Self::Dom(err) => err.exception_name(),
        }
    }
}
