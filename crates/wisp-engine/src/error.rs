//! Engine errors

use wisp_dom::DomError;
use wisp_html::HtmlError;

pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid document URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("parse error: {0}")]
    Html(#[from] HtmlError),

    #[error(transparent)]
    Dom(#[from] DomError),
}
