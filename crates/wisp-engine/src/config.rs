//! Engine Configuration

use serde::{Deserialize, Serialize};
use wisp_dom::ArenaLimits;
use wisp_html::ParserOptions;

use crate::EngineResult;

/// Engine configuration options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Node cap per page; allocation past it fails with `OutOfResources`
    pub max_nodes: usize,

    /// Nodes reserved when a page is created
    pub initial_capacity: usize,

    /// Tree-builder scripting flag
    pub scripting_enabled: bool,

    /// Skip whitespace-only text while parsing
    pub drop_whitespace_text: bool,

    /// URL of pages created without one
    pub default_url: String,

    /// User agent string
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_nodes: 1_000_000,
            initial_capacity: 256,
            scripting_enabled: true,
            drop_whitespace_text: false,
            default_url: "about:blank".to_string(),
            user_agent: format!("Wisp/{}", crate::VERSION),
        }
    }
}

impl Config {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Arena limits for a new page
    pub fn limits(&self) -> ArenaLimits {
        ArenaLimits {
            max_nodes: self.max_nodes,
            initial_capacity: self.initial_capacity.min(self.max_nodes),
        }
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            scripting_enabled: self.scripting_enabled,
            drop_whitespace_text: self.drop_whitespace_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = Config::from_json(r#"{ "max_nodes": 64, "drop_whitespace_text": true }"#).unwrap();
        assert_eq!(config.max_nodes, 64);
        assert!(config.drop_whitespace_text);
        assert!(config.scripting_enabled);
        assert_eq!(config.default_url, "about:blank");
    }

    #[test]
    fn test_json_round_trip() {
        let config = Config { user_agent: "test".into(), ..Default::default() };
        let back = Config::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = Config::from_json(r#"{ "max_nodes": "many" }"#).unwrap_err();
        assert!(matches!(err, crate::EngineError::Config(_)));
    }

    #[test]
    fn test_limits_clamp_capacity() {
        let config = Config { max_nodes: 10, initial_capacity: 256, ..Default::default() };
        let limits = config.limits();
        assert_eq!(limits.max_nodes, 10);
        assert_eq!(limits.initial_capacity, 10);
        assert!(config.parser_options().scripting_enabled);
    }
}
