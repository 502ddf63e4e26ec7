//! Declarative settings for the stages that take options.
//!
//! ```toml
//! [request]
//! requested = "FETCH_REQUESTED"
//! fulfilled = "FETCH_FULFILLED"
//! failed = "FETCH_FAILED"
//!
//! [contract]
//! warn = true
//! error = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors raised while loading stage settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Message tags dispatched around a request. Unset tags are not dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestTypes {
    pub failed: Option<String>,
    pub fulfilled: Option<String>,
    pub requested: Option<String>,
}

impl RequestTypes {
    /// `{prefix}_REQUESTED`, `{prefix}_FULFILLED` and `{prefix}_FAILED`.
    pub fn lifecycle(prefix: &str) -> Self {
        Self {
            failed: Some(format!("{prefix}_FAILED")),
            fulfilled: Some(format!("{prefix}_FULFILLED")),
            requested: Some(format!("{prefix}_REQUESTED")),
        }
    }

    pub fn with_failed(mut self, tag: impl Into<String>) -> Self {
        self.failed = Some(tag.into());
        self
    }

    pub fn with_fulfilled(mut self, tag: impl Into<String>) -> Self {
        self.fulfilled = Some(tag.into());
        self
    }

    pub fn with_requested(mut self, tag: impl Into<String>) -> Self {
        self.requested = Some(tag.into());
        self
    }

    /// Every configured tag.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        [&self.failed, &self.fulfilled, &self.requested]
            .into_iter()
            .filter_map(|tag| tag.as_deref())
    }

    pub fn is_lifecycle(&self, kind: &str) -> bool {
        self.tags().any(|tag| tag == kind)
    }
}

/// How a broken contract is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractOptions {
    /// Log a warning.
    pub warn: bool,
    /// Fail the call with a contract fault.
    pub error: bool,
}

impl Default for ContractOptions {
    fn default() -> Self {
        Self {
            warn: true,
            error: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagesConfig {
    pub request: RequestTypes,
    pub contract: ContractOptions,
}

impl StagesConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_full_config() {
        let config = StagesConfig::from_toml_str(
            r#"
            [request]
            requested = "FETCH_REQUESTED"
            failed = "FETCH_FAILED"

            [contract]
            error = true
            "#,
        )
        .unwrap();

        assert_eq!(config.request.requested.as_deref(), Some("FETCH_REQUESTED"));
        assert_eq!(config.request.fulfilled, None);
        assert!(config.request.is_lifecycle("FETCH_FAILED"));
        assert!(!config.request.is_lifecycle("FETCH"));
        assert!(config.contract.warn);
        assert!(config.contract.error);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = StagesConfig::from_toml_str("").unwrap();
        assert_eq!(config, StagesConfig::default());
        assert_eq!(config.request.tags().count(), 0);
    }

    #[test]
    fn test_rejects_malformed_config() {
        let result = StagesConfig::from_toml_str("[contract]\nwarn = \"loud\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_lifecycle_tags() {
        let types = RequestTypes::lifecycle("LOAD");
        let tags: Vec<&str> = types.tags().collect();
        assert_eq!(tags, vec!["LOAD_FAILED", "LOAD_FULFILLED", "LOAD_REQUESTED"]);
    }
}
