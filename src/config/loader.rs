//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::config::schema::BalancerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A configuration that passed validation, with server URLs parsed once.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub config: BalancerConfig,
    pub server_urls: Vec<Url>,
}

impl TryFrom<BalancerConfig> for ValidatedConfig {
    type Error = ConfigError;

    fn try_from(config: BalancerConfig) -> Result<Self, Self::Error> {
        let server_urls = validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(Self { config, server_urls })
    }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ValidatedConfig, ConfigError> {
    let config: BalancerConfig = toml::from_str(content)?;
    ValidatedConfig::try_from(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ValidatedConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
