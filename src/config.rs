//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default REST endpoint for the public API network.
pub const DEFAULT_ENDPOINT_URL: &str = "https://api.softlayer.com/rest/v3.1";

/// API credentials and endpoint settings derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "SL")]
pub struct SoftLayerConfig {
    /// API username. This value is required.
    pub username: String,
    /// API key paired with the username. This value is required.
    pub api_key: String,
    /// Base URL of the REST endpoint. Defaults to the public API network.
    #[ortho_config(default = DEFAULT_ENDPOINT_URL.to_owned())]
    pub endpoint_url: String,
    /// Per-request timeout in seconds. Defaults to 30.
    #[ortho_config(default = 30)]
    pub timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl SoftLayerConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to [softlayer] in softlayer.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("softlayer")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Returns the configured request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::InvalidValue`] when the timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.username,
            &FieldMetadata::new("API username", "SL_USERNAME", "username"),
        )?;
        Self::require_field(
            &self.api_key,
            &FieldMetadata::new("API key", "SL_API_KEY", "api_key"),
        )?;
        Self::require_field(
            &self.endpoint_url,
            &FieldMetadata::new("API endpoint URL", "SL_ENDPOINT_URL", "endpoint_url"),
        )?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(String::from(
                "timeout_secs must be greater than zero (SL_TIMEOUT_SECS)",
            )));
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds a value outside its accepted range.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// Raised when the HTTP client cannot be constructed from the settings.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
